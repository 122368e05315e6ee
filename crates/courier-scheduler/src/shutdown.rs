// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SIGINT/SIGTERM handling for `courier serve`.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawns a task that cancels the returned token on SIGINT or SIGTERM.
///
/// The scheduler finishes its current pass before observing the token.
/// Cancelling the token from elsewhere also ends the task.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let watcher = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            signal = wait_for_signal() => {
                info!(signal, "shutdown requested, finishing current pass");
                watcher.cancel();
            }
            _ = watcher.cancelled() => {}
        }
        debug!("signal watcher exited");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, only Ctrl+C will stop courier");
            ctrl_c_or_never().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = ctrl_c_or_never() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c_or_never().await;
    "Ctrl+C"
}

/// A failed Ctrl+C listener must not read as a shutdown request.
async fn ctrl_c_or_never() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
