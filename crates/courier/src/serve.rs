// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` and `courier once` implementation.
//!
//! Wires the configured stores, backend registry, allowlist policy,
//! sanitizer, HTTP transport and notifier into a [`Scheduler`].

use std::sync::Arc;
use std::time::Duration;

use courier_config::CourierConfig;
use courier_core::{CourierError, MessageStore};
use courier_dispatch::{
    BackendPolicy, BackendRegistry, Dispatcher, HttpTransport, RequestBuilder, Sanitizer,
};
use courier_scheduler::{PassReport, Scheduler, SchedulerSettings, install_signal_handler};
use courier_storage::SqliteStore;
use tracing::{info, warn};

/// Runs the polling loop until SIGINT or SIGTERM.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.log.level);

    info!("starting courier serve");

    let scheduler = build_scheduler(&config).await?;
    let cancel = install_signal_handler();
    scheduler.run(cancel).await?;

    info!("courier serve stopped");
    Ok(())
}

/// Runs exactly one pass over every store.
pub async fn run_once(config: CourierConfig) -> Result<PassReport, CourierError> {
    init_tracing(&config.log.level);

    let scheduler = build_scheduler(&config).await?;
    let report = scheduler.run_once().await;
    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        "single pass complete"
    );
    Ok(report)
}

/// Builds the scheduler for the active stores.
pub async fn build_scheduler(config: &CourierConfig) -> Result<Scheduler, CourierError> {
    let policy = BackendPolicy::from_config(config.supported_backends.as_ref())?;
    let adapters = BackendRegistry::from_config(&config.backends)?;
    let sanitizer = Sanitizer::new(&config.special_chars)?;
    let transport = HttpTransport::new(Duration::from_secs(config.dispatch.request_timeout_secs))?;

    let dispatcher = Dispatcher::new(
        RequestBuilder::new(sanitizer, adapters),
        policy,
        Arc::new(transport),
    )
    .with_max_attempts(config.dispatch.max_attempts);

    let notifier = courier_notify::from_config(&config.notify)?;
    info!(notifier = notifier.name(), "notifier initialized");

    let mut stores = Vec::new();
    for store_config in config.active_stores() {
        let store: Arc<dyn MessageStore> = Arc::new(SqliteStore::open(store_config).await?);
        info!(store = %store_config.name, path = %store_config.database_path, "store opened");
        stores.push((store, store_config.router_url.clone()));
    }
    if stores.is_empty() {
        warn!("no active stores configured, nothing will be dispatched");
    }

    Ok(Scheduler::new(
        stores,
        Arc::new(dispatcher),
        notifier,
        SchedulerSettings::from(&config.dispatch),
    ))
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{BatchStatus, MessageStatus};
    use courier_storage::queries::{batches, messages};
    use courier_storage::{Database, NewMessage};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(gateway: &str, db_path: &str) -> CourierConfig {
        courier_config::load_and_validate_str(&format!(
            r#"
[dispatch]
request_timeout_secs = 5

[special_chars]
"ç" = "c"

[supported_backends.kannel]
[supported_backends.vumi]

[backends.vumi]
engine = "vumi"
sendsms_url = "{gateway}/vumi/send/"

[[stores]]
name = "default"
database_path = "{db_path}"
router_url = "{gateway}/cgi-bin/sendsms?to=%(recipient)s&text=%(text)s&smsc=%(backend)s&priority=%(priority)s"
"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn one_pass_delivers_through_sqlite_and_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cgi-bin/sendsms"))
            .and(query_param("to", "256700000001 256700000002"))
            .and(query_param("text", "ca marche"))
            .and(query_param("priority", "3"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/vumi/send/"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("default.db").to_string_lossy().to_string();
        let seed = Database::open(&db_path).await.unwrap();

        let batch = batches::insert_batch(&seed, "campaign", 3).await.unwrap();
        let mut batch_ids = Vec::new();
        for identity in ["256700000001", "256700000002"] {
            let msg = NewMessage::outbound(identity, "kannel", "ça marche").in_batch(batch);
            batch_ids.push(messages::insert_message(&seed, &msg).await.unwrap());
        }
        let blocked = messages::insert_message(
            &seed,
            &NewMessage::outbound("256700000003", "warid", "hi").in_batch(batch),
        )
        .await
        .unwrap();
        let unbatched = messages::insert_message(
            &seed,
            &NewMessage::outbound("256700000004", "vumi", "hello"),
        )
        .await
        .unwrap();

        let scheduler = build_scheduler(&config(&server.uri(), &db_path))
            .await
            .unwrap();
        let report = scheduler.run_once().await;
        assert!(report.failed.is_empty(), "failed stores: {:?}", report.failed);

        for id in &batch_ids {
            let msg = messages::get_message(&seed, *id).await.unwrap().unwrap();
            assert_eq!(msg.status, MessageStatus::Sent);
        }
        let msg = messages::get_message(&seed, blocked).await.unwrap().unwrap();
        assert_eq!(msg.status, MessageStatus::Blocked);
        let msg = messages::get_message(&seed, unbatched).await.unwrap().unwrap();
        assert_eq!(msg.status, MessageStatus::Discarded);

        // The blocked message keeps the batch open until the next pass clears it.
        let b = batches::get_batch(&seed, batch).await.unwrap().unwrap();
        assert_eq!(b.status, BatchStatus::Queued);
        scheduler.run_once().await;
        let b = batches::get_batch(&seed, batch).await.unwrap().unwrap();
        assert_eq!(b.status, BatchStatus::Cleared);
    }

    #[tokio::test]
    async fn excluded_stores_are_not_opened() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("archive.db");
        let config = courier_config::load_and_validate_str(&format!(
            r#"
[dispatch]
exclude_stores = ["archive"]

[[stores]]
name = "archive"
database_path = "{}"
router_url = "http://kannel/send?text=%(text)s"
"#,
            db_path.display()
        ))
        .unwrap();

        let scheduler = build_scheduler(&config).await.unwrap();
        assert!(scheduler.store_names().is_empty());
        assert!(!db_path.exists());
    }
}
