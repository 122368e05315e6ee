// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store scheduler for the Courier dispatch engine.
//!
//! [`Scheduler`] polls every configured store, advancing the highest
//! priority queued batch and one unbatched message per store per pass.
//! [`shutdown::install_signal_handler`] ties the loop to SIGINT/SIGTERM.

pub mod scheduler;
pub mod shutdown;

pub use scheduler::{CycleReport, PassReport, Scheduler, SchedulerSettings};
pub use shutdown::install_signal_handler;
