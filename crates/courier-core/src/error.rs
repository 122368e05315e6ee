// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier dispatch engine.

use thiserror::Error;

/// The primary error type used across collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (missing delivery target, unknown engine, bad pattern).
    #[error("configuration error: {0}")]
    Config(String),

    /// Message store errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A delivery attempt could not be completed.
    #[error("delivery error: {message}")]
    Delivery {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend is not part of the configured allowlist.
    #[error("unsupported backend: {backend}")]
    UnsupportedBackend { backend: String },

    /// The connection identity failed the backend's validation rule.
    #[error("identity `{identity}` is not valid for backend {backend}")]
    InvalidIdentity { identity: String, backend: String },

    /// Administrator notification failed.
    #[error("notification error: {message}")]
    Notify { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CourierError::Storage {
            source: Box::new(err),
        }
    }
}
