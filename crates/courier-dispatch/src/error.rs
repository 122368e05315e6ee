// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery errors returned by request building and transport.

use std::time::Duration;

use courier_core::CourierError;
use thiserror::Error;

/// Why a delivery attempt did not produce a response status.
///
/// Every variant leaves the chunk queued. `NoRoute` and `Template` are
/// configuration problems; the rest are transient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The store's target has no entry for the backend and no default.
    #[error("no delivery route for backend `{backend}`: no entry and no default")]
    NoRoute { backend: String },

    /// The delivery template could not be rendered.
    #[error("invalid delivery template: {message}")]
    Template { message: String },

    /// A structured adapter could not prepare its request.
    #[error("backend adapter for `{backend}` failed: {message}")]
    Adapter { backend: String, message: String },

    /// The request could not be sent or its response not read.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No response within the transport timeout.
    #[error("delivery timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl DeliveryError {
    /// Returns true for errors that need a configuration change to go away.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DeliveryError::NoRoute { .. } | DeliveryError::Template { .. }
        )
    }
}

impl From<DeliveryError> for CourierError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::NoRoute { .. } | DeliveryError::Template { .. } => {
                CourierError::Config(err.to_string())
            }
            DeliveryError::Timeout { duration } => CourierError::Timeout { duration },
            other => CourierError::Delivery {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
