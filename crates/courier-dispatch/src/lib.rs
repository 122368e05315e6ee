// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery for the Courier dispatch engine.
//!
//! This crate turns queued messages into gateway requests and applies the
//! resulting status transitions:
//!
//! - [`chunk::build_chunks`] groups messages into same-backend chunks
//! - [`RequestBuilder`] renders URL templates or delegates to a
//!   [`BackendAdapter`] registered for the backend
//! - [`Transport`] performs the request ([`HttpTransport`] in production)
//! - [`Dispatcher::send_chunk`] ties these together for one chunk

pub mod backend;
pub mod chunk;
pub mod dispatcher;
pub mod error;
pub mod request;
pub mod sanitize;
pub mod transport;
pub mod validator;

pub use backend::{AdapterFactory, BackendAdapter, BackendPolicy, BackendRegistry};
pub use chunk::{Chunk, build_chunks};
pub use dispatcher::{ChunkOutcome, Dispatcher, classify};
pub use error::DeliveryError;
pub use request::{BasicAuth, Body, OutboundRequest, RequestBuilder};
pub use sanitize::Sanitizer;
pub use transport::{HttpTransport, Transport};
pub use validator::cancel_invalid_identities;
