//! explorer-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does explorer-client do? (for beginners)
//!
//! Kafka Topic Explorer lets a user describe a data stream in plain words
//! ("IoT sensor readings from 10k devices") and get back a suggested Kafka
//! topic layout: name, partition count, replication factor and configs, each
//! with an explanation.  The suggestions come from a remote service reached
//! over one long-lived WebSocket connection.
//!
//! This crate is the client side of that connection:
//!
//! 1. [`ConnectionManager`] owns the connection.  It connects on demand,
//!    reconnects on its own after abnormal closures (a bounded number of
//!    times, with a fixed delay), routes inbound `{type, payload}` envelopes
//!    to registered handlers, and notifies observers of every state change.
//! 2. [`RequestBridge`] turns "send `generate`, wait for `generate_response`"
//!    into a single awaitable call with a timeout.
//! 3. [`GenerateStructureUseCase`] is the one request the UI makes.
//! 4. [`ConnectionSession`] owns the manager for the lifetime of the
//!    application and feeds the status badge and connect/disconnect notices.

/// Application layer: request bridge, use cases, session.
pub mod application;

/// Infrastructure layer: transports, connection manager, configuration.
pub mod infrastructure;

pub use application::generate_structure::{GenerateError, GenerateStructureUseCase};
pub use application::request_bridge::{RequestBridge, RequestError, DEFAULT_REQUEST_TIMEOUT};
pub use application::session::{ConnectionSession, Notice, StatusIndicator};
pub use infrastructure::connection::{ConnectionConfig, ConnectionManager, HandlerId, ObserverId};
