//! Infrastructure layer for the client.
//!
//! **Dependency rule**: this layer may depend on `explorer_core`, but MUST NOT
//! import the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – the `Connector` seam, the WebSocket connector built on
//!   `tokio-tungstenite`, and a scripted in-memory connector for tests.
//!
//! - **`connection`** – the `ConnectionManager`: one long-lived connection,
//!   bounded automatic reconnection, `{type, payload}` dispatch to registered
//!   handlers, and ordered state notification.
//!
//! - **`storage`** – TOML configuration file for the CLI client.

pub mod connection;
pub mod storage;
pub mod transport;
