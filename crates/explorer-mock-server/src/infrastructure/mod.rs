//! Infrastructure layer for explorer-mock-server.
//!
//! - Binding the TCP listener and upgrading connections to WebSocket
//! - Spawning one Tokio task per client session
//! - Delaying and sending replies computed by the application layer
//! - Stopping the accept loop when the shutdown flag is cleared

pub mod ws_server;

pub use ws_server::{run_server, serve};
