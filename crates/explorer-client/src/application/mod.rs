//! Application layer use cases for the client.
//!
//! - **`request_bridge`** – turns the untyped envelope connection into
//!   awaitable request/response calls with a timeout.
//!
//! - **`generate_structure`** – the one request the UI makes: describe a data
//!   stream in free text, receive a suggested Kafka topic structure.
//!
//! - **`session`** – owns the connection for the lifetime of the application,
//!   tracks its state for the status badge, and emits connect/disconnect
//!   notices.

pub mod generate_structure;
pub mod request_bridge;
pub mod session;
