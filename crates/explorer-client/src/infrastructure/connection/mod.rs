//! Connection management: lifecycle, reconnection, dispatch, notification.
//!
//! - **`manager`** – [`ConnectionManager`], the public entry point.
//! - **`registry`** – per-message-type handlers (persistent or single-shot).
//! - **`observers`** – ordered connection-state observers plus a `watch`
//!   channel for async waiters.

pub mod manager;
pub mod observers;
pub mod registry;

pub use manager::{ConnectionConfig, ConnectionManager, DEFAULT_URL};
pub use observers::ObserverId;
pub use registry::HandlerId;
