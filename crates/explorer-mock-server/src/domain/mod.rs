//! Domain layer for explorer-mock-server.
//!
//! Plain configuration types only; nothing here touches the network.

pub mod config;

pub use config::ServerConfig;
