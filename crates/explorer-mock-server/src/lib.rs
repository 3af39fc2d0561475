//! explorer-mock-server library crate.
//!
//! A small WebSocket peer that stands in for the real topic-structure
//! generator during development and in end-to-end tests.  It answers every
//! `generate` envelope with a `generate_response` taken from the suggestion
//! catalogue in `explorer-core`, after a configurable delay that imitates the
//! latency of the real service.
//!
//! # Architecture
//!
//! ```text
//! explorer-client (JSON envelopes over WebSocket)
//!         ↕
//! [explorer-mock-server]
//!   ├── domain/           ServerConfig
//!   ├── application/      envelope in → envelope out (no I/O)
//!   └── infrastructure/
//!         └── ws_server/  accept loop and per-session tasks
//! ```

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: request → response logic.
pub mod application;

/// Infrastructure layer: WebSocket server.
pub mod infrastructure;
