//! Domain entities for Kafka Topic Explorer.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: nothing here opens a socket, spawns a task, or sleeps.
//!
//! - [`connection`] – the vocabulary of the connection state machine and the
//!   bounded reconnection policy.
//! - [`topics`] – the topic-structure model exchanged with the generator.
//! - [`catalog`] – canned suggestions served by the development peer.

pub mod catalog;
pub mod connection;
pub mod topics;
