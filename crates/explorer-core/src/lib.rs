//! # explorer-core
//!
//! Shared library for Kafka Topic Explorer containing the wire envelope codec,
//! the connection lifecycle domain types, and the topic-structure model that
//! the UI requests from the remote generator service.
//!
//! This crate is used by both the client and the mock peer server.
//! It has zero dependencies on sockets, async runtimes, or UI frameworks.
//!
//! # Architecture overview (for beginners)
//!
//! The explorer UI keeps exactly one long-lived WebSocket connection to a
//! backend service.  Every frame travelling over that connection is a small
//! JSON object called an *envelope*:
//!
//! ```json
//! {"type":"generate","payload":{"text":"sensor feed"}}
//! ```
//!
//! The `type` field is a routing key: the receiving side looks it up in a
//! table of handlers and passes the `payload` to whichever handler is
//! registered for that key.
//!
//! This crate (`explorer-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – The envelope record and its JSON codec, the routing keys
//!   used by the application, and the WebSocket close codes the client cares
//!   about.
//!
//! - **`domain`** – Pure business types with no I/O.  The connection state
//!   machine vocabulary (`ConnectionState`, `ReconnectPolicy`,
//!   `ReconnectTracker`) and the Kafka topic-structure model returned by the
//!   generator, plus the canned suggestion catalogue used by the mock peer.

pub mod domain;
pub mod protocol;

pub use domain::catalog::{suggest_structure, CatalogError};
pub use domain::connection::{
    ConnectionState, ReconnectDecision, ReconnectPolicy, ReconnectTracker,
};
pub use domain::topics::{Explained, GenerateReply, GenerateRequest, TopicStructure, TopicSuggestion};
pub use protocol::close_code::CloseCode;
pub use protocol::envelope::{decode_envelope, encode_envelope, Envelope, EnvelopeError};
