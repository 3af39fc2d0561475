//! Routing keys used by the topic explorer application.
//!
//! The connection layer itself never interprets these; they only matter to
//! the request bridge on the client and to the peer that answers it.

/// Request: generate a Kafka topic structure for a free-text description.
pub const GENERATE: &str = "generate";

/// Response to [`GENERATE`].
pub const GENERATE_RESPONSE: &str = "generate_response";
