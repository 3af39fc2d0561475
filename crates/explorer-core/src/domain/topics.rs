//! Kafka topic-structure model returned by the generator service.
//!
//! Every suggested field travels together with a human-readable explanation
//! of *why* that value was chosen, so the UI can show the reasoning next to
//! the number.  On the wire a single topic looks like:
//!
//! ```json
//! {
//!   "name": {"value": "sensor.data.raw", "explanation": "..."},
//!   "partitions": {"value": 12, "explanation": "..."},
//!   "replicationFactor": {"value": 3, "explanation": "..."},
//!   "configs": {"retention.ms": "604800000"}
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A suggested value paired with the reasoning behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explained<T> {
    pub value: T,
    pub explanation: String,
}

impl<T> Explained<T> {
    pub fn new(value: T, explanation: impl Into<String>) -> Self {
        Self {
            value,
            explanation: explanation.into(),
        }
    }
}

/// One suggested Kafka topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSuggestion {
    pub name: Explained<String>,
    pub partitions: Explained<u32>,
    #[serde(rename = "replicationFactor")]
    pub replication_factor: Explained<u16>,
    /// Topic-level broker configs, e.g. `retention.ms`.  Ordered so the
    /// rendered JSON is stable.
    #[serde(default)]
    pub configs: BTreeMap<String, String>,
}

/// The full answer to a generate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStructure {
    pub topics: Vec<TopicSuggestion>,
}

/// Payload of a `generate` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub text: String,
}

/// Payload of a `generate_response` envelope.
///
/// The peer answers either with a structure or with `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateReply {
    Structure(TopicStructure),
    Failure { error: String },
}
