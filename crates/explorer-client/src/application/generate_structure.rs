//! Use case: ask the generator service for a Kafka topic structure.
//!
//! ```text
//! "IoT sensor feed" ──generate {text}──▶ peer ──generate_response──▶ TopicStructure
//! ```
//!
//! Blank input is rejected locally, before anything is sent.  A peer answer
//! of the form `{"error": "..."}` becomes [`GenerateError::Rejected`].

use explorer_core::{
    protocol::message_types::{GENERATE, GENERATE_RESPONSE},
    GenerateReply, GenerateRequest, TopicStructure,
};
use thiserror::Error;
use tracing::info;

use super::request_bridge::{RequestBridge, RequestError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The request text was empty or whitespace only.
    #[error("Empty request")]
    EmptyRequest,

    /// The request/response exchange failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The peer answered with an error message.
    #[error("generator rejected the request: {0}")]
    Rejected(String),

    /// The response payload did not match the topic-structure model.
    #[error("unexpected response payload: {0}")]
    Decode(String),
}

pub struct GenerateStructureUseCase {
    bridge: RequestBridge,
}

impl GenerateStructureUseCase {
    pub fn new(bridge: RequestBridge) -> Self {
        Self { bridge }
    }

    /// Requests a topic structure for `text`.
    ///
    /// # Errors
    ///
    /// See [`GenerateError`].
    pub async fn execute(&self, text: &str) -> Result<TopicStructure, GenerateError> {
        if text.trim().is_empty() {
            return Err(GenerateError::EmptyRequest);
        }

        let request = GenerateRequest {
            text: text.to_string(),
        };
        let payload = self
            .bridge
            .request(GENERATE, GENERATE_RESPONSE, &request)
            .await?;

        match serde_json::from_value::<GenerateReply>(payload) {
            Ok(GenerateReply::Structure(structure)) => {
                info!("received {} suggested topic(s)", structure.topics.len());
                Ok(structure)
            }
            Ok(GenerateReply::Failure { error }) => Err(GenerateError::Rejected(error)),
            Err(e) => Err(GenerateError::Decode(e.to_string())),
        }
    }
}
