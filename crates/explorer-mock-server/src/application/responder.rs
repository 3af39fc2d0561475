//! Request handling for the mock peer.
//!
//! | Inbound type | Reply type          | Reply payload                              |
//! |--------------|---------------------|--------------------------------------------|
//! | `generate`   | `generate_response` | `{topics: [...]}` or `{error: "Empty request"}` |
//! | anything else| none                | ignored                                    |

use explorer_core::{
    decode_envelope,
    protocol::message_types::{GENERATE, GENERATE_RESPONSE},
    suggest_structure, Envelope, EnvelopeError,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The inbound frame is not a routable envelope.
    #[error("unroutable frame: {0}")]
    Envelope(#[from] EnvelopeError),

    /// A reply could not be encoded.
    #[error("failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Computes the reply for one inbound text frame.
///
/// Returns `Ok(None)` for envelope types the peer does not answer.
///
/// # Errors
///
/// Returns [`ServerError::Envelope`] if `frame` is not a valid envelope.
pub fn respond(frame: &str) -> Result<Option<Envelope>, ServerError> {
    let envelope = decode_envelope(frame)?;

    if envelope.message_type != GENERATE {
        debug!("ignoring `{}` envelope", envelope.message_type);
        return Ok(None);
    }

    // A missing or non-string `text` is treated like an empty request.
    let text = envelope
        .payload
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let payload = match suggest_structure(text) {
        Ok(structure) => serde_json::to_value(structure)?,
        Err(e) => json!({ "error": e.to_string() }),
    };

    Ok(Some(Envelope::new(GENERATE_RESPONSE, payload)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_answered_with_catalogue_structure() {
        // Arrange
        let frame = r#"{"type":"generate","payload":{"text":"factory sensor feed"}}"#;

        // Act
        let reply = respond(frame).unwrap().unwrap();

        // Assert
        assert_eq!(reply.message_type, "generate_response");
        assert_eq!(reply.payload["topics"][0]["name"]["value"], "sensor.data.raw");
        assert_eq!(reply.payload["topics"][0]["replicationFactor"]["value"], 3);
    }

    #[test]
    fn test_blank_text_is_answered_with_error_payload() {
        let reply = respond(r#"{"type":"generate","payload":{"text":"  "}}"#)
            .unwrap()
            .unwrap();

        assert_eq!(reply.payload, json!({"error": "Empty request"}));
    }

    #[test]
    fn test_missing_text_is_treated_as_empty() {
        let reply = respond(r#"{"type":"generate","payload":{}}"#).unwrap().unwrap();

        assert_eq!(reply.payload["error"], "Empty request");
    }

    #[test]
    fn test_unknown_type_gets_no_reply() {
        assert!(respond(r#"{"type":"ping","payload":null}"#).unwrap().is_none());
    }

    #[test]
    fn test_garbage_frame_is_an_error() {
        assert!(matches!(respond("garbage"), Err(ServerError::Envelope(_))));
    }
}
