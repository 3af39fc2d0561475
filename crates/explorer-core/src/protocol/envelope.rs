//! JSON codec for the `{type, payload}` envelope exchanged over the connection.
//!
//! Wire format (one WebSocket text frame per envelope):
//! ```text
//! {"type":"<routing key>","payload":<any JSON value>}
//! ```
//!
//! There is no versioning, framing header, or checksum: the transport already
//! delivers whole text frames, so one frame is exactly one envelope.
//!
//! # Inbound tolerance
//!
//! Decoding is deliberately strict about the routing key and lenient about the
//! payload.  A frame whose `type` is absent, not a string, or empty cannot be
//! routed and is rejected with [`EnvelopeError::MissingType`].  A frame with a
//! valid `type` but no `payload` decodes with a `null` payload, because some
//! notifications carry no data at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during envelope encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum EnvelopeError {
    /// The frame is not valid JSON.
    #[error("malformed JSON frame: {0}")]
    Malformed(String),

    /// The frame is valid JSON but not a JSON object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The `type` field is absent, not a string, or empty.
    #[error("frame has no routable `type` field")]
    MissingType,

    /// The outbound payload could not be serialized.
    #[error("failed to serialize payload: {0}")]
    Serialize(String),
}

/// A decoded wire envelope.
///
/// `message_type` is a routing key, not a unique identifier: many envelopes
/// over the lifetime of a connection share the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Routing key used to select the handler for this envelope.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Arbitrary structured data handed to the handler unchanged.
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Builds an envelope from a routing key and an already-structured payload.
    pub fn new(message_type: impl Into<String>, payload: Value) -> Self {
        Self {
            message_type: message_type.into(),
            payload,
        }
    }
}

/// Borrowed view used for encoding so callers never have to clone their
/// payload into a `serde_json::Value` first.
#[derive(Serialize)]
struct EnvelopeRef<'a, P: ?Sized> {
    #[serde(rename = "type")]
    message_type: &'a str,
    payload: &'a P,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `payload` under the routing key `message_type` as a JSON text frame.
///
/// # Errors
///
/// Returns [`EnvelopeError::Serialize`] if the payload cannot be represented
/// as JSON (for example a map with non-string keys).
///
/// # Examples
///
/// ```rust
/// use explorer_core::protocol::{decode_envelope, encode_envelope};
/// use serde_json::json;
///
/// let text = encode_envelope("generate", &json!({"text": "sensor feed"})).unwrap();
/// let envelope = decode_envelope(&text).unwrap();
/// assert_eq!(envelope.message_type, "generate");
/// assert_eq!(envelope.payload["text"], "sensor feed");
/// ```
pub fn encode_envelope<P>(message_type: &str, payload: &P) -> Result<String, EnvelopeError>
where
    P: Serialize + ?Sized,
{
    serde_json::to_string(&EnvelopeRef {
        message_type,
        payload,
    })
    .map_err(|e| EnvelopeError::Serialize(e.to_string()))
}

/// Decodes one envelope from a text frame.
///
/// # Errors
///
/// - [`EnvelopeError::Malformed`] if the text is not JSON.
/// - [`EnvelopeError::NotAnObject`] if the JSON is an array, string, etc.
/// - [`EnvelopeError::MissingType`] if there is no usable routing key.
pub fn decode_envelope(text: &str) -> Result<Envelope, EnvelopeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

    let Value::Object(mut fields) = value else {
        return Err(EnvelopeError::NotAnObject);
    };

    let message_type = match fields.remove("type") {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => return Err(EnvelopeError::MissingType),
    };

    let payload = fields.remove("payload").unwrap_or(Value::Null);

    Ok(Envelope {
        message_type,
        payload,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
