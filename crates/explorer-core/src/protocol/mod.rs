//! Protocol module containing the envelope codec, close codes, and routing keys.

pub mod close_code;
pub mod envelope;
pub mod message_types;

pub use close_code::CloseCode;
pub use envelope::{decode_envelope, encode_envelope, Envelope, EnvelopeError};
