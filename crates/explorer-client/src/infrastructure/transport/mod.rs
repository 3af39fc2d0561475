//! Transport abstraction for the connection manager.
//!
//! The connection manager never touches a socket directly.  It asks a
//! [`Connector`] for a [`TransportLink`], which is nothing more than a pair of
//! channels:
//!
//! - `outbound` – text frames (and a final close request) travelling to the peer.
//! - `inbound`  – text frames arriving from the peer, terminated by exactly one
//!   [`TransportEvent::Closed`].
//!
//! If the inbound channel ends without a `Closed` event the manager treats it
//! as an abnormal closure (code 1006).
//!
//! # Implementations
//!
//! - [`websocket::WebSocketConnector`] – the real transport, built on
//!   `tokio-tungstenite`.
//! - [`mock::ScriptedConnector`] – an in-memory transport whose peer side is
//!   driven by tests.

pub mod mock;
pub mod websocket;

use async_trait::async_trait;
use explorer_core::CloseCode;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors returned by [`Connector::connect`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint URL could not be turned into a connection request.
    /// Retrying cannot help.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The peer could not be reached or the handshake failed.
    #[error("connection failed: {0}")]
    Connect(String),
}

impl TransportError {
    /// Returns `true` when the failure counts as an abnormal closure that the
    /// reconnection policy may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connect(_))
    }
}

/// A frame the manager wants delivered to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// One encoded envelope.
    Text(String),
    /// Close the connection with the given code.  Nothing is sent after this.
    Close(CloseCode),
}

/// Something that happened on the peer side of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame (expected to hold an envelope).
    Text(String),
    /// The connection ended.  Always the last event on a link.
    Closed { code: CloseCode, reason: String },
}

/// An established duplex connection, expressed as two channels.
#[derive(Debug)]
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<OutboundFrame>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens transport connections to an endpoint URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes one connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidEndpoint`] for a URL that cannot be
    /// used at all and [`TransportError::Connect`] when the peer is unreachable.
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError>;
}
