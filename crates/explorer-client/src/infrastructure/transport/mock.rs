//! In-memory transport for tests.
//!
//! # Why a scripted connector?
//!
//! The reconnection and dispatch rules are all about *what the peer does*:
//! refuse a connection, close normally, drop the link, answer a request.
//! Driving a real WebSocket server into each of those situations is slow and
//! racy.  [`ScriptedConnector`] instead hands every accepted connection's
//! peer side, a [`ScriptedPeer`], to the test, which then plays the server.
//!
//! # Usage in tests
//!
//! ```ignore
//! let (connector, mut peers) = ScriptedConnector::new();
//! let manager = ConnectionManager::with_connector(config, connector.clone());
//!
//! manager.connect();
//! let mut peer = peers.recv().await.unwrap();
//! peer.send_envelope("generate_response", &json!({"topics": []}));
//! peer.close(CloseCode::ABNORMAL);
//!
//! assert_eq!(connector.connect_calls(), 1);
//! ```

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, PoisonError,
};

use async_trait::async_trait;
use explorer_core::{encode_envelope, CloseCode};
use serde::Serialize;
use tokio::sync::mpsc;

use super::{Connector, OutboundFrame, TransportError, TransportEvent, TransportLink};

/// How the next `connect` call behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectBehavior {
    /// Hand a fresh [`ScriptedPeer`] to the test and succeed.
    #[default]
    Accept,
    /// Fail as if the peer were unreachable.
    Refuse,
    /// Fail as if the URL were unusable.
    RejectEndpoint,
    /// Never complete.
    Hang,
}

/// A [`Connector`] whose peers are driven by test code.
#[derive(Debug)]
pub struct ScriptedConnector {
    behavior: Mutex<ConnectBehavior>,
    calls: AtomicUsize,
    peers: mpsc::UnboundedSender<ScriptedPeer>,
}

impl ScriptedConnector {
    /// Creates a connector plus the receiver on which accepted peers appear.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ScriptedPeer>) {
        let (peers, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            behavior: Mutex::new(ConnectBehavior::Accept),
            calls: AtomicUsize::new(0),
            peers,
        });
        (connector, rx)
    }

    /// Changes how subsequent `connect` calls behave.
    pub fn set_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.lock().unwrap_or_else(PoisonError::into_inner) = behavior;
    }

    /// Number of `connect` calls made so far, successful or not.
    pub fn connect_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap_or_else(PoisonError::into_inner);

        match behavior {
            ConnectBehavior::Accept => {
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                let (in_tx, in_rx) = mpsc::unbounded_channel();
                let peer = ScriptedPeer {
                    url: url.to_string(),
                    to_client: in_tx,
                    from_client: out_rx,
                };
                self.peers
                    .send(peer)
                    .map_err(|_| TransportError::Connect(format!("{url}: test peer gone")))?;
                Ok(TransportLink {
                    outbound: out_tx,
                    inbound: in_rx,
                })
            }
            ConnectBehavior::Refuse => {
                Err(TransportError::Connect(format!("{url}: connection refused")))
            }
            ConnectBehavior::RejectEndpoint => {
                Err(TransportError::InvalidEndpoint(url.to_string()))
            }
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }
}

/// The server side of one scripted connection.
///
/// Dropping the peer ends the link without a close frame, which the client
/// sees as an abnormal closure.
#[derive(Debug)]
pub struct ScriptedPeer {
    url: String,
    to_client: mpsc::UnboundedSender<TransportEvent>,
    from_client: mpsc::UnboundedReceiver<OutboundFrame>,
}

impl ScriptedPeer {
    /// The URL the client connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Delivers a raw text frame to the client.  Returns `false` if the client
    /// side of the link is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.to_client.send(TransportEvent::Text(text.into())).is_ok()
    }

    /// Encodes and delivers one envelope.
    pub fn send_envelope<P: Serialize + ?Sized>(&self, message_type: &str, payload: &P) -> bool {
        match encode_envelope(message_type, payload) {
            Ok(text) => self.send_text(text),
            Err(_) => false,
        }
    }

    /// Closes the link from the server side with `code`.
    pub fn close(&self, code: CloseCode) -> bool {
        self.to_client
            .send(TransportEvent::Closed {
                code,
                reason: String::new(),
            })
            .is_ok()
    }

    /// Waits for the next frame the client sends.  `None` once the client
    /// dropped its side of the link.
    pub async fn next_outbound(&mut self) -> Option<OutboundFrame> {
        self.from_client.recv().await
    }

    /// Returns a frame the client already sent, without waiting.
    pub fn try_next_outbound(&mut self) -> Option<OutboundFrame> {
        self.from_client.try_recv().ok()
    }
}
