//! WebSocket transport built on `tokio-tungstenite`.
//!
//! After the handshake the socket is split into a sink and a stream, each
//! owned by its own Tokio task:
//!
//! - **writer** – drains the outbound channel into the sink; a
//!   [`OutboundFrame::Close`] sends a close frame and ends the task.
//! - **reader** – forwards text frames to the inbound channel and finishes
//!   with one [`TransportEvent::Closed`] carrying the peer's close code.
//!
//! A stream that errors or ends without a close frame is reported as
//! [`CloseCode::ABNORMAL`], and a close frame without a status code as
//! [`CloseCode::NO_STATUS`].

use async_trait::async_trait;
use explorer_core::CloseCode;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        protocol::{frame::coding::CloseCode as WsCloseCode, CloseFrame},
        Error as WsError, Message as WsMessage,
    },
};
use tracing::{debug, warn};

use super::{Connector, OutboundFrame, TransportError, TransportEvent, TransportLink};

/// Connects to `ws://` and `wss://` endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError> {
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::InvalidEndpoint(format!("{url}: {e}")))?;

        let (ws_stream, _response) = connect_async(request).await.map_err(|e| match e {
            // Unsupported scheme, missing host and the like.
            WsError::Url(e) => TransportError::InvalidEndpoint(format!("{url}: {e}")),
            e => TransportError::Connect(format!("{url}: {e}")),
        })?;

        debug!("WebSocket handshake with {url} complete");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutboundFrame>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<TransportEvent>();

        // ── Writer task ──────────────────────────────────────────────────────
        let writer_url = url.to_string();
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                match frame {
                    OutboundFrame::Text(text) => {
                        if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                            debug!("{writer_url}: send failed: {e}");
                            break;
                        }
                    }
                    OutboundFrame::Close(code) => {
                        let frame = CloseFrame {
                            code: WsCloseCode::from(u16::from(code)),
                            reason: "".into(),
                        };
                        if let Err(e) = ws_tx.send(WsMessage::Close(Some(frame))).await {
                            debug!("{writer_url}: close frame not sent: {e}");
                        }
                        break;
                    }
                }
            }
        });

        // ── Reader task ──────────────────────────────────────────────────────
        let reader_url = url.to_string();
        tokio::spawn(async move {
            let mut closed = None;
            while let Some(item) = ws_rx.next().await {
                match item {
                    Ok(WsMessage::Text(text)) => {
                        if in_tx.send(TransportEvent::Text(text)).is_err() {
                            // The manager moved on; nobody is listening.
                            return;
                        }
                    }
                    Ok(WsMessage::Binary(bytes)) => match String::from_utf8(bytes) {
                        Ok(text) => {
                            if in_tx.send(TransportEvent::Text(text)).is_err() {
                                return;
                            }
                        }
                        Err(_) => warn!("{reader_url}: dropping non-UTF-8 binary frame"),
                    },
                    Ok(WsMessage::Close(frame)) => {
                        closed = Some(match frame {
                            Some(f) => (CloseCode(f.code.into()), f.reason.into_owned()),
                            None => (CloseCode::NO_STATUS, String::new()),
                        });
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("{reader_url}: WebSocket error: {e}");
                        break;
                    }
                }
            }

            let (code, reason) = closed.unwrap_or((CloseCode::ABNORMAL, String::new()));
            let _ = in_tx.send(TransportEvent::Closed { code, reason });
        });

        Ok(TransportLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
