//! WebSocket server: accept loop and per-session task management.
//!
//! Each accepted connection gets its own session task.  Inside a session,
//! every inbound text frame is handed to [`respond`]; a reply, if any, is
//! sent by a short-lived task after the configured response delay, so a slow
//! answer never stops the session from reading the next frame.
//!
//! Shutdown is triggered by a shared `AtomicBool` that the accept loop polls
//! every 200 ms (see `main.rs` for the Ctrl+C handler).

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::respond;
use crate::domain::ServerConfig;

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves sessions until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    info!("mock generator listening on ws://{}", config.bind_addr);
    serve(listener, config.response_delay, running).await
}

/// Serves sessions on an already bound `listener` until `running` is cleared.
///
/// Tests bind `127.0.0.1:0` themselves and pass the listener in, so they know
/// the port before the server starts.
pub async fn serve(
    listener: TcpListener,
    response_delay: Duration,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Short timeout so the shutdown flag is checked even when idle.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                tokio::spawn(handle_session(stream, peer_addr, response_delay));
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(stream: TcpStream, peer_addr: SocketAddr, response_delay: Duration) {
    let session_id = Uuid::new_v4();
    info!("session {session_id}: connection from {peer_addr}");

    match run_session(stream, session_id, response_delay).await {
        Ok(()) => info!("session {session_id}: closed"),
        Err(e) => warn!("session {session_id}: closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    session_id: Uuid,
    response_delay: Duration,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .with_context(|| format!("session {session_id}: WebSocket handshake failed"))?;

    let (ws_tx, mut ws_rx) = ws_stream.split();
    // Shared with the delayed reply tasks.
    let ws_tx = Arc::new(Mutex::new(ws_tx));

    while let Some(item) = ws_rx.next().await {
        let text = match item {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(frame)) => {
                debug!("session {session_id}: close frame received: {frame:?}");
                break;
            }
            Ok(WsMessage::Binary(_)) => {
                warn!("session {session_id}: unexpected binary frame (ignored)");
                continue;
            }
            Ok(_) => continue,
            Err(e) => {
                debug!("session {session_id}: read error: {e}");
                break;
            }
        };

        let reply = match respond(&text) {
            Ok(Some(reply)) => reply,
            Ok(None) => continue,
            Err(e) => {
                warn!("session {session_id}: {e}");
                continue;
            }
        };

        let encoded = match serde_json::to_string(&reply) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("session {session_id}: failed to encode reply: {e}");
                continue;
            }
        };

        debug!(
            "session {session_id}: answering `{}` in {response_delay:?}",
            reply.message_type
        );
        let sink = Arc::clone(&ws_tx);
        tokio::spawn(async move {
            tokio::time::sleep(response_delay).await;
            if let Err(e) = sink.lock().await.send(WsMessage::Text(encoded)).await {
                debug!("session {session_id}: reply not delivered: {e}");
            }
        });
    }

    // Flushes the close handshake reply queued by tungstenite.
    let _ = ws_tx.lock().await.close().await;
    Ok(())
}
