//! The connection manager: one duplex connection, bounded reconnection,
//! envelope dispatch and state notification.
//!
//! # Concurrency model (for beginners)
//!
//! All mutable connection state lives in a single [`Slot`] behind a mutex.
//! Every change to it happens in a short critical section that never awaits.
//! Long-running work happens in one background task at a time:
//!
//! - the **driver** task opens the transport, publishes OPEN, and dispatches
//!   inbound frames in arrival order until the link closes;
//! - the **reconnect timer** task sleeps for the policy delay and then starts
//!   a new driver.
//!
//! Each connection attempt gets a new *epoch* number.  A task only acts if the
//! slot's epoch still matches the one it was started with, which is how
//! `disconnect()` (and a manual `connect()`) cancels stale drivers and timers
//! without any extra cancellation primitive.
//!
//! State observers are notified through [`ObserverList`], outside the slot
//! lock, so an observer may call back into the manager.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use explorer_core::{
    decode_envelope, encode_envelope, CloseCode, ConnectionState, EnvelopeError,
    ReconnectDecision, ReconnectPolicy, ReconnectTracker,
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::observers::{ObserverId, ObserverList};
use super::registry::{HandlerId, HandlerRegistry};
use crate::infrastructure::transport::{
    websocket::WebSocketConnector, Connector, OutboundFrame, TransportEvent, TransportLink,
};

/// Endpoint used when none is configured.
pub const DEFAULT_URL: &str = "ws://localhost:8080";

/// Construction-time settings for a [`ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080`.
    pub url: String,
    /// Automatic reconnection policy.
    pub policy: ReconnectPolicy,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            policy: ReconnectPolicy::default(),
        }
    }
}

struct Slot {
    state: ConnectionState,
    epoch: u64,
    outbound: Option<mpsc::UnboundedSender<OutboundFrame>>,
    tracker: ReconnectTracker,
    /// Driver or reconnect timer belonging to `epoch`.
    task: Option<JoinHandle<()>>,
}

struct Inner {
    config: ConnectionConfig,
    connector: Arc<dyn Connector>,
    slot: Mutex<Slot>,
    handlers: HandlerRegistry,
    observers: ObserverList,
}

/// Cloneable handle to one managed connection.
///
/// All clones share the same connection, handlers and observers.  Methods
/// that start background work (`connect`, and therefore anything that
/// reconnects) must be called from within a Tokio runtime.
///
/// # Ownership
///
/// The driver and reconnect-timer tasks keep the shared state alive on their
/// own.  Dropping every clone does **not** close the connection: the socket
/// stays open and abnormal closes keep being retried until
/// [`disconnect`](Self::disconnect) is called or the runtime shuts down.
/// [`ConnectionSession`](crate::ConnectionSession) calls `disconnect()` from
/// its `Drop`, so a manager owned by a session is torn down with it.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Creates a manager that connects over WebSocket.  No connection is made
    /// until [`connect`](Self::connect) is called.
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_connector(config, Arc::new(WebSocketConnector::new()))
    }

    /// Creates a manager that opens connections through `connector`.
    pub fn with_connector(config: ConnectionConfig, connector: Arc<dyn Connector>) -> Self {
        let tracker = ReconnectTracker::new(config.policy);
        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                slot: Mutex::new(Slot {
                    state: ConnectionState::Closed,
                    epoch: 0,
                    outbound: None,
                    tracker,
                    task: None,
                }),
                handlers: HandlerRegistry::new(),
                observers: ObserverList::new(ConnectionState::Closed),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Opens the connection unless one is already open or being opened.
    ///
    /// Starts a fresh reconnection cycle: the attempt counter is reset and a
    /// pending automatic reconnection, if any, is superseded.  Failures are
    /// reported as a CLOSED notification, never returned.
    pub fn connect(&self) {
        {
            let mut slot = self.inner.lock_slot();
            if slot.state.is_active() {
                debug!("connect() ignored: connection is {}", slot.state);
                return;
            }
            slot.tracker.reset();
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            info!("connecting to {}", self.inner.config.url);
            self.inner.begin_attempt(&mut slot);
        }
        self.inner.observers.drain();
    }

    /// Closes the connection with code 1000 and cancels any pending
    /// automatic reconnection.  Never triggers the reconnection policy.
    pub fn disconnect(&self) {
        {
            let mut slot = self.inner.lock_slot();
            slot.epoch += 1;
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            if slot.state == ConnectionState::Closed {
                debug!("disconnect() while closed: pending reconnection cancelled");
                return;
            }

            slot.state = ConnectionState::Closing;
            self.inner.observers.enqueue(ConnectionState::Closing);
            if let Some(outbound) = slot.outbound.take() {
                let _ = outbound.send(OutboundFrame::Close(CloseCode::NORMAL));
            }
            slot.state = ConnectionState::Closed;
            self.inner.observers.enqueue(ConnectionState::Closed);
            info!("disconnected from {}", self.inner.config.url);
        }
        self.inner.observers.drain();
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    /// Sends one `{type, payload}` envelope.
    ///
    /// Returns `false`, without touching the connection state, when the
    /// connection is not OPEN or the payload cannot be encoded or handed to
    /// the transport.
    pub fn send_message<P>(&self, message_type: &str, payload: &P) -> bool
    where
        P: Serialize + ?Sized,
    {
        let outbound = {
            let slot = self.inner.lock_slot();
            match (&slot.outbound, slot.state) {
                (Some(outbound), ConnectionState::Open) => outbound.clone(),
                _ => {
                    debug!("`{message_type}` not sent: connection is {}", slot.state);
                    return false;
                }
            }
        };

        let text = match encode_envelope(message_type, payload) {
            Ok(text) => text,
            Err(e) => {
                error!("`{message_type}` not sent: {e}");
                return false;
            }
        };

        if outbound.send(OutboundFrame::Text(text)).is_err() {
            warn!("`{message_type}` not sent: transport is gone");
            return false;
        }
        debug!("sent `{message_type}`");
        true
    }

    // ── Message handlers ──────────────────────────────────────────────────────

    /// Routes every inbound `message_type` payload to `handler`, replacing any
    /// earlier handler for that type.
    pub fn on_message<F>(&self, message_type: &str, handler: F) -> HandlerId
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.inner.handlers.on(message_type, handler)
    }

    /// Like [`on_message`](Self::on_message), but the handler is removed
    /// before it runs for the first time.
    pub fn once_message<F>(&self, message_type: &str, handler: F) -> HandlerId
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.inner.handlers.once(message_type, handler)
    }

    pub fn remove_message_listener(&self, message_type: &str) -> bool {
        self.inner.handlers.remove(message_type)
    }

    /// Removes the handler for `message_type` only if it is still `id`.
    pub fn remove_message_listener_if(&self, message_type: &str, id: HandlerId) -> bool {
        self.inner.handlers.remove_if(message_type, id)
    }

    pub fn has_message_listener(&self, message_type: &str) -> bool {
        self.inner.handlers.contains(message_type)
    }

    // ── State observation ─────────────────────────────────────────────────────

    /// Registers `observer` for every subsequent state transition.
    /// Observers run in registration order.
    pub fn on_connection_state_change<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        self.inner.observers.add(observer)
    }

    /// Unknown ids are ignored.
    pub fn remove_connection_state_listener(&self, id: ObserverId) -> bool {
        self.inner.observers.remove(id)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.lock_slot().state
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_open()
    }

    /// A receiver that always holds the most recently notified state.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.observers.subscribe()
    }

    /// Automatic reconnection attempts since the last OPEN or manual connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.lock_slot().tracker.attempts()
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.inner.config.url)
            .field("state", &self.connection_state())
            .finish_non_exhaustive()
    }
}

// ── Background work ───────────────────────────────────────────────────────────

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock_slot().epoch == epoch
    }

    /// Moves to CONNECTING under a new epoch and spawns its driver.
    /// Called with the slot locked; the caller drains observers afterwards.
    fn begin_attempt(self: &Arc<Self>, slot: &mut Slot) {
        slot.epoch += 1;
        slot.state = ConnectionState::Connecting;
        slot.outbound = None;
        self.observers.enqueue(ConnectionState::Connecting);
        let driver = tokio::spawn(Arc::clone(self).drive(slot.epoch));
        slot.task = Some(driver);
    }

    async fn drive(self: Arc<Self>, epoch: u64) {
        let url = &self.config.url;

        let link = match self.connector.connect(url).await {
            Ok(link) => link,
            Err(e) => {
                warn!("could not connect to {url}: {e}");
                let code = e.is_retryable().then_some(CloseCode::ABNORMAL);
                self.handle_closed(epoch, code);
                return;
            }
        };
        let TransportLink {
            outbound,
            mut inbound,
        } = link;

        {
            let mut slot = self.lock_slot();
            if slot.epoch != epoch {
                // Superseded while the handshake was in flight.
                let _ = outbound.send(OutboundFrame::Close(CloseCode::NORMAL));
                return;
            }
            slot.state = ConnectionState::Open;
            slot.outbound = Some(outbound);
            slot.tracker.on_open();
            self.observers.enqueue(ConnectionState::Open);
        }
        info!("connected to {url}");
        self.observers.drain();

        let code = loop {
            match inbound.recv().await {
                Some(TransportEvent::Text(text)) => {
                    if !self.is_current(epoch) {
                        return;
                    }
                    self.dispatch_frame(&text);
                }
                Some(TransportEvent::Closed { code, reason }) => {
                    if reason.is_empty() {
                        info!("connection to {url} closed with code {code}");
                    } else {
                        info!("connection to {url} closed with code {code}: {reason}");
                    }
                    break code;
                }
                None => {
                    warn!("connection to {url} dropped without a close frame");
                    break CloseCode::ABNORMAL;
                }
            }
        };
        self.handle_closed(epoch, Some(code));
    }

    /// Publishes CLOSED for `epoch` and applies the reconnection policy.
    /// `code` is `None` for failures that must not be retried.
    fn handle_closed(self: &Arc<Self>, epoch: u64, code: Option<CloseCode>) {
        let (decision, max_attempts) = {
            let mut slot = self.lock_slot();
            if slot.epoch != epoch {
                return;
            }
            slot.state = ConnectionState::Closed;
            slot.outbound = None;
            slot.task = None;
            self.observers.enqueue(ConnectionState::Closed);

            let decision = code.map(|code| slot.tracker.on_close(code));
            if let Some(ReconnectDecision::Retry { delay, .. }) = decision {
                let inner = Arc::clone(self);
                slot.task = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    inner.reconnect(epoch);
                }));
            }
            (decision, slot.tracker.policy().max_attempts)
        };
        self.observers.drain();

        match decision {
            Some(ReconnectDecision::Retry { attempt, delay }) => {
                info!("reconnecting in {delay:?} (attempt {attempt}/{max_attempts})");
            }
            Some(ReconnectDecision::Exhausted { attempts }) => {
                warn!("giving up after {attempts} reconnection attempts; call connect() to retry");
            }
            Some(ReconnectDecision::NormalClosure) => {}
            None => warn!("endpoint {} is unusable; not reconnecting", self.config.url),
        }
    }

    /// Fired by the reconnect timer started for `epoch`.
    fn reconnect(self: &Arc<Self>, epoch: u64) {
        {
            let mut slot = self.lock_slot();
            if slot.epoch != epoch || slot.state != ConnectionState::Closed {
                debug!("stale reconnect timer ignored");
                return;
            }
            debug!("reconnecting to {}", self.config.url);
            self.begin_attempt(&mut slot);
        }
        self.observers.drain();
    }

    /// Decodes one inbound frame and hands its payload to the registered
    /// handler.  Anything unroutable is logged and dropped.
    fn dispatch_frame(&self, text: &str) {
        let envelope = match decode_envelope(text) {
            Ok(envelope) => envelope,
            Err(EnvelopeError::MissingType) => {
                warn!("discarding frame without a message type");
                return;
            }
            Err(e) => {
                warn!("discarding inbound frame: {e}");
                return;
            }
        };

        let message_type = envelope.message_type;
        if self.handlers.dispatch(&message_type, envelope.payload) {
            debug!("dispatched `{message_type}`");
        } else {
            debug!("no handler for `{message_type}`; frame dropped");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
