//! Typed request/response over the untyped envelope connection.
//!
//! The connection carries no correlation ids.  A request of type `generate`
//! is answered by the next inbound `generate_response`, whatever it says.
//! [`RequestBridge::request`] turns that into an awaitable call:
//!
//! 1. wait until the connection is OPEN, calling `connect()` if needed;
//! 2. register a single-shot handler for the response type;
//! 3. send the request envelope;
//! 4. resolve with the first matching payload.
//!
//! # Overlapping requests
//!
//! Only one handler exists per response type, so a second request with the
//! same response type replaces the first request's handler.  The first
//! request then fails with [`RequestError::Superseded`] instead of waiting for
//! an answer that will be delivered elsewhere.
//!
//! # Timeout and cancellation
//!
//! The whole exchange, connection included, is bounded by the bridge timeout.
//! When it elapses, or when the caller drops the future, the request's own
//! handler is removed (a newer request's handler is left alone).  A request
//! already on the wire is not recalled.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use crate::infrastructure::connection::{ConnectionManager, HandlerId};

/// Bound applied when no timeout is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The request could not be transmitted.
    #[error("failed to send `{0}` request")]
    SendFailed(String),

    /// A newer request registered its own handler for the response type.
    #[error("superseded by a newer request awaiting `{0}`")]
    Superseded(String),

    /// No response arrived in time.
    #[error("no response within {0:?}")]
    TimedOut(Duration),
}

/// Sends requests through a [`ConnectionManager`] and awaits their responses.
#[derive(Debug, Clone)]
pub struct RequestBridge {
    manager: ConnectionManager,
    timeout: Duration,
}

impl RequestBridge {
    pub fn new(manager: ConnectionManager) -> Self {
        Self {
            manager,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Sends `payload` as `request_type` and resolves with the payload of the
    /// next `response_type` envelope.
    ///
    /// # Errors
    ///
    /// - [`RequestError::SendFailed`] if the envelope could not be sent.
    /// - [`RequestError::Superseded`] if a newer request took over the
    ///   response handler.
    /// - [`RequestError::TimedOut`] if connecting plus waiting took longer
    ///   than the bridge timeout.
    pub async fn request<P>(
        &self,
        request_type: &str,
        response_type: &str,
        payload: &P,
    ) -> Result<Value, RequestError>
    where
        P: Serialize + Sync + ?Sized,
    {
        match tokio::time::timeout(
            self.timeout,
            self.exchange(request_type, response_type, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                debug!("`{request_type}` timed out after {:?}", self.timeout);
                Err(RequestError::TimedOut(self.timeout))
            }
        }
    }

    async fn exchange<P>(
        &self,
        request_type: &str,
        response_type: &str,
        payload: &P,
    ) -> Result<Value, RequestError>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.wait_until_open().await;

        let (tx, rx) = oneshot::channel();
        let id = self.manager.once_message(response_type, move |payload| {
            let _ = tx.send(payload);
        });
        let _guard = HandlerGuard {
            manager: &self.manager,
            message_type: response_type,
            id,
        };

        if !self.manager.send_message(request_type, payload) {
            return Err(RequestError::SendFailed(request_type.to_string()));
        }

        rx.await
            .map_err(|_| RequestError::Superseded(response_type.to_string()))
    }

    async fn wait_until_open(&self) {
        let mut state = self.manager.watch_state();
        if state.borrow_and_update().is_open() {
            return;
        }
        self.manager.connect();
        // The sender lives as long as the manager, which `self` keeps alive,
        // so this only returns once the state is OPEN.
        let _ = state.wait_for(|s| s.is_open()).await;
    }
}

/// Removes the request's handler when the exchange ends for any reason.
struct HandlerGuard<'a> {
    manager: &'a ConnectionManager,
    message_type: &'a str,
    id: HandlerId,
}

impl Drop for HandlerGuard<'_> {
    fn drop(&mut self) {
        self.manager
            .remove_message_listener_if(self.message_type, self.id);
    }
}
