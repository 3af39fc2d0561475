//! Connection session: the application-wide owner of the connection.
//!
//! A [`ConnectionSession`] is created once when the application starts.
//! Mounting it registers a state observer and calls `connect()`; dropping it
//! removes the observer and disconnects.  In between it keeps the latest
//! state for status displays and turns OPEN/CLOSED transitions into
//! user-facing [`Notice`]s.

use std::sync::{Arc, Mutex, PoisonError};

use explorer_core::ConnectionState;
use tokio::sync::mpsc;

use crate::infrastructure::connection::{ConnectionManager, ObserverId};

// ── Status indicator ──────────────────────────────────────────────────────────

/// Visual tone of the status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Pending,
    Ok,
    Error,
}

/// What a connection status badge shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIndicator {
    pub label: &'static str,
    pub tone: StatusTone,
}

impl StatusIndicator {
    pub fn for_state(state: ConnectionState) -> Self {
        let (label, tone) = match state {
            ConnectionState::Connecting => ("Connecting", StatusTone::Pending),
            ConnectionState::Open => ("Connected", StatusTone::Ok),
            ConnectionState::Closing => ("Disconnecting", StatusTone::Pending),
            ConnectionState::Closed => ("Disconnected", StatusTone::Error),
        };
        Self { label, tone }
    }
}

// ── Notices ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A short user-facing message about the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: &'static str,
    pub body: &'static str,
}

/// The notice shown for `state`, if any.  Only OPEN and CLOSED produce one.
pub fn notice_for(state: ConnectionState) -> Option<Notice> {
    match state {
        ConnectionState::Open => Some(Notice {
            level: NoticeLevel::Info,
            title: "Connected to Server",
            body: "WebSocket connection established successfully.",
        }),
        ConnectionState::Closed => Some(Notice {
            level: NoticeLevel::Warning,
            title: "Disconnected from Server",
            body: "WebSocket connection closed. Some features may be unavailable.",
        }),
        ConnectionState::Connecting | ConnectionState::Closing => None,
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Owns the connection for the lifetime of the application.
pub struct ConnectionSession {
    manager: ConnectionManager,
    observer: ObserverId,
    latest: Arc<Mutex<ConnectionState>>,
    notices: mpsc::UnboundedReceiver<Notice>,
}

impl ConnectionSession {
    /// Starts observing `manager` and connects it.
    pub fn mount(manager: ConnectionManager) -> Self {
        let latest = Arc::new(Mutex::new(manager.connection_state()));
        let (notice_tx, notices) = mpsc::unbounded_channel();

        let observed = Arc::clone(&latest);
        let observer = manager.on_connection_state_change(move |state| {
            *observed.lock().unwrap_or_else(PoisonError::into_inner) = state;
            if let Some(notice) = notice_for(state) {
                let _ = notice_tx.send(notice);
            }
        });
        manager.connect();

        Self {
            manager,
            observer,
            latest,
            notices,
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// The most recently observed state.
    pub fn state(&self) -> ConnectionState {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> StatusIndicator {
        StatusIndicator::for_state(self.state())
    }

    /// Request forms are enabled only while the connection is OPEN.
    pub fn can_submit(&self) -> bool {
        self.state().is_open()
    }

    /// Waits for the next notice.
    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notices.recv().await
    }

    /// Returns an already emitted notice, without waiting.
    pub fn try_next_notice(&mut self) -> Option<Notice> {
        self.notices.try_recv().ok()
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        self.manager.remove_connection_state_listener(self.observer);
        self.manager.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_match_each_state() {
        let labels: Vec<_> = [
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ]
        .into_iter()
        .map(|s| StatusIndicator::for_state(s).label)
        .collect();

        assert_eq!(labels, ["Connecting", "Connected", "Disconnecting", "Disconnected"]);
    }

    #[test]
    fn test_only_open_is_ok_and_only_closed_is_error() {
        assert_eq!(StatusIndicator::for_state(ConnectionState::Open).tone, StatusTone::Ok);
        assert_eq!(StatusIndicator::for_state(ConnectionState::Closed).tone, StatusTone::Error);
        assert_eq!(
            StatusIndicator::for_state(ConnectionState::Connecting).tone,
            StatusTone::Pending
        );
    }

    #[test]
    fn test_notices_only_for_open_and_closed() {
        assert_eq!(notice_for(ConnectionState::Open).unwrap().title, "Connected to Server");
        assert_eq!(
            notice_for(ConnectionState::Closed).unwrap().level,
            NoticeLevel::Warning
        );
        assert!(notice_for(ConnectionState::Connecting).is_none());
        assert!(notice_for(ConnectionState::Closing).is_none());
    }
}
