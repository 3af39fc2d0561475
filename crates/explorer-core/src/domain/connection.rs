//! Connection lifecycle states and the bounded reconnection policy.
//!
//! # State machine (for beginners)
//!
//! ```text
//!              connect()                 transport opened
//!   CLOSED ──────────────▶ CONNECTING ─────────────────────▶ OPEN
//!     ▲                        │                               │
//!     │      failure           │          close / error        │
//!     └────────────────────────┘◀──────────────────────────────┘
//!     ▲                                                        │
//!     │            disconnect()                                │
//!     └──────────────── CLOSING ◀──────────────────────────────┘
//! ```
//!
//! After an *abnormal* close the client re-enters CONNECTING on its own, after
//! a fixed delay, at most `max_attempts` times in a row.  The bookkeeping for
//! that lives in [`ReconnectTracker`], which is a plain value type so the
//! policy can be tested without any timers or sockets.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::CloseCode;

/// Lifecycle state of the single duplex connection.
///
/// The discriminants match the `readyState` numbering used by WebSocket
/// implementations, so the values can be shown or logged unambiguously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConnectionState {
    /// A transport connection is being established.
    Connecting = 0,
    /// The transport is open and frames may be sent.
    Open = 1,
    /// A local, normal close is in progress.
    Closing = 2,
    /// There is no usable transport connection.
    Closed = 3,
}

impl ConnectionState {
    /// Returns `true` iff frames may currently be sent.
    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }

    /// Returns `true` while a connection exists or is being established,
    /// i.e. the states in which `connect()` is a no-op.
    pub fn is_active(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
            ConnectionState::Closing => "CLOSING",
            ConnectionState::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

// ── Reconnection policy ───────────────────────────────────────────────────────

/// Constant-backoff reconnection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Maximum number of consecutive automatic reconnection attempts.
    pub max_attempts: u32,
    /// Fixed wait before each automatic attempt (not exponential).
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    /// | Field        | Default  |
    /// |--------------|----------|
    /// | max_attempts | 5        |
    /// | delay        | 3000 ms  |
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(3000),
        }
    }
}

/// What the connection manager should do after the connection closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Schedule automatic attempt number `attempt` after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// The close was normal; stay closed.
    NormalClosure,
    /// `attempts` consecutive automatic attempts already failed; stay closed
    /// until a manual `connect()`.
    Exhausted { attempts: u32 },
}

/// Counts consecutive automatic reconnection attempts against a policy.
#[derive(Debug, Clone)]
pub struct ReconnectTracker {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectTracker {
    /// Creates a tracker with zero attempts recorded.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    /// The policy this tracker enforces.
    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Number of automatic attempts made since the last OPEN or manual connect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// A connection reached OPEN: the streak of failures is over.
    pub fn on_open(&mut self) {
        self.attempts = 0;
    }

    /// A manual `connect()` starts a fresh cycle regardless of past failures.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Decides whether to reconnect after a close with `code`.
    ///
    /// Increments the attempt counter by exactly one when it returns
    /// [`ReconnectDecision::Retry`].
    pub fn on_close(&mut self, code: CloseCode) -> ReconnectDecision {
        if code.is_normal() {
            return ReconnectDecision::NormalClosure;
        }
        if self.attempts >= self.policy.max_attempts {
            return ReconnectDecision::Exhausted {
                attempts: self.attempts,
            };
        }
        self.attempts += 1;
        ReconnectDecision::Retry {
            attempt: self.attempts,
            delay: self.policy.delay,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
