//! WebSocket close codes as seen by the reconnection policy.
//!
//! Only one distinction matters to the client: was the connection closed
//! *normally* (code 1000, RFC 6455 §7.4.1) or not?  A normal closure means
//! somebody asked for the connection to end, so reconnecting would be wrong.
//! Every other code, including "no status received" (1005) and "abnormal
//! closure" (1006), is treated as a fault eligible for automatic reconnection.

use std::fmt;

/// A WebSocket close status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloseCode(pub u16);

impl CloseCode {
    /// Normal closure: the purpose of the connection has been fulfilled.
    pub const NORMAL: CloseCode = CloseCode(1000);
    /// The endpoint is going away (server shutdown, page navigation).
    pub const GOING_AWAY: CloseCode = CloseCode(1001);
    /// No status code was present in the close frame.
    pub const NO_STATUS: CloseCode = CloseCode(1005);
    /// The connection dropped without a close frame (never sent on the wire).
    pub const ABNORMAL: CloseCode = CloseCode(1006);

    /// Returns `true` only for [`CloseCode::NORMAL`].
    pub fn is_normal(self) -> bool {
        self == Self::NORMAL
    }
}

impl From<u16> for CloseCode {
    fn from(code: u16) -> Self {
        CloseCode(code)
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.0
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
