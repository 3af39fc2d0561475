//! Server configuration types.

use std::net::SocketAddr;
use std::time::Duration;

/// All runtime configuration for the mock peer.
///
/// # Example
///
/// ```rust
/// use explorer_mock_server::domain::ServerConfig;
///
/// let cfg = ServerConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: SocketAddr,
    /// How long to wait before answering each request.
    pub response_delay: Duration,
}

/// Delay the real generator typically needs, imitated by default.
pub const DEFAULT_RESPONSE_DELAY: Duration = Duration::from_millis(1500);

impl Default for ServerConfig {
    /// | Field          | Default          |
    /// |----------------|------------------|
    /// | bind_addr      | `127.0.0.1:8080` |
    /// | response_delay | 1500 ms          |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            response_delay: DEFAULT_RESPONSE_DELAY,
        }
    }
}
