//! Kafka Topic Explorer mock generator: entry point.
//!
//! Serves canned topic-structure suggestions over WebSocket so the client can
//! be developed and tested without the real generator service.
//!
//! # Usage
//!
//! ```text
//! explorer-mock-server [OPTIONS]
//!
//! Options:
//!   --bind <ADDR>               Address to bind [default: 127.0.0.1]
//!   --port <PORT>               WebSocket port [default: 8080]
//!   --response-delay-ms <MS>    Delay before each answer [default: 1500]
//! ```
//!
//! | Variable                   | Default     |
//! |----------------------------|-------------|
//! | `EXPLORER_MOCK_BIND`       | `127.0.0.1` |
//! | `EXPLORER_MOCK_PORT`       | `8080`      |
//! | `EXPLORER_MOCK_DELAY_MS`   | `1500`      |

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use explorer_mock_server::domain::ServerConfig;
use explorer_mock_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Mock topic-structure generator for Kafka Topic Explorer.
#[derive(Debug, Parser)]
#[command(
    name = "explorer-mock-server",
    about = "Development WebSocket peer answering Kafka Topic Explorer requests",
    version
)]
struct Cli {
    /// IP address to bind the WebSocket server to.
    #[arg(long, default_value = "127.0.0.1", env = "EXPLORER_MOCK_BIND")]
    bind: String,

    /// TCP port for the WebSocket server.
    #[arg(long, default_value_t = 8080, env = "EXPLORER_MOCK_PORT")]
    port: u16,

    /// Milliseconds to wait before answering each request.
    #[arg(long, default_value_t = 1500, env = "EXPLORER_MOCK_DELAY_MS")]
    response_delay_ms: u64,
}

impl Cli {
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        Ok(ServerConfig {
            bind_addr,
            response_delay: Duration::from_millis(self.response_delay_ms),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;
    info!(
        "mock generator starting, bind={}, response delay={:?}",
        config.bind_addr, config.response_delay
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_server(config, running).await?;

    info!("mock generator stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
