//! Kafka Topic Explorer command-line client.
//!
//! Connects to the generator service, asks for a topic structure for the
//! given description, and prints the answer as pretty JSON on stdout.
//!
//! # Usage
//!
//! ```text
//! explorer-client [OPTIONS] <TEXT>
//!
//! Options:
//!   --url <URL>                    WebSocket endpoint [default from config: ws://localhost:8080]
//!   --config <PATH>                Config file [default: platform config dir]
//!   --timeout-ms <MS>              Request timeout
//!   --max-attempts <N>             Automatic reconnection attempts
//!   --reconnect-delay-ms <MS>      Delay before each reconnection attempt
//!   --save-config                  Write the effective configuration and exit
//! ```
//!
//! # Configuration precedence
//!
//! CLI flag (or its environment variable) > config file > built-in default.
//!
//! | Variable                      | Flag                   |
//! |-------------------------------|------------------------|
//! | `EXPLORER_URL`                | `--url`                |
//! | `EXPLORER_CONFIG`             | `--config`             |
//! | `EXPLORER_TIMEOUT_MS`         | `--timeout-ms`         |
//! | `EXPLORER_MAX_ATTEMPTS`       | `--max-attempts`       |
//! | `EXPLORER_RECONNECT_DELAY_MS` | `--reconnect-delay-ms` |

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use explorer_client::application::session::{Notice, NoticeLevel};
use explorer_client::infrastructure::storage::config::{
    config_file_path, load_config, save_config, ClientConfig,
};
use explorer_client::{ConnectionManager, ConnectionSession, GenerateStructureUseCase, RequestBridge};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Suggest a Kafka topic structure for a free-text description.
#[derive(Debug, Parser)]
#[command(
    name = "explorer-client",
    about = "Kafka Topic Explorer command-line client",
    version
)]
struct Cli {
    /// Description of the data stream, e.g. "IoT sensor readings".
    #[arg(required_unless_present = "save_config")]
    text: Option<String>,

    /// WebSocket endpoint of the generator service.
    #[arg(long, env = "EXPLORER_URL")]
    url: Option<String>,

    /// Path of the TOML config file.
    #[arg(long, env = "EXPLORER_CONFIG")]
    config: Option<PathBuf>,

    /// Upper bound, in milliseconds, on connecting plus waiting for the answer.
    #[arg(long, env = "EXPLORER_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Consecutive automatic reconnection attempts before giving up.
    #[arg(long, env = "EXPLORER_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,

    /// Fixed delay, in milliseconds, before each reconnection attempt.
    #[arg(long, env = "EXPLORER_RECONNECT_DELAY_MS")]
    reconnect_delay_ms: Option<u64>,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    /// Overrides file settings with whatever was given on the command line.
    fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.url {
            config.connection.url = url.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.requests.timeout_ms = ms;
        }
        if let Some(n) = self.max_attempts {
            config.connection.max_reconnect_attempts = n;
        }
        if let Some(ms) = self.reconnect_delay_ms {
            config.connection.reconnect_delay_ms = ms;
        }
    }
}

fn report_notice(notice: Notice) {
    match notice.level {
        NoticeLevel::Info => info!("{}: {}", notice.title, notice.body),
        NoticeLevel::Warning => warn!("{}: {}", notice.title, notice.body),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.save_config {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => config_file_path()?,
        };
        save_config(&config, &path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("configuration written to {}", path.display());
        return Ok(());
    }

    let text = cli.text.clone().unwrap_or_default();
    info!("using generator at {}", config.connection.url);

    let manager = ConnectionManager::new(config.connection_config());
    let mut session = ConnectionSession::mount(manager.clone());
    let use_case = GenerateStructureUseCase::new(
        RequestBridge::new(manager).with_timeout(config.request_timeout()),
    );

    let generate = use_case.execute(&text);
    tokio::pin!(generate);

    let result = loop {
        tokio::select! {
            result = &mut generate => break result.map_err(anyhow::Error::from),
            Some(notice) = session.next_notice() => report_notice(notice),
            _ = tokio::signal::ctrl_c() => break Err(anyhow::anyhow!("interrupted")),
        }
    };

    drop(session);

    let structure = result.context("topic structure generation failed")?;
    println!("{}", serde_json::to_string_pretty(&structure)?);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
