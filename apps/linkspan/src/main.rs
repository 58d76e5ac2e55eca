//! linkspan entry point.

mod config;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use linkspan_relay::TransportMode;

#[derive(Parser, Debug)]
#[command(name = "linkspan")]
#[command(
    version,
    about = "Bridge a local rendezvous socket to a remote peer over TCP or a shared file"
)]
struct Args {
    /// Transport carrying the channel's bytes.
    #[arg(value_enum)]
    mode: Mode,

    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rendezvous socket path (overrides the config file).
    #[arg(long)]
    channel: Option<PathBuf>,

    /// Remote host:port for stream mode (overrides the config file).
    #[arg(long)]
    remote: Option<String>,

    /// Shared file path for file mode (overrides the config file).
    #[arg(long)]
    shared_file: Option<PathBuf>,

    /// Poll cadence for file mode, in milliseconds (overrides the config file).
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Forward over a persistent TCP connection.
    Stream,
    /// Forward through a shared append-only file.
    File,
}

impl From<Mode> for TransportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Stream => TransportMode::Stream,
            Mode::File => TransportMode::File,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting linkspan");

    let mut config = match config::Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            config::Config::default()
        }
    };

    if let Some(channel) = args.channel {
        config.channel_path = channel;
    }
    if let Some(remote) = args.remote {
        config.remote_addr = remote;
    }
    if let Some(shared_file) = args.shared_file {
        config.shared_file = shared_file;
    }
    if let Some(poll_interval_ms) = args.poll_interval_ms {
        config.poll_interval_ms = poll_interval_ms;
    }

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            signal_cancel.cancel();
        }
    });

    linkspan_relay::run(args.mode.into(), config.into_relay_config(), cancel).await?;
    Ok(())
}
