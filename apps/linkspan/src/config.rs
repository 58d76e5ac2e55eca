//! Relay configuration management.
//!
//! Configuration is stored as TOML at `~/.config/linkspan/config.toml`
//! (overridable with `--config`). Missing files are created with defaults
//! so the paths in play are always visible on disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use linkspan_relay::RelayConfig;

/// Relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Unix socket path naming the local rendezvous channel. Must be
    /// identical across hub and spoke processes on the same host.
    #[serde(default = "default_channel_path")]
    pub channel_path: PathBuf,

    /// Remote endpoint (`host:port`) for stream mode.
    #[serde(default = "default_remote_addr")]
    pub remote_addr: String,

    /// Shared append-only file for file mode (typically on a
    /// network-mounted filesystem).
    #[serde(default = "default_shared_file")]
    pub shared_file: PathBuf,

    /// Poll cadence for file mode, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_channel_path() -> PathBuf {
    PathBuf::from("/tmp/linkspan.sock")
}

fn default_remote_addr() -> String {
    "127.0.0.1:5000".into()
}

fn default_shared_file() -> PathBuf {
    PathBuf::from("/mnt/nfs/linkspan-relay.txt")
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_path: default_channel_path(),
            remote_addr: default_remote_addr(),
            shared_file: default_shared_file(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or the default location), creating
    /// a default file if none exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Converts into the orchestrator's wiring parameters.
    pub fn into_relay_config(self) -> RelayConfig {
        RelayConfig {
            channel_path: self.channel_path,
            remote_addr: self.remote_addr,
            shared_file: self.shared_file,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// Returns the default configuration file path.
fn default_config_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    Ok(PathBuf::from(home)
        .join(".config")
        .join("linkspan")
        .join("config.toml"))
}
