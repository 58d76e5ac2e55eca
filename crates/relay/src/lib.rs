//! Relay orchestration.
//!
//! Acquires the local rendezvous channel once, connects the configured
//! remote transport, and spawns the forwarding pumps appropriate for the
//! negotiated role. The orchestrator copies no data itself: it is pure
//! wiring plus an idle wait on the cancellation token.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::info;

use linkspan_file_channel::{append_pump, poll_pump};
use linkspan_rendezvous::{RendezvousEndpoint, Role};
use linkspan_stream_channel::{inbound_pump, outbound_pump};

/// Which remote transport carries the channel's bytes.
///
/// Supplied on the command line, immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Persistent TCP connection to the remote endpoint.
    Stream,
    /// Shared append-only file on a common filesystem.
    File,
}

impl TransportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Stream => "stream",
            TransportMode::File => "file",
        }
    }
}

/// Relay wiring parameters.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Unix socket path naming the local rendezvous channel.
    pub channel_path: PathBuf,
    /// Remote endpoint (`host:port`) for stream mode.
    pub remote_addr: String,
    /// Shared append-only file for file mode.
    pub shared_file: PathBuf,
    /// Poll cadence for file mode.
    pub poll_interval: Duration,
}

/// Fatal setup failures. Pump-level I/O failures never surface here; they
/// end only the affected pump.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Rendezvous(#[from] linkspan_rendezvous::RendezvousError),

    #[error("failed to connect to remote {addr}: {source}")]
    RemoteConnect {
        addr: String,
        source: std::io::Error,
    },
}

/// Runs the relay until `cancel` fires.
///
/// The hub role alone runs the inbound/append pump (only one hub ever
/// listens on the channel); both roles run the outbound/poll pump.
/// Setup failures (cannot acquire the channel, cannot reach the remote)
/// are fatal and returned before any pump starts.
pub async fn run(
    mode: TransportMode,
    config: RelayConfig,
    cancel: CancellationToken,
) -> Result<(), RelayError> {
    let endpoint = Arc::new(RendezvousEndpoint::acquire(&config.channel_path).await?);
    let role = endpoint.role();

    // A spoke never writes to the remote, but its write half stays open so
    // the remote does not see a half-closed peer.
    let mut _spoke_remote_write: Option<tokio::net::tcp::OwnedWriteHalf> = None;

    match mode {
        TransportMode::Stream => {
            let stream = TcpStream::connect(&config.remote_addr).await.map_err(|source| {
                RelayError::RemoteConnect {
                    addr: config.remote_addr.clone(),
                    source,
                }
            })?;
            let (remote_read, remote_write) = stream.into_split();

            match role {
                Role::Hub => {
                    tokio::spawn(inbound_pump(
                        Arc::clone(&endpoint),
                        remote_write,
                        cancel.child_token(),
                    ));
                }
                Role::Spoke => _spoke_remote_write = Some(remote_write),
            }
            tokio::spawn(outbound_pump(
                remote_read,
                Arc::clone(&endpoint),
                cancel.child_token(),
            ));
        }
        TransportMode::File => {
            if role == Role::Hub {
                tokio::spawn(append_pump(
                    Arc::clone(&endpoint),
                    config.shared_file.clone(),
                    cancel.child_token(),
                ));
            }
            tokio::spawn(poll_pump(
                Arc::clone(&endpoint),
                config.shared_file.clone(),
                config.poll_interval,
                cancel.child_token(),
            ));
        }
    }

    info!(
        mode = mode.as_str(),
        role = role.as_str(),
        channel = %config.channel_path.display(),
        "relay running"
    );

    cancel.cancelled().await;
    info!("relay shutting down");
    Ok(())
}
