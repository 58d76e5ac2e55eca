//! Local rendezvous channel over a Unix domain socket.
//!
//! The first process to claim the channel path binds a listener and becomes
//! the *hub*; every later process finds the live listener and joins as a
//! *spoke*. A leftover socket file with no listener behind it is reclaimed
//! (removed and re-bound) by the next claimant.

use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

/// Errors produced while acquiring or using the rendezvous channel.
#[derive(Debug, thiserror::Error)]
pub enum RendezvousError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind rendezvous socket {}: {source}", path.display())]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to reclaim stale socket {}: {source}", path.display())]
    Reclaim {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("rendezvous socket {} still contended after retry", path.display())]
    Contended { path: PathBuf },

    #[error("endpoint is not listening (spoke role)")]
    NotListening,
}

/// Which end of the rendezvous channel this process holds.
///
/// Decided once during [`RendezvousEndpoint::acquire`] and immutable for
/// the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the listening end of the channel.
    Hub,
    /// Connects to an existing hub's channel as a client.
    Spoke,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Hub => "hub",
            Role::Spoke => "spoke",
        }
    }
}

/// Outcome of probing the channel path.
enum ProbeOutcome {
    /// A live listener answered: another instance already owns the channel.
    Connected(UnixStream),
    /// Nothing exists at the path.
    Absent,
    /// A socket file exists but no listener answered.
    Stale,
}

/// The local rendezvous channel, acquired with a negotiated [`Role`].
pub struct RendezvousEndpoint {
    path: PathBuf,
    role: Role,
    listener: Option<UnixListener>,
}

impl RendezvousEndpoint {
    /// Claims the channel at `path`, negotiating this process's role.
    ///
    /// Probes the path and classifies the result: a live listener means a
    /// hub already owns the channel and this endpoint joins as a spoke; an
    /// absent path is bound directly; a stale socket file is removed and
    /// re-bound. Losing a bind race (the file appeared between probe and
    /// bind) is retried once; the second probe then finds the winner's
    /// listener and this endpoint becomes a spoke.
    pub async fn acquire(path: impl Into<PathBuf>) -> Result<Self, RendezvousError> {
        let path = path.into();

        for _ in 0..2 {
            match probe(&path).await {
                ProbeOutcome::Connected(stream) => {
                    // The probe connection served only to classify the
                    // channel; delivery connections are dialed per session.
                    drop(stream);
                    debug!(path = %path.display(), "live hub found, joining as spoke");
                    return Ok(Self {
                        path,
                        role: Role::Spoke,
                        listener: None,
                    });
                }
                ProbeOutcome::Stale => {
                    warn!(path = %path.display(), "reclaiming stale rendezvous socket");
                    // Known race: two processes can classify Stale at the
                    // same time and both reclaim; the second bind silently
                    // wins the channel.
                    std::fs::remove_file(&path).map_err(|source| RendezvousError::Reclaim {
                        path: path.clone(),
                        source,
                    })?;
                }
                ProbeOutcome::Absent => {}
            }

            match UnixListener::bind(&path) {
                Ok(listener) => {
                    debug!(path = %path.display(), "bound rendezvous socket");
                    return Ok(Self {
                        path,
                        role: Role::Hub,
                        listener: Some(listener),
                    });
                }
                // Another claimant bound between our probe and our bind;
                // re-probe to find its listener.
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => continue,
                Err(source) => return Err(RendezvousError::Bind { path, source }),
            }
        }

        Err(RendezvousError::Contended { path })
    }

    /// The negotiated role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The channel identity path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_hub(&self) -> bool {
        self.role == Role::Hub
    }

    /// Waits for the next local connection. Hub only.
    pub async fn accept(&self) -> Result<UnixStream, RendezvousError> {
        let listener = self.listener.as_ref().ok_or(RendezvousError::NotListening)?;
        let (stream, _addr) = listener.accept().await?;
        Ok(stream)
    }

    /// Opens a fresh client connection to the channel. Both roles.
    pub async fn dial(&self) -> Result<UnixStream, RendezvousError> {
        Ok(UnixStream::connect(&self.path).await?)
    }
}

impl Drop for RendezvousEndpoint {
    fn drop(&mut self) {
        // Only the hub owns the socket file.
        if self.listener.is_some() {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Probes `path` and classifies what lives there.
async fn probe(path: &Path) -> ProbeOutcome {
    if !path.exists() {
        return ProbeOutcome::Absent;
    }
    match UnixStream::connect(path).await {
        Ok(stream) => ProbeOutcome::Connected(stream),
        Err(_) => ProbeOutcome::Stale,
    }
}
