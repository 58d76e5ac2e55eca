//! Inbound pump — local producers to the remote stream. Hub only.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use linkspan_rendezvous::RendezvousEndpoint;

use crate::CHUNK_SIZE;

/// Accepts one local connection at a time and copies its bytes to the
/// remote write half.
///
/// A local producer closing (or erroring) ends only its session; the pump
/// goes back to accepting the next connection. A remote write failure ends
/// the pump, since there is nowhere left to forward to.
pub async fn inbound_pump<W>(
    endpoint: Arc<RendezvousEndpoint>,
    mut remote: W,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];

    'accept: loop {
        let mut conn = tokio::select! {
            _ = cancel.cancelled() => break,
            result = endpoint.accept() => match result {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("local accept failed: {e}");
                    break;
                }
            }
        };
        debug!("local producer connected");

        loop {
            let n = tokio::select! {
                _ = cancel.cancelled() => break 'accept,
                result = conn.read(&mut buf) => match result {
                    Ok(0) => {
                        debug!("local producer closed");
                        break;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        warn!("local read error: {e}");
                        break;
                    }
                }
            };

            if let Err(e) = remote.write_all(&buf[..n]).await {
                warn!("remote write error: {e}");
                break 'accept;
            }
        }
    }
}
