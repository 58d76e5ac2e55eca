//! Outbound pump — remote stream to local consumers. Both roles.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use linkspan_rendezvous::RendezvousEndpoint;

use crate::CHUNK_SIZE;

/// Reads chunks from the remote read half and delivers each one through a
/// fresh local connection.
///
/// One short-lived connection per chunk: the hub's accept loop is
/// serialized, so delivery has to release the channel between chunks. Ends
/// on remote end-of-stream or any I/O failure.
pub async fn outbound_pump<R>(
    mut remote: R,
    endpoint: Arc<RendezvousEndpoint>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            result = remote.read(&mut buf) => match result {
                Ok(0) => {
                    debug!("remote stream closed");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    warn!("remote read error: {e}");
                    break;
                }
            }
        };

        let mut conn = match endpoint.dial().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("local delivery dial failed: {e}");
                break;
            }
        };
        if let Err(e) = conn.write_all(&buf[..n]).await {
            warn!("local delivery write error: {e}");
            break;
        }
    }
}
