//! Poll pump — shared file to local consumers. Both roles.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use linkspan_rendezvous::RendezvousEndpoint;

use crate::cursor::FileCursor;

/// Polls the shared file on a fixed interval and delivers newly appended
/// bytes through a fresh local connection.
///
/// The cursor is owned by this loop alone. A poll that finds no new bytes
/// opens no connection. Ends on any I/O failure.
pub async fn poll_pump(
    endpoint: Arc<RendezvousEndpoint>,
    file_path: PathBuf,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let mut cursor = FileCursor::new();
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let bytes = match cursor.drain(&file_path).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(path = %file_path.display(), "shared file read error: {e}");
                        break;
                    }
                };
                if bytes.is_empty() {
                    continue;
                }

                debug!(
                    len = bytes.len(),
                    offset = cursor.offset(),
                    "delivering newly appended bytes"
                );

                let mut conn = match endpoint.dial().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!("local delivery dial failed: {e}");
                        break;
                    }
                };
                if let Err(e) = conn.write_all(&bytes).await {
                    warn!("local delivery write error: {e}");
                    break;
                }
            }
        }
    }
}
