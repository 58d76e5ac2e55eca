//! Append pump — local producers to the shared file. Hub only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use linkspan_rendezvous::RendezvousEndpoint;

use crate::CHUNK_SIZE;

/// Accepts one local connection at a time and appends each received chunk
/// as a newline-terminated record to the shared file.
///
/// A local producer closing ends only its session; the pump goes back to
/// accepting the next connection. A file write failure ends the pump.
pub async fn append_pump(
    endpoint: Arc<RendezvousEndpoint>,
    file_path: PathBuf,
    cancel: CancellationToken,
) {
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

            if let Err(e) = append_record(&file_path, &buf[..n]).await {
                warn!(path = %file_path.display(), "shared file append failed: {e}");
                break 'accept;
            }
        }
    }
}

/// Appends one chunk as a newline-terminated record.
///
/// Open-append-close per record: each record is durably ordered on its
/// own, and O_APPEND keeps concurrent appenders from corrupting earlier
/// records. The record is a single write so it lands contiguously.
async fn append_record(path: &Path, chunk: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let mut record = Vec::with_capacity(chunk.len() + 1);
    record.extend_from_slice(chunk);
    record.push(b'\n');
    file.write_all(&record).await
}
