//! Byte-offset cursor over the shared file.

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Tracks how much of the shared file has been consumed.
///
/// Owned solely by the poll pump. The offset is monotonically
/// non-decreasing and lives only in memory; a restarted process starts
/// back at zero and re-reads the whole file.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCursor {
    offset: u64,
}

impl FileCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads all bytes appended since the cursor and advances it to
    /// end-of-file.
    ///
    /// A missing file reads as zero new bytes; the reader never creates
    /// it (the append pump does, on first record). A file shorter than the
    /// cursor (external truncation) also reads as zero; the cursor never
    /// moves backward.
    pub async fn drain(&mut self, path: &Path) -> std::io::Result<Vec<u8>> {
        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let len = file.metadata().await?.len();
        if len <= self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut bytes = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut bytes).await?;
        self.offset += bytes.len() as u64;
        Ok(bytes)
    }
}
