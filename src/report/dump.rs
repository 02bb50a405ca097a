//! Flat-file content dump
//!
//! The dump file is created (or truncated) before enumeration starts and
//! receives one line per blob with content once the report is complete.

use crate::error::Result;
use crate::report::models::StorageAccount;
use crate::report::render::content_line;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

pub struct ContentDump {
    path: PathBuf,
    file: File,
}

impl ContentDump {
    /// Create or truncate the dump file
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append every blob's content as a line; returns the number of lines
    pub async fn write_report(self, account: &StorageAccount) -> Result<usize> {
        let mut writer = BufWriter::new(self.file);
        let mut lines = 0;

        for (_, blob) in account.blobs() {
            if let Some(line) = content_line(blob) {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                lines += 1;
            }
        }

        writer.flush().await?;
        info!("Wrote {} content lines to {}", lines, self.path.display());
        Ok(lines)
    }
}
