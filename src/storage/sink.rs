use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::{CaptureError, Result};

/// Append-only writer to a single logical output stream.
pub trait PersistenceSink {
    /// Append all of `bytes` to the stream.
    ///
    /// A failed append may have left a prefix of `bytes` on the medium; it
    /// is never retried within the same call.
    fn append(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Raw output file that is opened, written and closed on every append.
///
/// Holding no handle between appends means a card pulled and reinserted
/// between batches is picked up again without any reopen logic.
pub struct FileSink {
    path: PathBuf,
    sync_on_close: bool,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync_on_close: false,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            path: config.output_path(),
            sync_on_close: config.sync_on_close,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| CaptureError::StorageOpen {
                path: self.path.clone(),
                source,
            })?;

        let written = file
            .write(bytes)
            .map_err(|source| CaptureError::StorageWrite {
                path: self.path.clone(),
                source,
            })?;

        if self.sync_on_close {
            if let Err(e) = file.sync_data() {
                log::warn!("Failed to flush {}: {}", self.path.display(), e);
            }
        }

        if written != bytes.len() {
            return Err(CaptureError::ShortWrite {
                expected: bytes.len(),
                written,
            });
        }

        Ok(())
    }
}
