use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Storage mount failed: {0}")]
    StorageMount(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No audio received within {0:?}")]
    AcquisitionTimeout(Duration),

    #[error("Audio source closed")]
    SourceClosed,

    #[error("Failed to open {path} for append: {source}")]
    StorageOpen { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    StorageWrite { path: PathBuf, source: io::Error },

    #[error("Short write: expected {expected} bytes, wrote {written}")]
    ShortWrite { expected: usize, written: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl CaptureError {
    /// Steady-state errors the pipeline absorbs; everything else halts setup.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CaptureError::AcquisitionTimeout(_)
                | CaptureError::StorageOpen { .. }
                | CaptureError::StorageWrite { .. }
                | CaptureError::ShortWrite { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
