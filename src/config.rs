//! Configuration for the capture pipeline.
//!
//! All parameters are fixed once the pipeline is built. Defaults match the
//! reference hardware: a mono I2S microphone at 16 kHz recorded onto an SD
//! card mounted at `/sdcard`.
//!
//! A TOML file may override any subset of fields:
//!
//! ```toml
//! [audio]
//! sample_rate = 16000
//! batch_size = 512
//!
//! [filter]
//! cutoff_hz = 20.0
//!
//! [storage]
//! root = "/media/card"
//! output_file = "session.raw"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CaptureError, Result};

/// Top-level capture configuration
///
/// # Example
/// ```
/// use sdrecorder::config::CaptureConfig;
///
/// let mut config = CaptureConfig::default();
/// config.filter.cutoff_hz = 40.0;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Audio bus configuration
    pub audio: AudioConfig,
    /// High-pass filter configuration
    pub filter: FilterConfig,
    /// Output medium configuration
    pub storage: StorageConfig,
    /// Steady-state loop tuning
    pub pipeline: PipelineConfig,
}

/// Audio bus configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample (only 16 is supported)
    pub bits_per_sample: u16,
    /// Channel count (only mono is supported)
    pub channels: u16,
    /// Samples per batch pulled from the bus
    pub batch_size: usize,
    /// Number of chunks the bus may queue ahead of the reader
    pub buffer_count: usize,
    /// Samples per bus chunk
    pub buffer_length: usize,
    /// Maximum time a single batch read may wait, in milliseconds
    pub read_timeout_ms: u64,
}

/// High-pass filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Cutoff frequency in Hz
    pub cutoff_hz: f32,
}

/// Output medium configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Mount point of the medium
    pub root: PathBuf,
    /// Raw output file, relative to `root`
    pub output_file: PathBuf,
    /// Flush each append to the medium before closing the file
    pub sync_on_close: bool,
}

/// Steady-state loop tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause between iterations in milliseconds
    pub pause_ms: u64,
    /// Batches between write latency summaries (0 disables them)
    pub stats_interval: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            bits_per_sample: 16,
            channels: 1,
            batch_size: 512,
            buffer_count: 8,
            buffer_length: 64,
            read_timeout_ms: 1000,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { cutoff_hz: 20.0 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/sdcard"),
            output_file: PathBuf::from("audio3.raw"),
            sync_on_close: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pause_ms: 1,
            stats_interval: 100,
        }
    }
}

impl AudioConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Time the bus needs to fill one batch
    pub fn batch_duration(&self) -> Duration {
        Duration::from_secs_f64(self.batch_size as f64 / self.sample_rate as f64)
    }
}

impl StorageConfig {
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_file)
    }
}

impl PipelineConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

impl CaptureConfig {
    /// Load a configuration from a TOML file, filling unspecified fields with defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CaptureError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the parameters the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        let audio = &self.audio;
        if audio.sample_rate == 0 {
            return Err(CaptureError::Config("sample rate must be positive".into()));
        }
        if audio.bits_per_sample != 16 {
            return Err(CaptureError::Config(format!(
                "unsupported bits per sample: {} (only 16 is supported)",
                audio.bits_per_sample
            )));
        }
        if audio.channels != 1 {
            return Err(CaptureError::Config(format!(
                "unsupported channel count: {} (only mono is supported)",
                audio.channels
            )));
        }
        if audio.batch_size == 0 {
            return Err(CaptureError::Config("batch size must be positive".into()));
        }
        if audio.buffer_count == 0 || audio.buffer_length == 0 {
            return Err(CaptureError::Config(
                "bus buffer count and length must be positive".into(),
            ));
        }

        let nyquist = audio.sample_rate as f32 / 2.0;
        let cutoff = self.filter.cutoff_hz;
        if !(cutoff > 0.0 && cutoff < nyquist) {
            return Err(CaptureError::Config(format!(
                "cutoff {} Hz must lie in (0, {}) Hz",
                cutoff, nyquist
            )));
        }

        if self.storage.output_file.as_os_str().is_empty() {
            return Err(CaptureError::Config("output file must be named".into()));
        }

        Ok(())
    }
}
