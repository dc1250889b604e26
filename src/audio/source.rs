use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use hound::WavReader;

use super::{AudioCapture, PendingSamples};
use crate::config::AudioConfig;
use crate::error::{CaptureError, Result};

/// Blocking pull of mono 16-bit samples in chronological order.
pub trait AcquisitionSource {
    /// Fill a prefix of `batch` with the next samples.
    ///
    /// Waits at most `timeout` for the batch to fill and returns the number
    /// of valid samples, which may be fewer than `batch.len()`. Only that
    /// prefix is valid. Returns `AcquisitionTimeout` when nothing arrived
    /// in time and `SourceClosed` once the stream has ended.
    fn read_batch(&mut self, batch: &mut [i16], timeout: Duration) -> Result<usize>;

    fn sample_rate(&self) -> u32;

    /// Chunks the bus discarded because reads fell behind
    fn overruns(&self) -> usize {
        0
    }
}

/// Source fed by a channel of sample chunks
pub struct ChannelSource {
    rx: Receiver<Vec<i16>>,
    pending: PendingSamples,
    sample_rate: u32,
}

impl ChannelSource {
    pub fn new(rx: Receiver<Vec<i16>>, sample_rate: u32) -> Self {
        Self {
            rx,
            pending: PendingSamples::new(),
            sample_rate,
        }
    }
}

impl AcquisitionSource for ChannelSource {
    fn read_batch(&mut self, batch: &mut [i16], timeout: Duration) -> Result<usize> {
        let deadline = Instant::now() + timeout;
        let mut filled = self.pending.drain_into(batch);

        while filled < batch.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(chunk) => {
                    self.pending.push(&chunk);
                    filled += self.pending.drain_into(&mut batch[filled..]);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    if filled == 0 {
                        return Err(CaptureError::SourceClosed);
                    }
                    break;
                }
            }
        }

        if filled == 0 && !batch.is_empty() {
            return Err(CaptureError::AcquisitionTimeout(timeout));
        }
        Ok(filled)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Live audio bus on the default input device
pub struct DeviceSource {
    inner: ChannelSource,
    capture: AudioCapture,
}

impl DeviceSource {
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(config.buffer_count);
        let capture = AudioCapture::new(config, tx)?;
        Ok(Self {
            inner: ChannelSource::new(rx, config.sample_rate),
            capture,
        })
    }
}

impl AcquisitionSource for DeviceSource {
    fn read_batch(&mut self, batch: &mut [i16], timeout: Duration) -> Result<usize> {
        self.inner.read_batch(batch, timeout)
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn overruns(&self) -> usize {
        self.capture.overruns()
    }
}

/// Replays a mono 16-bit WAV recording as if it came from the bus
pub struct WavFileSource {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(CaptureError::Config(format!(
                "Expected mono WAV file, got {} channels",
                spec.channels
            )));
        }
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(CaptureError::Config(format!(
                "Expected 16-bit integer WAV file, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            )));
        }

        let samples = reader
            .into_samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self::from_samples(samples, spec.sample_rate))
    }

    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            position: 0,
            sample_rate,
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }
}

impl AcquisitionSource for WavFileSource {
    fn read_batch(&mut self, batch: &mut [i16], _timeout: Duration) -> Result<usize> {
        if self.position >= self.samples.len() {
            return Err(CaptureError::SourceClosed);
        }

        let end = (self.position + batch.len()).min(self.samples.len());
        let count = end - self.position;
        batch[..count].copy_from_slice(&self.samples[self.position..end]);
        self.position = end;

        Ok(count)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
