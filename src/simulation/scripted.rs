use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::AcquisitionSource;
use crate::error::{CaptureError, Result};
use crate::storage::PersistenceSink;

/// Behaviour of one `read_batch` call on a [`ScriptedSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStep {
    /// Fill the whole batch (or whatever remains)
    Full,
    /// Deliver at most this many samples
    Partial(usize),
    /// Deliver nothing and report a timeout
    Timeout,
    /// Deliver nothing and report a bus fault
    Fault,
}

/// Deterministic source replaying a sample vector with scripted short
/// reads and timeouts. Reads beyond the script behave as `Full`.
pub struct ScriptedSource {
    samples: Vec<i16>,
    position: usize,
    steps: VecDeque<ReadStep>,
    sample_rate: u32,
    delivered: Vec<usize>,
}

impl ScriptedSource {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            position: 0,
            steps: VecDeque::new(),
            sample_rate,
            delivered: Vec::new(),
        }
    }

    pub fn with_steps<I: IntoIterator<Item = ReadStep>>(mut self, steps: I) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Sample counts returned by each successful read, in order
    pub fn delivered(&self) -> &[usize] {
        &self.delivered
    }
}

impl AcquisitionSource for ScriptedSource {
    fn read_batch(&mut self, batch: &mut [i16], timeout: Duration) -> Result<usize> {
        if self.position >= self.samples.len() {
            return Err(CaptureError::SourceClosed);
        }

        let limit = match self.steps.pop_front().unwrap_or(ReadStep::Full) {
            ReadStep::Full => batch.len(),
            ReadStep::Partial(n) => n.min(batch.len()),
            ReadStep::Timeout => return Err(CaptureError::AcquisitionTimeout(timeout)),
            ReadStep::Fault => {
                return Err(CaptureError::AudioStream("scripted bus fault".into()));
            }
        };

        let end = (self.position + limit).min(self.samples.len());
        let count = end - self.position;
        batch[..count].copy_from_slice(&self.samples[self.position..end]);
        self.position = end;
        self.delivered.push(count);

        Ok(count)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Failure injected into one append on a [`FlakySink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFault {
    /// The medium cannot be opened; nothing is written
    OpenFailure,
    /// Only this many bytes reach the medium
    ShortWrite(usize),
}

/// In-memory medium with failures scheduled by append attempt number
/// (zero-based).
#[derive(Default)]
pub struct FlakySink {
    data: Vec<u8>,
    faults: HashMap<usize, SinkFault>,
    attempts: usize,
    persisted: Vec<usize>,
}

impl FlakySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(mut self, attempt: usize, fault: SinkFault) -> Self {
        self.faults.insert(attempt, fault);
        self
    }

    /// Everything that reached the medium
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Byte counts of successful appends, in order
    pub fn persisted(&self) -> &[usize] {
        &self.persisted
    }
}

impl PersistenceSink for FlakySink {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let attempt = self.attempts;
        self.attempts += 1;

        match self.faults.get(&attempt) {
            Some(SinkFault::OpenFailure) => Err(CaptureError::StorageOpen {
                path: PathBuf::from("flaky"),
                source: io::Error::new(io::ErrorKind::NotFound, "medium unavailable"),
            }),
            Some(&SinkFault::ShortWrite(n)) if n < bytes.len() => {
                self.data.extend_from_slice(&bytes[..n]);
                Err(CaptureError::ShortWrite {
                    expected: bytes.len(),
                    written: n,
                })
            }
            _ => {
                self.data.extend_from_slice(bytes);
                self.persisted.push(bytes.len());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_reads() {
        let mut source = ScriptedSource::new((0..20).collect(), 16000).with_steps([
            ReadStep::Partial(3),
            ReadStep::Timeout,
            ReadStep::Fault,
        ]);
        let mut batch = [0i16; 8];
        let timeout = Duration::from_millis(1);

        assert_eq!(source.read_batch(&mut batch, timeout).unwrap(), 3);
        assert!(matches!(
            source.read_batch(&mut batch, timeout),
            Err(CaptureError::AcquisitionTimeout(_))
        ));
        assert!(matches!(
            source.read_batch(&mut batch, timeout),
            Err(CaptureError::AudioStream(_))
        ));
        assert_eq!(source.read_batch(&mut batch, timeout).unwrap(), 8);
        assert_eq!(batch[0], 3);
        assert_eq!(source.delivered(), &[3, 8]);
    }

    #[test]
    fn test_flaky_sink_faults() {
        let mut sink = FlakySink::new()
            .with_fault(0, SinkFault::OpenFailure)
            .with_fault(1, SinkFault::ShortWrite(1));

        assert!(sink.append(&[1, 2]).is_err());
        assert!(sink.append(&[3, 4]).is_err());
        sink.append(&[5, 6]).unwrap();

        assert_eq!(sink.data(), &[3, 5, 6]);
        assert_eq!(sink.persisted(), &[2]);
        assert_eq!(sink.attempts(), 3);
    }
}
