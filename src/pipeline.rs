use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rolling_stats::Stats;

use crate::audio::AcquisitionSource;
use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::pcm::{self, BYTES_PER_SAMPLE};
use crate::signal_processing::HighpassFilter;
use crate::storage::PersistenceSink;

/// Result of a single acquire, filter, persist iteration
#[derive(Debug)]
pub enum IterationOutcome {
    /// The batch reached the medium
    Persisted { samples: usize },
    /// The batch was filtered but could not be persisted and is lost
    Dropped { samples: usize, error: CaptureError },
    /// Nothing arrived before the read deadline
    NoData,
    /// The bus reported a fault; no batch was produced this iteration
    BusError { error: CaptureError },
    /// The source has ended
    Closed,
}

/// Running totals for a capture session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub batches_persisted: u64,
    pub batches_dropped: u64,
    /// Reads that hit their deadline with no data
    pub timeouts: u64,
    /// Reads that failed for any other reason
    pub bus_errors: u64,
    pub samples_persisted: u64,
    pub bytes_persisted: u64,
    pub samples_dropped: u64,
    pub samples_clamped: u64,
}

/// Steady-state capture loop.
///
/// Owns the filter and a single batch buffer that is reused every
/// iteration; exactly one batch is in flight at a time and batches reach
/// the sink in acquisition order.
pub struct PipelineDriver<S, P> {
    source: S,
    filter: HighpassFilter,
    sink: P,
    batch: Vec<i16>,
    bytes: Vec<u8>,
    read_timeout: Duration,
    pause: Duration,
    batch_duration: Duration,
    stats_interval: usize,
    stats: PipelineStats,
    write_latency: Stats<f32>,
}

impl<S: AcquisitionSource, P: PersistenceSink> PipelineDriver<S, P> {
    pub fn new(
        source: S,
        filter: HighpassFilter,
        sink: P,
        config: &CaptureConfig,
    ) -> Result<Self> {
        config.validate()?;

        if source.sample_rate() != config.audio.sample_rate {
            return Err(CaptureError::Config(format!(
                "source delivers {} Hz but {} Hz is configured",
                source.sample_rate(),
                config.audio.sample_rate
            )));
        }

        let batch_size = config.audio.batch_size;
        Ok(Self {
            source,
            filter,
            sink,
            batch: vec![0; batch_size],
            bytes: Vec::with_capacity(batch_size * BYTES_PER_SAMPLE),
            read_timeout: config.audio.read_timeout(),
            pause: config.pipeline.pause(),
            batch_duration: config.audio.batch_duration(),
            stats_interval: config.pipeline.stats_interval,
            stats: PipelineStats::default(),
            write_latency: Stats::new(),
        })
    }

    /// Run one iteration: acquire a batch, filter it in place, persist it.
    ///
    /// Per-batch failures are logged and reported in the outcome; they never
    /// leave the driver in a state that prevents the next iteration.
    pub fn step(&mut self) -> IterationOutcome {
        let count = match self.source.read_batch(&mut self.batch, self.read_timeout) {
            Ok(count) => count,
            Err(CaptureError::SourceClosed) => return IterationOutcome::Closed,
            Err(e) if e.is_transient() => {
                log::warn!("Acquisition failed: {}", e);
                self.stats.timeouts += 1;
                return IterationOutcome::NoData;
            }
            Err(error) => {
                log::error!("Audio bus error: {}", error);
                self.stats.bus_errors += 1;
                return IterationOutcome::BusError { error };
            }
        };
        if count < self.batch.len() {
            log::debug!("Short read: {} of {} samples", count, self.batch.len());
        }

        let samples = &mut self.batch[..count];
        let clamped = self.filter.process_batch(samples);
        if clamped > 0 {
            log::debug!("{} samples saturated", clamped);
            self.stats.samples_clamped += clamped as u64;
        }

        pcm::encode_into(samples, &mut self.bytes);

        let started = Instant::now();
        let result = self.sink.append(&self.bytes);
        let latency = started.elapsed();

        match result {
            Ok(()) => {
                self.stats.batches_persisted += 1;
                self.stats.samples_persisted += count as u64;
                self.stats.bytes_persisted += self.bytes.len() as u64;
                log::debug!("Saved {} bytes", self.bytes.len());
                self.record_latency(latency);
                IterationOutcome::Persisted { samples: count }
            }
            Err(error) => {
                log::warn!("Dropped batch of {} samples: {}", count, error);
                self.stats.batches_dropped += 1;
                self.stats.samples_dropped += count as u64;
                IterationOutcome::Dropped {
                    samples: count,
                    error,
                }
            }
        }
    }

    /// Loop until `shutdown` is set or the source ends.
    ///
    /// The flag is only checked between iterations, so a batch is always
    /// filtered and persisted as a unit.
    pub fn run(&mut self, shutdown: &AtomicBool) -> PipelineStats {
        while !shutdown.load(Ordering::Relaxed) {
            if let IterationOutcome::Closed = self.step() {
                log::info!("Audio source closed");
                break;
            }
            self.yield_to_storage();
        }
        self.stats.clone()
    }

    /// Run at most `iterations` iterations, stopping early if the source ends.
    pub fn run_for(&mut self, iterations: usize) -> PipelineStats {
        for _ in 0..iterations {
            if let IterationOutcome::Closed = self.step() {
                log::info!("Audio source closed");
                break;
            }
            self.yield_to_storage();
        }
        self.stats.clone()
    }

    fn yield_to_storage(&self) {
        if !self.pause.is_zero() {
            std::thread::sleep(self.pause);
        }
    }

    fn record_latency(&mut self, latency: Duration) {
        let ms = latency.as_secs_f32() * 1000.0;
        self.write_latency.update(ms);

        if latency > self.batch_duration {
            log::warn!(
                "Write took {:.1} ms, longer than one batch ({:.1} ms)",
                ms,
                self.batch_duration.as_secs_f32() * 1000.0
            );
        }

        if self.stats_interval > 0 && self.write_latency.count >= self.stats_interval {
            log::info!(
                "Write latency over {} batches: mean {:.2} ms, max {:.2} ms, std dev {:.2} ms; {} bytes total",
                self.write_latency.count,
                self.write_latency.mean,
                self.write_latency.max,
                self.write_latency.std_dev,
                self.stats.bytes_persisted
            );
            let overruns = self.source.overruns();
            if overruns > 0 {
                log::warn!("Audio bus overruns so far: {}", overruns);
            }
            self.write_latency = Stats::new();
        }
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn filter(&self) -> &HighpassFilter {
        &self.filter
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn into_sink(self) -> P {
        self.sink
    }
}
