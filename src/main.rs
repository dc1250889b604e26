use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;

use sdrecorder::audio::{AcquisitionSource, DeviceSource, WavFileSource};
use sdrecorder::signal_processing::HighpassFilter;
use sdrecorder::storage::{self, FileSink};
use sdrecorder::{CaptureConfig, PipelineDriver, PipelineStats};

#[derive(Parser, Debug)]
#[command(name = "sdrecorder")]
#[command(about = "Record high-pass filtered microphone audio to a raw file", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage mount point
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Output file name, relative to the mount point
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replay a mono 16-bit WAV file instead of the audio device
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// High-pass cutoff in Hz
    #[arg(long)]
    cutoff: Option<f32>,

    /// Samples per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Pause between iterations in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Stop after this many iterations
    #[arg(long)]
    max_batches: Option<usize>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = build_config(&args)?;

    println!("=== SD Recorder ===");
    println!("Sample rate: {} Hz", config.audio.sample_rate);
    println!("Batch size: {} samples", config.audio.batch_size);
    println!("High-pass cutoff: {} Hz", config.filter.cutoff_hz);
    println!("Output: {}", config.storage.output_path().display());
    println!();

    match &args.input {
        Some(path) => {
            let source = WavFileSource::new(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            record(source, &config, args.max_batches)
        }
        None => {
            let source = DeviceSource::new(&config.audio).map_err(|e| {
                log::error!("Audio bus initialization failed: {}", e);
                e
            })?;
            log::info!("Audio bus initialized");
            record(source, &config, args.max_batches)
        }
    }
}

fn build_config(args: &Args) -> anyhow::Result<CaptureConfig> {
    let mut config = match &args.config {
        Some(path) => CaptureConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => CaptureConfig::default(),
    };

    if let Some(root) = &args.root {
        config.storage.root = root.clone();
    }
    if let Some(output) = &args.output {
        config.storage.output_file = output.clone();
    }
    if let Some(cutoff) = args.cutoff {
        config.filter.cutoff_hz = cutoff;
    }
    if let Some(batch_size) = args.batch_size {
        config.audio.batch_size = batch_size;
    }
    if let Some(pause_ms) = args.pause_ms {
        config.pipeline.pause_ms = pause_ms;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn record<S: AcquisitionSource>(
    source: S,
    config: &CaptureConfig,
    max_batches: Option<usize>,
) -> anyhow::Result<()> {
    let medium = storage::mount(&config.storage).map_err(|e| {
        log::error!("Storage initialization failed: {}", e);
        e
    })?;
    if medium.existing_bytes > 0 {
        log::info!(
            "Appending to existing capture ({} bytes)",
            medium.existing_bytes
        );
    }

    let filter = HighpassFilter::new(config.audio.sample_rate as f32, config.filter.cutoff_hz);
    let c = filter.coefficients();
    log::info!("Filter coefficients: a0={} a1={} b1={}", c.a0, c.a1, c.b1);

    let sink = FileSink::from_config(&config.storage);
    let mut driver = PipelineDriver::new(source, filter, sink, config)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .context("failed to install Ctrl-C handler")?;

    println!("Recording... (Ctrl-C to stop)\n");

    let stats = match max_batches {
        Some(n) => driver.run_for(n),
        None => driver.run(&shutdown),
    };
    if shutdown.load(Ordering::Relaxed) {
        log::info!("Stopped by user");
    }

    print_summary(&stats, config);
    Ok(())
}

fn print_summary(stats: &PipelineStats, config: &CaptureConfig) {
    let seconds = stats.samples_persisted as f64 / config.audio.sample_rate as f64;
    println!("Batches persisted: {}", stats.batches_persisted);
    println!("Batches dropped: {}", stats.batches_dropped);
    println!("Read timeouts: {}", stats.timeouts);
    if stats.bus_errors > 0 {
        println!("Bus errors: {}", stats.bus_errors);
    }
    println!(
        "Bytes written: {} ({:.1} s of audio)",
        stats.bytes_persisted, seconds
    );
    if stats.samples_clamped > 0 {
        println!("Saturated samples: {}", stats.samples_clamped);
    }
}
