use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

use sdrecorder::pcm;
use sdrecorder::save_wav;
use sdrecorder::signal_processing::{Peak, magnitude_spectrum};

#[derive(Parser, Debug)]
#[command(name = "analyze_raw")]
#[command(about = "Spectral summary of raw 16-bit mono captures", long_about = None)]
struct Args {
    /// Raw capture files to analyze
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Sample rate the capture was recorded at
    #[arg(long, default_value_t = 16000)]
    sample_rate: u32,

    /// Upper frequency bound for reported peaks in Hz
    #[arg(long, default_value_t = 1000.0)]
    max_freq: f32,

    /// Number of spectral peaks to report
    #[arg(short = 'n', long, default_value_t = 5)]
    peaks: usize,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also write each capture as WAV into this directory
    #[arg(long)]
    wav_dir: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Serialize)]
struct CaptureAnalysis {
    filename: String,
    sample_count: usize,
    duration_secs: f32,
    rms: f32,
    dc_mean: f32,
    peak_abs: i16,
    peaks: Vec<Peak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wav: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let results: Vec<CaptureAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &args))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_text(&results, args.max_freq);
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn analyze_file(path: &Path, args: &Args) -> CaptureAnalysis {
    match analyze_file_impl(path, args) {
        Ok(analysis) => analysis,
        Err(e) => CaptureAnalysis {
            filename: display_name(path),
            sample_count: 0,
            duration_secs: 0.0,
            rms: 0.0,
            dc_mean: 0.0,
            peak_abs: 0,
            peaks: Vec::new(),
            wav: None,
            error: Some(e.to_string()),
        },
    }
}

fn analyze_file_impl(path: &Path, args: &Args) -> anyhow::Result<CaptureAnalysis> {
    let samples = pcm::read_raw_file(path)?;
    log::info!("{}: {} samples", path.display(), samples.len());

    let floats: Vec<f32> = samples.iter().map(|&s| s as f32).collect();
    let n = floats.len().max(1) as f32;
    let dc_mean = floats.iter().sum::<f32>() / n;
    let rms = (floats.iter().map(|x| x * x).sum::<f32>() / n).sqrt();
    let peak_abs = samples
        .iter()
        .map(|s| s.saturating_abs())
        .max()
        .unwrap_or(0);

    let spectrum = magnitude_spectrum(&floats, args.sample_rate as f32);
    let peaks = spectrum.top_peaks(args.peaks, args.max_freq);

    let wav = match &args.wav_dir {
        Some(dir) => {
            let out = dir.join(path.with_extension("wav").file_name().unwrap_or_default());
            save_wav(&out, &samples, args.sample_rate)?;
            log::info!("Wrote {}", out.display());
            Some(out.display().to_string())
        }
        None => None,
    };

    Ok(CaptureAnalysis {
        filename: display_name(path),
        sample_count: samples.len(),
        duration_secs: samples.len() as f32 / args.sample_rate as f32,
        rms,
        dc_mean,
        peak_abs,
        peaks,
        wav,
        error: None,
    })
}

fn print_text(results: &[CaptureAnalysis], max_freq: f32) {
    for result in results {
        println!("=== {} ===", result.filename);
        if let Some(ref err) = result.error {
            println!("  Error: {}", err);
            continue;
        }
        println!(
            "  Samples: {} ({:.2} s)",
            result.sample_count, result.duration_secs
        );
        println!(
            "  RMS: {:.1}  DC: {:.2}  Peak: {}",
            result.rms, result.dc_mean, result.peak_abs
        );
        println!("  Spectral peaks below {} Hz:", max_freq);
        for peak in &result.peaks {
            println!(
                "    {:>8.2} Hz  {:>10.2}",
                peak.frequency_hz, peak.magnitude
            );
        }
        if let Some(ref wav) = result.wav {
            println!("  WAV: {}", wav);
        }
        println!();
    }
}
