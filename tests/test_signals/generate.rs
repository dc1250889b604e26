use std::fs;
use std::path::PathBuf;

use sdrecorder::CaptureConfig;
use sdrecorder::signal_processing::HighpassFilter;
use sdrecorder::simulation::{Tone, generate_tones, quantize_i16};

pub const SAMPLE_RATE: u32 = 16000;

/// Default configuration with no inter-iteration pause
#[allow(dead_code)]
pub fn test_config(batch_size: usize) -> CaptureConfig {
    let mut config = CaptureConfig::default();
    config.audio.batch_size = batch_size;
    config.pipeline.pause_ms = 0;
    config.pipeline.stats_interval = 0;
    config
}

/// Fresh empty directory under the system temp dir
#[allow(dead_code)]
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "sdrecorder-test-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Microphone-like capture: a low and a high tone over a DC bias
#[allow(dead_code)]
pub fn two_tone_capture(
    low_hz: f32,
    high_hz: f32,
    amplitude: f32,
    dc: f32,
    num_samples: usize,
) -> Vec<i16> {
    let signal = generate_tones(
        &[Tone::new(low_hz, amplitude), Tone::new(high_hz, amplitude)],
        dc,
        SAMPLE_RATE,
        num_samples,
    );
    quantize_i16(&signal)
}

/// What the filter produces for `input` processed as one continuous stream
#[allow(dead_code)]
pub fn filtered_reference(input: &[i16], cutoff_hz: f32) -> Vec<i16> {
    let mut out = input.to_vec();
    HighpassFilter::new(SAMPLE_RATE as f32, cutoff_hz).process_batch(&mut out);
    out
}
