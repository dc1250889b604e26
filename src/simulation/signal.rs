use std::f64::consts::PI;

/// One sinusoidal component of a synthetic microphone signal
#[derive(Debug, Clone, Copy)]
pub struct Tone {
    pub frequency_hz: f32,
    /// Peak amplitude in sample units
    pub amplitude: f32,
}

impl Tone {
    pub fn new(frequency_hz: f32, amplitude: f32) -> Self {
        Self {
            frequency_hz,
            amplitude,
        }
    }
}

/// Sum of `tones` plus a constant `dc_offset`, as floating point samples.
///
/// Phase is computed in f64 so long signals keep an exact frequency.
pub fn generate_tones(
    tones: &[Tone],
    dc_offset: f32,
    sample_rate: u32,
    num_samples: usize,
) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let ac: f64 = tones
                .iter()
                .map(|tone| tone.amplitude as f64 * (2.0 * PI * tone.frequency_hz as f64 * t).sin())
                .sum();
            (ac + dc_offset as f64) as f32
        })
        .collect()
}

/// Round and saturate floating point samples to 16-bit PCM
pub fn quantize_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| s.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}
