use num_complex::Complex;
use rustfft::FftPlanner;

/// One-sided amplitude spectrum of a real signal
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Width of one bin in Hz
    pub bin_hz: f32,
    /// Amplitude per bin, bins 0..=N/2, scaled so a full-bin sine of
    /// amplitude A reads as A
    pub magnitudes: Vec<f32>,
}

/// Spectral peak
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Peak {
    pub frequency_hz: f32,
    pub magnitude: f32,
}

/// Compute the amplitude spectrum of `samples` with a rectangular window.
///
/// Returns an empty spectrum for empty input.
pub fn magnitude_spectrum(samples: &[f32], sample_rate: f32) -> Spectrum {
    let n = samples.len();
    if n == 0 {
        return Spectrum {
            bin_hz: 0.0,
            magnitudes: Vec::new(),
        };
    }

    let mut buffer: Vec<Complex<f32>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let scale = 2.0 / n as f32;
    let magnitudes = buffer[..=n / 2]
        .iter()
        .enumerate()
        .map(|(k, c)| {
            // DC and Nyquist bins are not mirrored
            if k == 0 || (n % 2 == 0 && k == n / 2) {
                c.norm() / n as f32
            } else {
                c.norm() * scale
            }
        })
        .collect();

    Spectrum {
        bin_hz: sample_rate / n as f32,
        magnitudes,
    }
}

impl Spectrum {
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    fn bin_for(&self, frequency_hz: f32) -> usize {
        let bin = (frequency_hz / self.bin_hz).round().max(0.0) as usize;
        bin.min(self.magnitudes.len().saturating_sub(1))
    }

    /// Amplitude of the bin nearest `frequency_hz`
    pub fn magnitude_at(&self, frequency_hz: f32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.magnitudes[self.bin_for(frequency_hz)]
    }

    /// Strongest bin within `[low_hz, high_hz]`
    pub fn peak_in(&self, low_hz: f32, high_hz: f32) -> Option<Peak> {
        if self.is_empty() || high_hz < low_hz {
            return None;
        }
        let lo = self.bin_for(low_hz);
        let hi = self.bin_for(high_hz);

        (lo..=hi)
            .map(|k| Peak {
                frequency_hz: k as f32 * self.bin_hz,
                magnitude: self.magnitudes[k],
            })
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }

    /// The `count` strongest local maxima below `max_hz`, strongest first
    pub fn top_peaks(&self, count: usize, max_hz: f32) -> Vec<Peak> {
        if self.magnitudes.len() < 3 {
            return Vec::new();
        }
        let hi = self.bin_for(max_hz).min(self.magnitudes.len() - 2);

        let mut peaks: Vec<Peak> = (1..=hi)
            .filter(|&k| {
                let m = self.magnitudes[k];
                m > self.magnitudes[k - 1] && m >= self.magnitudes[k + 1]
            })
            .map(|k| Peak {
                frequency_hz: k as f32 * self.bin_hz,
                magnitude: self.magnitudes[k],
            })
            .collect();

        peaks.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
        peaks.truncate(count);
        peaks
    }
}

/// Level of `a` relative to `b` in dB
pub fn amplitude_ratio_db(a: f32, b: f32) -> f32 {
    20.0 * (a.max(f32::MIN_POSITIVE) / b.max(f32::MIN_POSITIVE)).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    fn sine(freq: f32, amplitude: f32, sample_rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_sine_amplitude_recovered() {
        let signal = sine(1000.0, 0.5, 16000.0, 16000);
        let spectrum = magnitude_spectrum(&signal, 16000.0);

        assert_abs_diff_eq!(spectrum.bin_hz, 1.0);
        assert_abs_diff_eq!(spectrum.magnitude_at(1000.0), 0.5, epsilon = 0.01);
        assert!(spectrum.magnitude_at(500.0) < 0.01);
    }

    #[test]
    fn test_dc_bin() {
        let signal = vec![3.0; 1024];
        let spectrum = magnitude_spectrum(&signal, 16000.0);
        assert_abs_diff_eq!(spectrum.magnitudes[0], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn test_peak_in_band() {
        let mut signal = sine(200.0, 1.0, 16000.0, 16000);
        for (s, t) in signal.iter_mut().zip(sine(3000.0, 2.0, 16000.0, 16000)) {
            *s += t;
        }
        let spectrum = magnitude_spectrum(&signal, 16000.0);

        let peak = spectrum.peak_in(100.0, 1000.0).unwrap();
        assert_abs_diff_eq!(peak.frequency_hz, 200.0);

        let top = spectrum.top_peaks(2, 8000.0);
        assert_eq!(top.len(), 2);
        assert_abs_diff_eq!(top[0].frequency_hz, 3000.0);
        assert_abs_diff_eq!(top[1].frequency_hz, 200.0);
    }

    #[test]
    fn test_ratio_db() {
        assert_abs_diff_eq!(amplitude_ratio_db(0.1, 1.0), -20.0, epsilon = 1e-4);
        assert_abs_diff_eq!(amplitude_ratio_db(1.0, 1.0), 0.0);
    }

    #[test]
    fn test_empty_input() {
        let spectrum = magnitude_spectrum(&[], 16000.0);
        assert!(spectrum.is_empty());
        assert_eq!(spectrum.magnitude_at(100.0), 0.0);
        assert!(spectrum.peak_in(0.0, 100.0).is_none());
    }
}
