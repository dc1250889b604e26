use std::f32::consts::PI;

/// Coefficients of the single-pole high-pass recurrence
///
/// `y[n] = a0 * x[n] + a1 * x[n-1] - b1 * y[n-1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighpassCoefficients {
    pub a0: f32,
    pub a1: f32,
    pub b1: f32,
}

impl HighpassCoefficients {
    /// Derive coefficients from the RC time constant of the cutoff.
    ///
    /// With `RC = 1 / (2π·cutoff)` and `dt = 1 / sample_rate`,
    /// `α = RC / (RC + dt)`, giving `a0 = α`, `a1 = -α`, `b1 = 1 - α`.
    pub fn compute(sample_rate: f32, cutoff_hz: f32) -> Self {
        let rc = 1.0 / (2.0 * PI * cutoff_hz);
        let dt = 1.0 / sample_rate;
        let alpha = rc / (rc + dt);

        Self {
            a0: alpha,
            a1: -alpha,
            b1: 1.0 - alpha,
        }
    }
}

/// Stateful single-pole high-pass filter for 16-bit PCM.
///
/// The two memories carry across batches, so one instance must see every
/// sample of the stream in arrival order.
#[derive(Debug, Clone)]
pub struct HighpassFilter {
    coeffs: HighpassCoefficients,
    prev_input: f32,
    prev_output: f32,
}

impl HighpassFilter {
    pub fn new(sample_rate: f32, cutoff_hz: f32) -> Self {
        Self::from_coefficients(HighpassCoefficients::compute(sample_rate, cutoff_hz))
    }

    pub fn from_coefficients(coeffs: HighpassCoefficients) -> Self {
        Self {
            coeffs,
            prev_input: 0.0,
            prev_output: 0.0,
        }
    }

    pub fn coefficients(&self) -> HighpassCoefficients {
        self.coeffs
    }

    /// Advance the recurrence by one sample and return the unquantized output.
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output = c.a0 * input + c.a1 * self.prev_input - c.b1 * self.prev_output;

        self.prev_input = input;
        self.prev_output = output;

        output
    }

    /// Filter a batch of samples in place.
    ///
    /// Outputs are rounded to nearest and saturated to the i16 range.
    /// Returns the number of samples that had to be saturated.
    pub fn process_batch(&mut self, samples: &mut [i16]) -> usize {
        let mut clamped = 0;
        for sample in samples.iter_mut() {
            let (quantized, saturated) = quantize(self.process(*sample as f32));
            *sample = quantized;
            clamped += saturated as usize;
        }
        clamped
    }

    /// Clear the filter memories, keeping the coefficients.
    pub fn reset(&mut self) {
        self.prev_input = 0.0;
        self.prev_output = 0.0;
    }
}

fn quantize(value: f32) -> (i16, bool) {
    let rounded = value.round();
    if rounded > i16::MAX as f32 {
        (i16::MAX, true)
    } else if rounded < i16::MIN as f32 {
        (i16::MIN, true)
    } else {
        (rounded as i16, false)
    }
}
