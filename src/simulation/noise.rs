use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Additive white Gaussian noise at a given SNR
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub snr_db: Option<f32>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f32) -> Self {
        self.snr_db = Some(snr_db);
        self
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn signal_power(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|&x| x * x).sum::<f32>() / signal.len() as f32
}

/// Return a noisy copy of `signal`
pub fn apply_noise(signal: &[f32], config: &NoiseConfig) -> Vec<f32> {
    let mut result = signal.to_vec();
    let Some(snr_db) = config.snr_db else {
        return result;
    };

    let sig_power = signal_power(signal);
    if sig_power == 0.0 {
        return result;
    }

    let snr_linear = 10.0_f32.powf(snr_db / 10.0);
    let noise_std = (sig_power / snr_linear).sqrt();
    let Ok(normal) = Normal::new(0.0, noise_std as f64) else {
        return result;
    };

    let mut rng = create_rng(config.seed);
    for sample in result.iter_mut() {
        *sample += normal.sample(&mut rng) as f32;
    }
    result
}
