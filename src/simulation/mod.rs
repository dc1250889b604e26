mod noise;
mod scripted;
mod signal;

pub use noise::{NoiseConfig, apply_noise, signal_power};
pub use scripted::{FlakySink, ReadStep, ScriptedSource, SinkFault};
pub use signal::{Tone, generate_tones, quantize_i16};
