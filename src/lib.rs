pub mod audio;
pub mod config;
pub mod error;
pub mod pcm;
pub mod pipeline;
pub mod signal_processing;
pub mod storage;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::CaptureConfig;
pub use error::{CaptureError, Result};
pub use pipeline::{IterationOutcome, PipelineDriver, PipelineStats};
pub use wav::save_wav;
