pub mod highpass;
pub mod spectrum;

pub use highpass::{HighpassCoefficients, HighpassFilter};
pub use spectrum::{Peak, Spectrum, amplitude_ratio_db, magnitude_spectrum};
