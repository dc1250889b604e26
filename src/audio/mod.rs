pub mod buffer;
pub mod capture;
pub mod source;

pub use buffer::PendingSamples;
pub use capture::AudioCapture;
pub use source::{AcquisitionSource, ChannelSource, DeviceSource, WavFileSource};
