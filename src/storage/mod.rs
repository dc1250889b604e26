pub mod medium;
pub mod sink;

pub use medium::{MediumInfo, mount};
pub use sink::{FileSink, PersistenceSink};
