pub mod generate;

pub use generate::{filtered_reference, scratch_dir, test_config, two_tone_capture};
