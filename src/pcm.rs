//! Raw PCM output format: little-endian signed 16-bit mono, no header.

use std::path::Path;

use crate::error::Result;

pub const BYTES_PER_SAMPLE: usize = 2;

/// Serialize `samples` into `out`, replacing its contents.
///
/// `out` keeps its allocation between calls.
pub fn encode_into(samples: &[i16], out: &mut Vec<u8>) {
    out.clear();
    out.reserve(samples.len() * BYTES_PER_SAMPLE);
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
}

/// Parse little-endian samples. A trailing odd byte is ignored.
pub fn decode(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

pub fn read_raw_file<P: AsRef<Path>>(path: P) -> Result<Vec<i16>> {
    let bytes = std::fs::read(path.as_ref())?;
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        log::warn!(
            "{}: {} bytes is not a whole number of samples, ignoring trailing byte",
            path.as_ref().display(),
            bytes.len()
        );
    }
    Ok(decode(&bytes))
}
