use std::fs;
use std::path::PathBuf;

use crate::config::StorageConfig;
use crate::error::{CaptureError, Result};

const MB: u64 = 1024 * 1024;

/// What the mounted medium looks like at startup. Diagnostic only.
#[derive(Debug, Clone)]
pub struct MediumInfo {
    pub root: PathBuf,
    pub output_path: PathBuf,
    /// Size of an output file left by an earlier session
    pub existing_bytes: u64,
    /// Size of the filesystem holding `root`
    pub total_bytes: u64,
    /// Space left for the output to grow into
    pub available_bytes: u64,
}

/// Check that the medium is present and usable for the output file.
///
/// A missing or read-only medium is a setup failure.
pub fn mount(config: &StorageConfig) -> Result<MediumInfo> {
    let root = &config.root;
    let meta = fs::metadata(root)
        .map_err(|e| CaptureError::StorageMount(format!("{}: {}", root.display(), e)))?;

    if !meta.is_dir() {
        return Err(CaptureError::StorageMount(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    if meta.permissions().readonly() {
        return Err(CaptureError::StorageMount(format!(
            "{} is read-only",
            root.display()
        )));
    }

    let output_path = config.output_path();
    let existing_bytes = match fs::metadata(&output_path) {
        Ok(m) if m.is_file() => m.len(),
        Ok(_) => {
            return Err(CaptureError::StorageMount(format!(
                "{} exists and is not a file",
                output_path.display()
            )));
        }
        Err(_) => 0,
    };

    let total_bytes = fs2::total_space(root)
        .map_err(|e| CaptureError::StorageMount(format!("{}: {}", root.display(), e)))?;
    let available_bytes = fs2::available_space(root)
        .map_err(|e| CaptureError::StorageMount(format!("{}: {}", root.display(), e)))?;

    let info = MediumInfo {
        root: root.clone(),
        output_path,
        existing_bytes,
        total_bytes,
        available_bytes,
    };

    log::info!("Storage mounted at {}", info.root.display());
    log::info!(
        "Medium size: {}MB, {}MB available",
        info.total_bytes / MB,
        info.available_bytes / MB
    );
    log::info!(
        "Output {} ({} bytes from earlier sessions)",
        info.output_path.display(),
        info.existing_bytes
    );

    Ok(info)
}
