//! Output file writing

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Write output blobs to `path` atomically
///
/// The blobs land in a sibling temporary file which is renamed over the
/// destination only after every byte is flushed, so a failed run never
/// leaves a truncated output behind.
pub fn write_atomic(path: &Path, blobs: &[Vec<u8>]) -> Result<()> {
    let tmp_path = temp_path(path);

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        for blob in blobs {
            file.write_all(blob)
                .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        }
        file.sync_all()
            .with_context(|| format!("failed to sync {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to move output into place at {}", path.display()))?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
