use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, error};

/// Replace `path` with `contents`, never exposing a partial file at the final path
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    // Same directory as the target so the rename stays on one filesystem
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;

    debug!("💾 Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Serialize `value` as JSON and write it atomically
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec(value)?;
    write_atomic(path, &json)
}

/// Read a JSON document, falling back to `default` when missing or unreadable
pub fn read_json_or<T: DeserializeOwned>(path: &Path, default: T) -> T {
    if !path.exists() {
        debug!("No file at {}, starting empty", path.display());
        return default;
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(crate::error::DigestError::from)
        .and_then(|content| serde_json::from_str::<T>(&content).map_err(Into::into));

    match parsed {
        Ok(value) => value,
        Err(e) => {
            error!("Error loading JSON from {}: {}", path.display(), e);
            default
        }
    }
}
