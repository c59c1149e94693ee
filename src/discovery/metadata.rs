//! File metadata records.
//!
//! Collected for the `metadata` command and attached to per-file error logs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{FpError, Result};

/// Name of the metadata file written into the scanned directory.
pub const METADATA_FILENAME: &str = "metadata.json";

/// Size and timestamps of one file.
///
/// Times are seconds since the Unix epoch. A field is `None` when the
/// platform does not report it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size: u64,
    pub modified_time: Option<f64>,
    pub created_time: Option<f64>,
}

fn epoch_seconds(time: std::io::Result<SystemTime>) -> Option<f64> {
    let time = time.ok()?;
    Some(match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    })
}

impl FileMetadata {
    /// Read metadata for `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| FpError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read metadata: {}", e),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            size: meta.len(),
            modified_time: epoch_seconds(meta.modified()),
            created_time: epoch_seconds(meta.created()),
        })
    }

    /// Compact JSON form used in log fields. Empty object if unreadable.
    pub fn describe(path: &Path) -> String {
        Self::read(path)
            .ok()
            .and_then(|m| serde_json::to_string(&m).ok())
            .unwrap_or_else(|| "{}".to_string())
    }
}

/// Write `records` as a JSON array to `metadata.json` in `dir`.
pub fn write_metadata_json(dir: &Path, records: &[FileMetadata]) -> Result<PathBuf> {
    let output = dir.join(METADATA_FILENAME);
    let json = serde_json::to_string_pretty(records).map_err(|e| FpError::Encode {
        path: output.clone(),
        message: e.to_string(),
    })?;
    fs::write(&output, json).map_err(|e| FpError::Io {
        path: output.clone(),
        message: format!("Failed to write metadata: {}", e),
    })?;
    Ok(output)
}
