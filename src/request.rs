//! The most recent batch request, persisted so `fileproc last` can replay it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::{MergeParams, ScanParams, WatermarkParams};
use crate::error::{FpError, Result};

/// File the last request is stored in, relative to the working directory.
pub const REQUEST_FILENAME: &str = "last_request.json";

/// A batch command with everything needed to run it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LastRequest {
    MergeFiles {
        directory: PathBuf,
        params: MergeParams,
    },
    ApplyWatermark {
        directory: PathBuf,
        params: WatermarkParams,
    },
    CopyMetadata {
        directory: PathBuf,
        #[serde(default)]
        params: ScanParams,
    },
}

impl LastRequest {
    pub fn directory(&self) -> &Path {
        match self {
            LastRequest::MergeFiles { directory, .. }
            | LastRequest::ApplyWatermark { directory, .. }
            | LastRequest::CopyMetadata { directory, .. } => directory,
        }
    }

    /// Same request against a different directory.
    pub fn with_directory(mut self, dir: PathBuf) -> Self {
        match &mut self {
            LastRequest::MergeFiles { directory, .. }
            | LastRequest::ApplyWatermark { directory, .. }
            | LastRequest::CopyMetadata { directory, .. } => *directory = dir,
        }
        self
    }

    /// Write the request to `dir/last_request.json`, replacing any earlier one.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(REQUEST_FILENAME);
        let json = serde_json::to_string_pretty(self).map_err(|e| FpError::Config {
            message: format!("Failed to serialise request: {}", e),
            help: None,
        })?;
        fs::write(&path, json).map_err(|e| FpError::Io {
            path: path.clone(),
            message: format!("Failed to write request: {}", e),
        })?;
        Ok(path)
    }

    /// Load the saved request from `dir`, or `None` if nothing was saved.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(REQUEST_FILENAME);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| FpError::Io {
            path: path.clone(),
            message: format!("Failed to read request: {}", e),
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| FpError::Config {
                message: format!("Invalid {}: {}", REQUEST_FILENAME, e),
                help: Some("Run a merge, watermark or metadata command to replace it".to_string()),
            })
    }
}
