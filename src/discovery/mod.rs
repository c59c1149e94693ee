//! Input discovery and project configuration.
//!
//! This module finds the files a batch operates on and loads the
//! `fileproc.yaml` manifest that supplies command defaults.
//!
//! # Example
//!
//! ```ignore
//! use fileproc::discovery::{load_manifest, scan_directory};
//!
//! let loaded = load_manifest(None, Path::new("."))?;
//! let files = scan_directory(Path::new("./photos"), &loaded.manifest)?;
//! ```

mod manifest;
mod metadata;
mod scanner;

use std::path::{Path, PathBuf};

use crate::error::{FpError, Result};

pub use manifest::{Manifest, MergeDefaults, WatermarkDefaults};
pub use metadata::{write_metadata_json, FileMetadata, METADATA_FILENAME};
pub use scanner::{
    classify, is_generated, scan_directory, FileKind, IMAGE_EXTENSIONS, MERGED_IMAGE_STEM,
    MERGED_PDF_FILENAME,
};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "fileproc.yaml";

/// A manifest together with where it came from.
#[derive(Debug)]
pub struct LoadedManifest {
    pub manifest: Manifest,

    /// The file the manifest was read from, if any.
    pub source: Option<PathBuf>,
}

/// Load the project manifest.
///
/// An explicit path must exist. Otherwise `fileproc.yaml` in `cwd` is used
/// when present, and built-in defaults when not.
pub fn load_manifest(explicit: Option<&Path>, cwd: &Path) -> Result<LoadedManifest> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(FpError::Config {
                message: format!("Config file not found: {}", path.display()),
                help: Some("Run `fileproc init` to create one".to_string()),
            });
        }
        return Ok(LoadedManifest {
            manifest: Manifest::load(path)?,
            source: Some(path.to_path_buf()),
        });
    }

    let path = cwd.join(MANIFEST_FILENAME);
    if path.is_file() {
        Ok(LoadedManifest {
            manifest: Manifest::load(&path)?,
            source: Some(path),
        })
    } else {
        Ok(LoadedManifest {
            manifest: Manifest::default(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults_without_file() {
        let dir = tempdir().unwrap();

        let loaded = load_manifest(None, dir.path()).unwrap();

        assert!(loaded.source.is_none());
        assert_eq!(loaded.manifest, Manifest::default());
    }

    #[test]
    fn test_load_from_working_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("fileproc.yaml"), "jobs: 3\n").unwrap();

        let loaded = load_manifest(None, dir.path()).unwrap();

        assert_eq!(loaded.source, Some(dir.path().join("fileproc.yaml")));
        assert_eq!(loaded.manifest.jobs, 3);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "merge:\n  rows: 2\n").unwrap();

        let loaded = load_manifest(Some(&path), Path::new("/nonexistent")).unwrap();

        assert_eq!(loaded.manifest.merge.rows, 2);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let result = load_manifest(Some(Path::new("/nonexistent/fileproc.yaml")), Path::new("."));
        assert!(matches!(result, Err(FpError::Config { .. })));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("fileproc.yaml"), "jobs: [oops\n").unwrap();

        let result = load_manifest(None, dir.path());
        assert!(matches!(result, Err(FpError::Config { .. })));
    }
}
