//! File system scanner for batch inputs.
//!
//! Walks a directory (recursively unless disabled), drops excluded paths
//! and the tool's own outputs, and classifies each file by extension.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{FpError, Result};
use crate::render::WATERMARK_PREFIX;

use super::manifest::Manifest;
use super::metadata::METADATA_FILENAME;

/// Extensions decoded as raster images (case-insensitive).
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Name of the merged PDF written by the merge command.
pub const MERGED_PDF_FILENAME: &str = "merged_file.pdf";

/// Stem of the merged image written by the merge command.
pub const MERGED_IMAGE_STEM: &str = "merged_image";

/// How the batch runner treats a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Image,
    Pdf,
    Unsupported,
}

/// Classify a file by its extension.
pub fn classify(path: &Path) -> FileKind {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return FileKind::Unsupported;
    };
    let ext = ext.to_ascii_lowercase();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Image
    } else if ext == "pdf" {
        FileKind::Pdf
    } else {
        FileKind::Unsupported
    }
}

/// Whether `path` names a file this tool writes.
pub fn is_generated(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    name.starts_with(WATERMARK_PREFIX)
        || name == MERGED_PDF_FILENAME
        || name == METADATA_FILENAME
        || Path::new(name)
            .file_stem()
            .is_some_and(|stem| stem == MERGED_IMAGE_STEM)
}

/// Collect the files under `root`, sorted lexicographically by path.
pub fn scan_directory(root: &Path, manifest: &Manifest) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(FpError::Io {
            path: root.to_path_buf(),
            message: "Not a directory".to_string(),
        });
    }

    let max_depth = if manifest.include_subdirectories {
        usize::MAX
    } else {
        1
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).max_depth(max_depth) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if manifest.is_excluded(relative) {
            debug!(path = %path.display(), "Excluded");
            continue;
        }
        if manifest.skip_generated && is_generated(path) {
            debug!(path = %path.display(), "Skipping generated file");
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}
