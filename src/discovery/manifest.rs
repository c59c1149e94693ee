//! Project configuration (fileproc.yaml) parsing.
//!
//! The manifest supplies defaults for every command. Flags given on the
//! command line take precedence over values read here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FpError, Result};
use crate::types::{
    AnchorPosition, Colour, FillPolicy, OutputFormat, DEFAULT_FONT_SIZE, DEFAULT_TRANSPARENCY,
    DEFAULT_WATERMARK_SIZE,
};

/// Project configuration loaded from fileproc.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Watermark defaults.
    pub watermark: WatermarkDefaults,

    /// Merge defaults.
    pub merge: MergeDefaults,

    /// Walk into subdirectories when collecting files.
    pub include_subdirectories: bool,

    /// Skip files this tool produced on earlier runs.
    pub skip_generated: bool,

    /// Patterns to exclude from discovery, matched against the path
    /// relative to the scanned directory.
    pub excludes: Vec<String>,

    /// Log file that the `log` command reads.
    pub log_file: PathBuf,

    /// Worker threads used for watermarking. 1 runs sequentially.
    pub jobs: usize,
}

/// Defaults for the `watermark` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkDefaults {
    pub size: u32,
    pub transparency: u32,
    pub font_size: u32,
    pub soft_edge: bool,
    pub include_date: bool,
    pub position: AnchorPosition,
    pub font: Option<PathBuf>,
}

/// Defaults for the `merge` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeDefaults {
    pub rows: u32,
    pub fill: FillPolicy,
    pub background: Colour,
    pub format: OutputFormat,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("file_processing.log")
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            watermark: WatermarkDefaults::default(),
            merge: MergeDefaults::default(),
            include_subdirectories: true,
            skip_generated: true,
            excludes: vec![],
            log_file: default_log_file(),
            jobs: 1,
        }
    }
}

impl Default for WatermarkDefaults {
    fn default() -> Self {
        Self {
            size: DEFAULT_WATERMARK_SIZE,
            transparency: DEFAULT_TRANSPARENCY as u32,
            font_size: DEFAULT_FONT_SIZE,
            soft_edge: true,
            include_date: false,
            position: AnchorPosition::default(),
            font: None,
        }
    }
}

impl Default for MergeDefaults {
    fn default() -> Self {
        Self {
            rows: 1,
            fill: FillPolicy::default(),
            background: Colour::WHITE,
            format: OutputFormat::default(),
        }
    }
}

impl Manifest {
    /// Load the manifest from a fileproc.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FpError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse the manifest from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| FpError::Config {
            message: format!("Invalid config: {}", e),
            help: Some(
                "Check fileproc.yaml syntax, or regenerate it with `fileproc init`".to_string(),
            ),
        })
    }

    /// Render the manifest as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| FpError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Check if a path (relative to the scanned directory) is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.to_string_lossy().replace('\\', "/");
        self.excludes
            .iter()
            .any(|pattern| Self::matches_pattern(&path, pattern))
    }

    /// Minimal glob matching covering the common exclude shapes.
    ///
    /// `**/dir/*` matches anything under a `dir` component, `*.ext` matches
    /// a suffix, `dir/*` matches the contents of a top-level `dir`, and any
    /// other pattern matches as a substring.
    fn matches_pattern(path: &str, pattern: &str) -> bool {
        if let Some(rest) = pattern.strip_prefix("**/") {
            return match rest.strip_suffix("/*") {
                Some(dir) => in_directory(path, dir),
                None => path.ends_with(rest) || path.contains(rest),
            };
        }

        if let Some(suffix) = pattern.strip_prefix('*') {
            if !suffix.contains('/') {
                return path.ends_with(suffix);
            }
        }

        if let Some(dir) = pattern.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", dir));
        }

        path.contains(pattern)
    }
}

fn in_directory(path: &str, dir: &str) -> bool {
    path.starts_with(&format!("{}/", dir)) || path.contains(&format!("/{}/", dir))
}
