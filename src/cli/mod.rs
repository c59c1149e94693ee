pub mod completions;
pub mod init;
pub mod last;
pub mod log;
pub mod merge;
pub mod metadata;
pub mod watermark;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::discovery::{scan_directory, Manifest};
use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::request::LastRequest;
use crate::types::BatchOutcome;

pub use merge::{Matrix, MergeParams};
pub use watermark::WatermarkParams;

/// fileproc - Batch image merging and watermarking
#[derive(Parser, Debug)]
#[command(name = "fileproc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ./fileproc.yaml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug detail to the console and log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge the images in a directory into one grid image
    Merge(merge::MergeArgs),

    /// Watermark every image (and PDF) in a directory
    Watermark(watermark::WatermarkArgs),

    /// Write metadata.json describing every file in a directory
    Metadata(metadata::MetadataArgs),

    /// Run the last merge, watermark or metadata request again
    Last(last::LastArgs),

    /// Show the processing log
    Log(log::LogArgs),

    /// Write a default fileproc.yaml
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Discovery options shared by the batch commands.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Only process files directly inside the directory
    #[arg(long)]
    pub top_level: bool,
}

/// State shared by every command.
pub struct Context {
    pub manifest: Manifest,
    pub printer: Printer,
    /// Where last_request.json lives.
    pub cwd: PathBuf,
}

impl Context {
    /// Collect the files a batch command operates on.
    pub fn scan(&self, directory: &Path, params: &ScanParams) -> Result<Vec<PathBuf>> {
        let mut manifest = self.manifest.clone();
        if params.top_level {
            manifest.include_subdirectories = false;
        }

        let files = scan_directory(directory, &manifest)?;
        self.printer.status(
            "Scanning",
            &format!(
                "{} ({})",
                display_path(directory),
                plural(files.len(), "file", "files")
            ),
        );
        Ok(files)
    }

    /// Persist `request` for `fileproc last`. Failure only warns.
    pub fn remember(&self, request: &LastRequest) {
        if let Err(e) = request.save(&self.cwd) {
            warn!(error = %e, "Could not save last request");
        }
    }

    /// Print the one-line summary for a finished batch.
    pub fn report(&self, outcome: BatchOutcome, directory: &Path) {
        let dir = display_path(directory);
        match (outcome.success, outcome.partial) {
            (true, _) => self.printer.outcome(
                "✅",
                &format!("Done successfully! Check the processed files in {}", dir),
            ),
            (false, true) => self.printer.outcome(
                "⚠️",
                &format!(
                    "Operation partially successful. Check the processed files in {}",
                    dir
                ),
            ),
            (false, false) => self.printer.outcome(
                "❌",
                "Operation failed. Run `fileproc log` to see the details.",
            ),
        }
    }
}

/// Process exit code for a batch outcome.
pub fn exit_code(outcome: BatchOutcome) -> i32 {
    match (outcome.success, outcome.partial) {
        (true, _) => 0,
        (false, false) => 1,
        (false, true) => 2,
    }
}
