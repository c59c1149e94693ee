//! Merge command implementation.
//!
//! Combines the images in a directory into one grid image (and the PDFs
//! into one document).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::batch::run_merge;
use crate::discovery::Manifest;
use crate::error::Result;
use crate::pdf::LopdfBackend;
use crate::request::LastRequest;
use crate::types::{BatchOutcome, Colour, FillPolicy, GridShape, MergeSpec, OutputFormat};

use super::{Context, ScanParams};

/// Merge the images in a directory into one grid image
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Directory containing the images
    pub directory: PathBuf,

    #[command(flatten)]
    pub params: MergeParams,
}

/// Explicit grid dimensions, written `ROWSxCOLS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: u32,
    pub cols: u32,
}

impl FromStr for Matrix {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (rows, cols) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected ROWSxCOLS, got '{}'", s))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| format!("'{}' is not a whole number", part))
        };
        Ok(Matrix {
            rows: parse(rows)?,
            cols: parse(cols)?,
        })
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Merge options. Unset values fall back to fileproc.yaml.
#[derive(Args, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeParams {
    /// Number of rows; columns follow from the image count
    #[arg(short, long, conflicts_with = "matrix")]
    pub rows: Option<u32>,

    /// Explicit grid, e.g. 2x3
    #[arg(long)]
    pub matrix: Option<Matrix>,

    /// How to complete a short last row
    #[arg(long, value_enum)]
    pub fill: Option<FillPolicy>,

    /// Canvas background colour (name or hex)
    #[arg(long)]
    pub background: Option<Colour>,

    /// Output image format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    #[command(flatten)]
    pub scan: ScanParams,
}

impl MergeParams {
    /// Resolve against the manifest defaults.
    pub fn to_spec(&self, manifest: &Manifest) -> Result<MergeSpec> {
        let defaults = &manifest.merge;
        let grid = match (self.matrix, self.rows) {
            (Some(m), _) => GridShape::Matrix {
                rows: m.rows,
                cols: m.cols,
            },
            (None, rows) => GridShape::Rows(rows.unwrap_or(defaults.rows)),
        };

        Ok(MergeSpec::new(grid, self.fill.unwrap_or(defaults.fill))?
            .with_background(self.background.unwrap_or(defaults.background))
            .with_format(self.format.unwrap_or(defaults.format)))
    }
}

/// Run a merge without recording it.
pub fn execute(directory: &Path, params: &MergeParams, ctx: &Context) -> Result<BatchOutcome> {
    let spec = params.to_spec(&ctx.manifest)?;
    let files = ctx.scan(directory, &params.scan)?;

    ctx.printer
        .status("Merging", &format!("into {}", spec.output_name()));
    let outcome = run_merge(directory, &files, &spec, &LopdfBackend);
    ctx.report(outcome, directory);
    Ok(outcome)
}

pub fn run(args: MergeArgs, ctx: &Context) -> Result<BatchOutcome> {
    ctx.remember(&LastRequest::MergeFiles {
        directory: args.directory.clone(),
        params: args.params.clone(),
    });
    execute(&args.directory, &args.params, ctx)
}
