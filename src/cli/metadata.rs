//! Metadata command implementation.

use std::path::{Path, PathBuf};

use clap::Args;

use crate::batch::run_metadata;
use crate::error::Result;
use crate::request::LastRequest;
use crate::types::BatchOutcome;

use super::{Context, ScanParams};

/// Write metadata.json describing every file in a directory
#[derive(Args, Debug)]
pub struct MetadataArgs {
    /// Directory to describe
    pub directory: PathBuf,

    #[command(flatten)]
    pub scan: ScanParams,
}

/// Collect metadata without recording the request.
pub fn execute(directory: &Path, scan: &ScanParams, ctx: &Context) -> Result<BatchOutcome> {
    let files = ctx.scan(directory, scan)?;
    let outcome = run_metadata(directory, &files);
    ctx.report(outcome, directory);
    Ok(outcome)
}

pub fn run(args: MetadataArgs, ctx: &Context) -> Result<BatchOutcome> {
    ctx.remember(&LastRequest::CopyMetadata {
        directory: args.directory.clone(),
        params: args.scan.clone(),
    });
    execute(&args.directory, &args.scan, ctx)
}
