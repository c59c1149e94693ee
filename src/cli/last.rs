//! Last command implementation.
//!
//! Replays the request saved in last_request.json. Replaying does not
//! overwrite the saved request.

use std::path::PathBuf;

use clap::Args;

use crate::error::{FpError, Result};
use crate::output::display_path;
use crate::request::{LastRequest, REQUEST_FILENAME};
use crate::types::BatchOutcome;

use super::{merge, metadata, watermark, Context};

/// Run the last merge, watermark or metadata request again
#[derive(Args, Debug)]
pub struct LastArgs {
    /// Run against this directory instead of the saved one
    pub directory: Option<PathBuf>,
}

pub fn run(args: LastArgs, ctx: &Context) -> Result<BatchOutcome> {
    let request = LastRequest::load(&ctx.cwd)?.ok_or_else(|| FpError::Config {
        message: format!("No {} found", REQUEST_FILENAME),
        help: Some("Run merge, watermark or metadata first".to_string()),
    })?;
    let request = match args.directory {
        Some(dir) => request.with_directory(dir),
        None => request,
    };

    ctx.printer
        .info("Replaying", &display_path(request.directory()));
    replay(&request, ctx)
}

fn replay(request: &LastRequest, ctx: &Context) -> Result<BatchOutcome> {
    match request {
        LastRequest::MergeFiles { directory, params } => merge::execute(directory, params, ctx),
        LastRequest::ApplyWatermark { directory, params } => {
            watermark::execute(directory, params, ctx)
        }
        LastRequest::CopyMetadata { directory, params } => {
            metadata::execute(directory, params, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ScanParams;
    use crate::discovery::{Manifest, METADATA_FILENAME};
    use crate::output::Printer;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn context(cwd: PathBuf) -> Context {
        Context {
            manifest: Manifest::default(),
            printer: Printer::new(),
            cwd,
        }
    }

    #[test]
    fn test_last_without_request() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path().to_path_buf());

        let err = run(LastArgs { directory: None }, &ctx).unwrap_err();

        assert!(matches!(err, FpError::Config { .. }));
    }

    #[test]
    fn test_last_replays_metadata() {
        let cwd = tempdir().unwrap();
        let data = tempdir().unwrap();
        fs::write(data.path().join("a.txt"), "hello").unwrap();
        let ctx = context(cwd.path().to_path_buf());
        LastRequest::CopyMetadata {
            directory: data.path().to_path_buf(),
            params: ScanParams::default(),
        }
        .save(cwd.path())
        .unwrap();

        let outcome = run(LastArgs { directory: None }, &ctx).unwrap();

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        assert!(data.path().join(METADATA_FILENAME).exists());
    }

    #[test]
    fn test_last_with_new_directory_keeps_saved_request() {
        let cwd = tempdir().unwrap();
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(second.path().join("b.txt"), "x").unwrap();
        let ctx = context(cwd.path().to_path_buf());
        let saved = LastRequest::CopyMetadata {
            directory: first.path().to_path_buf(),
            params: ScanParams::default(),
        };
        saved.save(cwd.path()).unwrap();

        let outcome = run(
            LastArgs {
                directory: Some(second.path().to_path_buf()),
            },
            &ctx,
        )
        .unwrap();

        assert_eq!(outcome, BatchOutcome::SUCCESS);
        assert!(second.path().join(METADATA_FILENAME).exists());
        assert!(!first.path().join(METADATA_FILENAME).exists());
        assert_eq!(LastRequest::load(cwd.path()).unwrap(), Some(saved));
    }
}
