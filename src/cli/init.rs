//! Init command implementation.
//!
//! Writes a `fileproc.yaml` holding every default, ready to edit.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::discovery::{Manifest, MANIFEST_FILENAME};
use crate::error::{FpError, Result};
use crate::output::{display_path, Printer};

/// Write a default fileproc.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write into (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing fileproc.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(FpError::Config {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    let yaml = Manifest::default().to_yaml()?;
    fs::write(&manifest_path, yaml).map_err(|e| FpError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    printer.success("Created", &display_path(&manifest_path));
    Ok(())
}
