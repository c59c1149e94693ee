//! Structured logging to the console and the processing log file.
//!
//! Console output stays quiet unless `-v` is given; the log file records
//! every run at `info` (or `debug` with `-v`) so `fileproc log` can show
//! what went wrong after the fact. `RUST_LOG` overrides both levels.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{FpError, Result};

/// Lines shown by `fileproc log` without `--full`.
pub const TAIL_LINES: usize = 10;

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber.
///
/// If the log file cannot be opened, logging continues on the console
/// only. Calling this twice is harmless.
pub fn init(log_file: &Path, verbose: bool) {
    let console_level = if verbose { "debug" } else { "warn" };
    let file_level = if verbose { "debug" } else { "info" };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter(console_level));

    let (file_layer, open_error) = match open_log(log_file) {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(filter(file_level)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    if tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed");
    }

    if let Some(e) = open_error {
        tracing::warn!(path = %log_file.display(), error = %e, "Could not open log file");
    }
}

/// Read the last `count` lines of the log, or all of it when `count` is
/// `None`.
pub fn read_log(path: &Path, count: Option<usize>) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| FpError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read log: {}", e),
    })?;

    let lines: Vec<String> = content.lines().map(str::to_string).collect();
    Ok(match count {
        Some(n) => lines[lines.len().saturating_sub(n)..].to_vec(),
        None => lines,
    })
}
