use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for fileproc operations
#[derive(Error, Diagnostic, Debug)]
pub enum FpError {
    #[error("IO error: {0}")]
    #[diagnostic(code(fileproc::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(fileproc::io))]
    Io { path: PathBuf, message: String },

    #[error("No input: {message}")]
    #[diagnostic(code(fileproc::no_input))]
    NoInput { message: String },

    #[error("Could not decode {path}: {message}")]
    #[diagnostic(code(fileproc::decode))]
    Decode { path: PathBuf, message: String },

    #[error("Could not encode {path}: {message}")]
    #[diagnostic(code(fileproc::encode))]
    Encode { path: PathBuf, message: String },

    #[error("Missing resource {path}: {message}")]
    #[diagnostic(code(fileproc::missing_resource))]
    MissingResource {
        path: PathBuf,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(fileproc::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("PDF error with {path}: {message}")]
    #[diagnostic(code(fileproc::pdf))]
    Pdf { path: PathBuf, message: String },
}

impl FpError {
    /// Shorthand for a configuration error without help text.
    pub fn config(message: impl Into<String>) -> Self {
        FpError::Config {
            message: message.into(),
            help: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FpError>;
