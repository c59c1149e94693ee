//! fileproc - Batch image merging and watermarking
//!
//! A library for combining a directory of images into one grid image,
//! stamping images and PDFs with an image or text watermark, and recording
//! file metadata. The `fileproc` binary wraps it in a CLI.

pub mod batch;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod output;
pub mod pdf;
pub mod render;
pub mod request;
pub mod types;

pub use batch::{run_merge, run_metadata, run_watermark, watermark_file, FileResult};
pub use discovery::{load_manifest, scan_directory, FileKind, FileMetadata, Manifest};
pub use error::{FpError, Result};
pub use pdf::{LopdfBackend, PdfBackend};
pub use render::{compose, merge_images, GridLayout, Mark, WatermarkAssets};
pub use request::LastRequest;
pub use types::{
    AnchorPosition, BatchOutcome, Colour, FillPolicy, GridShape, MergeSpec, OutputFormat,
    WatermarkSpec,
};
