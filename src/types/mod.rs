//! Core domain types for fileproc.
//!
//! - `Colour` - RGBA colour values for backgrounds
//! - `AnchorPosition` - the nine named placements
//! - `FillPolicy` - ragged-row completion for merges
//! - `MergeSpec` / `WatermarkSpec` - validated operation configuration
//! - `BatchOutcome` - tri-state batch result

mod anchor;
mod colour;
mod fill;
mod outcome;
mod spec;

pub use anchor::{AnchorPosition, Horizontal, Vertical};
pub use colour::Colour;
pub use fill::FillPolicy;
pub use outcome::{BatchOutcome, BatchTally};
pub use spec::{
    GridShape, MergeSpec, OutputFormat, WatermarkSpec, WatermarkSpecBuilder, DEFAULT_FONT_SIZE,
    DEFAULT_TRANSPARENCY, DEFAULT_WATERMARK_SIZE,
};
