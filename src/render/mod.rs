//! Pixel pipelines for fileproc.
//!
//! This module handles merging images into grids and compositing
//! watermark overlays, plus the decode/encode helpers both share.

mod alpha;
mod encode;
mod grid;
mod text;
mod watermark;

pub use alpha::{
    adjust_transparency, alpha_composite, apply_soft_edge, flatten, over, paste_masked,
    soft_edge_alpha, soft_edge_mask, SOFT_EDGE_STEP,
};
pub use encode::{open_image, save_rgb, save_rgba, supports_alpha, watermarked_path, WATERMARK_PREFIX};
pub use grid::{merge_images, GridLayout, RowFill};
pub use text::{Typeface, TEXT_FILL};
pub use watermark::{compose, fit_within, scale_mark, Mark, WatermarkAssets};
