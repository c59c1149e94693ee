//! Grid merge engine.
//!
//! Lays images out row-major in uniform cells sized to the largest input,
//! then completes a short final row according to the fill policy. Layout
//! is computed separately from pixel assembly so it can be inspected.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use tracing::debug;

use crate::error::{FpError, Result};
use crate::types::{FillPolicy, MergeSpec};

use super::alpha::flatten;

/// How the empty cells of the last row are filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFill {
    /// The last image, resized to `width x height`, pasted at `(x, y)`.
    Stretch { x: u32, y: u32, width: u32, height: u32 },
    /// The last image pasted unscaled at each position.
    Repeat(Vec<(u32, u32)>),
}

/// Computed geometry of a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub cols: u32,
    pub cell: (u32, u32),
    pub canvas: (u32, u32),
    /// Top-left corner of each input image, in input order.
    pub placements: Vec<(u32, u32)>,
    pub fill: Option<RowFill>,
}

impl GridLayout {
    /// Compute the layout for images of the given sizes.
    pub fn compute(sizes: &[(u32, u32)], spec: &MergeSpec) -> Result<Self> {
        let Some(&last) = sizes.last() else {
            return Err(FpError::NoInput {
                message: "No images to merge".to_string(),
            });
        };

        let count = sizes.len();
        let (rows, cols) = spec.grid.dimensions(count)?;
        let cell_w = sizes.iter().map(|s| s.0).max().unwrap_or(0);
        let cell_h = sizes.iter().map(|s| s.1).max().unwrap_or(0);

        let canvas = cell_w
            .checked_mul(cols)
            .zip(cell_h.checked_mul(rows))
            .ok_or_else(|| FpError::Config {
                message: format!(
                    "A {}x{} grid of {}x{} cells is too large",
                    rows, cols, cell_w, cell_h
                ),
                help: None,
            })?;

        let placements = (0..count as u32)
            .map(|i| ((i % cols) * cell_w, (i / cols) * cell_h))
            .collect();

        let remaining = count as u32 % cols;
        let fill = if remaining == 0 {
            None
        } else {
            let y = ((count as u32 - 1) / cols) * cell_h;
            let x = remaining * cell_w;
            match spec.fill {
                FillPolicy::Stretch => Some(RowFill::Stretch {
                    x,
                    y,
                    width: canvas.0 - x,
                    height: last.1,
                }),
                FillPolicy::Repeat => Some(RowFill::Repeat(
                    (0..cols - remaining)
                        .map(|k| (x + k * cell_w, y))
                        .collect(),
                )),
                FillPolicy::Leave => None,
            }
        };

        Ok(Self {
            rows,
            cols,
            cell: (cell_w, cell_h),
            canvas,
            placements,
            fill,
        })
    }
}

/// Merge decoded images into a single opaque canvas.
///
/// Alpha is flattened onto the background colour before pasting.
pub fn merge_images(images: &[DynamicImage], spec: &MergeSpec) -> Result<RgbImage> {
    let sizes: Vec<(u32, u32)> = images.iter().map(|i| (i.width(), i.height())).collect();
    let layout = GridLayout::compute(&sizes, spec)?;
    debug!(
        rows = layout.rows,
        cols = layout.cols,
        width = layout.canvas.0,
        height = layout.canvas.1,
        "Merge layout"
    );

    let (width, height) = layout.canvas;
    let mut canvas = RgbImage::from_pixel(width, height, spec.background.to_rgb());

    let flattened: Vec<RgbImage> = images
        .iter()
        .map(|i| flatten(&i.to_rgba8(), spec.background))
        .collect();

    for (image, &(x, y)) in flattened.iter().zip(&layout.placements) {
        imageops::replace(&mut canvas, image, x as i64, y as i64);
    }

    // `compute` rejects empty input, so a last image exists.
    if let Some(last) = flattened.last() {
        match &layout.fill {
            Some(RowFill::Stretch { x, y, width, height }) => {
                let stretched = imageops::resize(last, *width, *height, FilterType::CatmullRom);
                imageops::replace(&mut canvas, &stretched, *x as i64, *y as i64);
            }
            Some(RowFill::Repeat(positions)) => {
                for &(x, y) in positions {
                    imageops::replace(&mut canvas, last, x as i64, y as i64);
                }
            }
            None => {}
        }
    }

    Ok(canvas)
}
