//! Immutable operation specs for the merge and watermark pipelines.
//!
//! Specs are only constructed through validating builders so that pixel math
//! never sees an out-of-range parameter.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::{FpError, Result};

use super::{AnchorPosition, Colour, FillPolicy};

/// Default watermark size as a percentage of the base image.
pub const DEFAULT_WATERMARK_SIZE: u32 = 10;
/// Default transparency level (0 = invisible, 255 = unchanged).
pub const DEFAULT_TRANSPARENCY: u8 = 128;
/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 20;

/// Encoded output format for merged canvases.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Webp => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Grid shape for a merge: a row count or an explicit matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridShape {
    /// Fixed row count; columns are derived from the image count.
    Rows(u32),
    /// Explicit rows and columns.
    Matrix { rows: u32, cols: u32 },
}

impl GridShape {
    /// Resolve `(rows, cols)` for `count` images.
    pub fn dimensions(self, count: usize) -> Result<(u32, u32)> {
        match self {
            GridShape::Rows(rows) => {
                let cols = (count as u32).div_ceil(rows);
                Ok((rows, cols))
            }
            GridShape::Matrix { rows, cols } => {
                let capacity = rows as usize * cols as usize;
                if capacity < count {
                    return Err(FpError::Config {
                        message: format!(
                            "A {}x{} grid holds {} images but {} were given",
                            rows, cols, capacity, count
                        ),
                        help: Some("Increase the rows or columns of the matrix".to_string()),
                    });
                }
                Ok((rows, cols))
            }
        }
    }
}

/// Configuration for one grid merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSpec {
    pub grid: GridShape,
    pub fill: FillPolicy,
    pub background: Colour,
    pub format: OutputFormat,
}

impl MergeSpec {
    /// Create a merge spec, rejecting zero rows or columns.
    pub fn new(grid: GridShape, fill: FillPolicy) -> Result<Self> {
        let valid = match grid {
            GridShape::Rows(rows) => rows >= 1,
            GridShape::Matrix { rows, cols } => rows >= 1 && cols >= 1,
        };
        if !valid {
            return Err(FpError::Config {
                message: "Rows and columns must be at least 1".to_string(),
                help: None,
            });
        }
        Ok(Self {
            grid,
            fill,
            background: Colour::WHITE,
            format: OutputFormat::Jpeg,
        })
    }

    pub fn with_background(mut self, background: Colour) -> Self {
        // Canvases are opaque; a translucent background would only be
        // flattened again at encode time.
        self.background = Colour { a: 255, ..background };
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// File name of the merged canvas.
    pub fn output_name(&self) -> String {
        format!("merged_image.{}", self.format.extension())
    }
}

/// Immutable watermark configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkSpec {
    pub watermark: Option<PathBuf>,
    pub text: Option<String>,
    pub include_date: bool,
    pub image_position: AnchorPosition,
    pub text_position: AnchorPosition,
    pub size_pct: u32,
    pub transparency: u8,
    pub soft_edge: bool,
    pub font: Option<PathBuf>,
    pub font_size: u32,
}

impl WatermarkSpec {
    pub fn builder() -> WatermarkSpecBuilder {
        WatermarkSpecBuilder::default()
    }

    /// True when there is nothing to draw.
    pub fn is_noop(&self) -> bool {
        self.watermark.is_none() && self.text.is_none() && !self.include_date
    }

    /// Build the string drawn onto the image, if any.
    pub fn display_text(&self, today: NaiveDate) -> Option<String> {
        let date = self
            .include_date
            .then(|| today.format("%Y-%m-%d").to_string());

        match (self.text.as_deref(), date) {
            (Some(text), Some(date)) => Some(format!("{} {}", text, date)),
            (Some(text), None) => Some(text.to_string()),
            (None, Some(date)) => Some(date),
            (None, None) => None,
        }
    }
}

/// Validating builder for [`WatermarkSpec`].
#[derive(Debug, Clone)]
pub struct WatermarkSpecBuilder {
    watermark: Option<PathBuf>,
    text: Option<String>,
    include_date: bool,
    image_position: AnchorPosition,
    text_position: Option<AnchorPosition>,
    size_pct: u32,
    transparency: u32,
    soft_edge: bool,
    font: Option<PathBuf>,
    font_size: u32,
}

impl Default for WatermarkSpecBuilder {
    fn default() -> Self {
        Self {
            watermark: None,
            text: None,
            include_date: false,
            image_position: AnchorPosition::BottomCenter,
            text_position: None,
            size_pct: DEFAULT_WATERMARK_SIZE,
            transparency: DEFAULT_TRANSPARENCY as u32,
            soft_edge: true,
            font: None,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl WatermarkSpecBuilder {
    pub fn watermark(mut self, path: Option<PathBuf>) -> Self {
        self.watermark = path;
        self
    }

    pub fn text(mut self, text: Option<String>) -> Self {
        self.text = text;
        self
    }

    pub fn include_date(mut self, include_date: bool) -> Self {
        self.include_date = include_date;
        self
    }

    pub fn image_position(mut self, position: AnchorPosition) -> Self {
        self.image_position = position;
        self
    }

    /// Text anchor; defaults to the image anchor when unset.
    pub fn text_position(mut self, position: Option<AnchorPosition>) -> Self {
        self.text_position = position;
        self
    }

    pub fn size_pct(mut self, size_pct: u32) -> Self {
        self.size_pct = size_pct;
        self
    }

    pub fn transparency(mut self, transparency: u32) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn soft_edge(mut self, soft_edge: bool) -> Self {
        self.soft_edge = soft_edge;
        self
    }

    pub fn font(mut self, font: Option<PathBuf>) -> Self {
        self.font = font;
        self
    }

    pub fn font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn build(self) -> Result<WatermarkSpec> {
        let transparency = u8::try_from(self.transparency).map_err(|_| FpError::Config {
            message: format!("Transparency must be 0-255, got {}", self.transparency),
            help: Some("0 hides the watermark, 255 keeps its original alpha".to_string()),
        })?;

        if self.font_size == 0 {
            return Err(FpError::config("Font size must be at least 1"));
        }

        let watermark = self
            .watermark
            .map(|p| PathBuf::from(p.to_string_lossy().trim()))
            .filter(|p| !p.as_os_str().is_empty());
        let font = self.font.filter(|p| !p.as_os_str().is_empty());
        let text = self.text.filter(|t| !t.is_empty());

        Ok(WatermarkSpec {
            watermark,
            text,
            include_date: self.include_date,
            image_position: self.image_position,
            text_position: self.text_position.unwrap_or(self.image_position),
            size_pct: self.size_pct,
            transparency,
            soft_edge: self.soft_edge,
            font,
            font_size: self.font_size,
        })
    }
}
