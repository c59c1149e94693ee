//! Decoding and encoding of raster files.
//!
//! Output format follows the file extension. Formats without an alpha
//! channel are flattened over white before encoding.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::error::{FpError, Result};
use crate::types::Colour;

use super::alpha::flatten;

/// Prefix of watermarked output files.
pub const WATERMARK_PREFIX: &str = "watermarked_";

/// Decode an image file.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| FpError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Whether `format` can store an alpha channel.
pub fn supports_alpha(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png
            | ImageFormat::WebP
            | ImageFormat::Tiff
            | ImageFormat::Gif
            | ImageFormat::Tga
            | ImageFormat::Ico
    )
}

/// Path of the watermarked copy of `input`, next to the original.
pub fn watermarked_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}", WATERMARK_PREFIX, name))
}

/// Write an RGBA image, choosing the format from the extension.
pub fn save_rgba(image: &RgbaImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|e| FpError::Encode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let encoded = if supports_alpha(format) {
        DynamicImage::ImageRgba8(image.clone())
    } else {
        DynamicImage::ImageRgb8(flatten(image, Colour::WHITE))
    };

    encoded
        .save_with_format(path, format)
        .map_err(|e| FpError::Encode {
            path: path.to_path_buf(),
            message: format!("Failed to write image: {}", e),
        })
}

/// Write an opaque image in the given format.
pub fn save_rgb(image: &RgbImage, path: &Path, format: ImageFormat) -> Result<()> {
    image
        .save_with_format(path, format)
        .map_err(|e| FpError::Encode {
            path: path.to_path_buf(),
            message: format!("Failed to write image: {}", e),
        })
}
