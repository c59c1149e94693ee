//! Text rasterization onto RGBA layers.
//!
//! A [`Typeface`] is either a font file loaded by the user or the embedded
//! DejaVu Sans Mono. Both are drawn through `ab_glyph` and the same stencil.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use ab_glyph::{point, Font, FontRef, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use tracing::warn;

use crate::error::{FpError, Result};

use super::alpha::stamp_pixel;

/// Fill used for watermark text: white at half opacity.
pub const TEXT_FILL: Rgba<u8> = Rgba([255, 255, 255, 128]);

/// DejaVu Sans Mono (Bitstream Vera license, see fonts/LICENSE-DejaVu).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

static BUILTIN_FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();

/// The embedded font, parsed on first use.
fn builtin_font() -> Option<&'static FontRef<'static>> {
    BUILTIN_FONT
        .get_or_init(|| FontRef::try_from_slice(EMBEDDED_FONT_DATA).ok())
        .as_ref()
}

/// Font used to draw watermark text.
pub enum Typeface {
    /// The embedded monospace font.
    Builtin,
    /// A TrueType/OpenType font read from disk.
    Outline(FontVec),
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typeface::Builtin => f.write_str("Typeface::Builtin"),
            Typeface::Outline(_) => f.write_str("Typeface::Outline"),
        }
    }
}

impl Typeface {
    /// Load a font file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| FpError::MissingResource {
            path: path.to_path_buf(),
            message: format!("Failed to read font: {}", e),
            help: None,
        })?;
        let font = FontVec::try_from_vec(data).map_err(|e| FpError::MissingResource {
            path: path.to_path_buf(),
            message: format!("Invalid font: {}", e),
            help: Some("Provide a TrueType (.ttf) or OpenType (.otf) font".to_string()),
        })?;
        Ok(Typeface::Outline(font))
    }

    /// Load the configured font, falling back to the built-in one.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        match path {
            None => Typeface::Builtin,
            Some(path) => Self::from_file(path).unwrap_or_else(|e| {
                warn!(font = %path.display(), error = %e, "Falling back to built-in font");
                Typeface::Builtin
            }),
        }
    }

    /// Draw `text` with its top-left corner at `origin`.
    ///
    /// `size` is the font size in pixels. Glyphs are clipped to the canvas.
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        origin: (i64, i64),
        size: u32,
        fill: Rgba<u8>,
    ) {
        match self {
            Typeface::Builtin => match builtin_font() {
                Some(font) => draw_glyphs(font, canvas, text, origin, size, fill),
                None => warn!("Embedded font could not be parsed, text skipped"),
            },
            Typeface::Outline(font) => draw_glyphs(font, canvas, text, origin, size, fill),
        }
    }
}

fn draw_glyphs<F: Font>(
    font: &F,
    canvas: &mut RgbaImage,
    text: &str,
    origin: (i64, i64),
    size: u32,
    fill: Rgba<u8>,
) {
    let scale = PxScale::from(size as f32);
    let scaled = font.as_scaled(scale);
    let baseline = origin.1 as f32 + scaled.ascent();

    let mut cursor_x = origin.0 as f32;
    let mut prev = None;

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, id);
        }

        let glyph = id.with_scale_and_position(scale, point(cursor_x, baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                let m = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                stamp_pixel(canvas, x, y, fill, m);
            });
        }

        cursor_x += scaled.h_advance(id);
        prev = Some(id);
    }
}
