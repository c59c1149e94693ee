//! Watermark compositor.
//!
//! Builds a transparent overlay the size of the base image, stencils the
//! scaled watermark image and the text run onto it, then composites the
//! overlay over the base. The base image is never modified.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use crate::error::{FpError, Result};
use crate::types::WatermarkSpec;

use super::alpha::{adjust_transparency, alpha_composite, apply_soft_edge, paste_masked};
use super::encode::open_image;
use super::text::{Typeface, TEXT_FILL};

/// Initial overlay pixel: white with zero alpha.
const CLEAR: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// The watermark source, decoded once per batch.
#[derive(Debug)]
pub enum Mark {
    /// No watermark image configured.
    None,
    /// A decoded raster watermark.
    Raster(RgbaImage),
    /// A PDF watermark; only applicable to PDF inputs.
    Pdf(PathBuf),
}

/// Decoded resources shared by every file in a watermark batch.
#[derive(Debug)]
pub struct WatermarkAssets {
    pub mark: Mark,
    pub typeface: Typeface,
}

impl WatermarkAssets {
    /// Decode the watermark image and load the font named by `spec`.
    pub fn load(spec: &WatermarkSpec) -> Result<Self> {
        let mark = match &spec.watermark {
            None => Mark::None,
            Some(path) => {
                if !path.is_file() {
                    return Err(FpError::MissingResource {
                        path: path.clone(),
                        message: "Watermark file not found".to_string(),
                        help: Some("Check the watermark path or leave it blank for text only".to_string()),
                    });
                }
                if is_pdf(path) {
                    Mark::Pdf(path.clone())
                } else {
                    Mark::Raster(open_image(path)?.to_rgba8())
                }
            }
        };

        let needs_text = spec.text.is_some() || spec.include_date;
        let typeface = if needs_text {
            Typeface::load_or_builtin(spec.font.as_deref())
        } else {
            Typeface::Builtin
        };

        Ok(Self { mark, typeface })
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Size of `size` scaled down to fit inside `bounds`, preserving aspect.
///
/// Never upscales. Each side is rounded to whichever neighbouring integer
/// best preserves the aspect ratio, with a minimum of one pixel. Returns
/// `None` when `bounds` has a zero side.
pub fn fit_within(size: (u32, u32), bounds: (u32, u32)) -> Option<(u32, u32)> {
    let (w, h) = size;
    let (bw, bh) = bounds;
    if bw == 0 || bh == 0 || w == 0 || h == 0 {
        return None;
    }
    if bw >= w && bh >= h {
        return Some(size);
    }

    let aspect = w as f64 / h as f64;
    let round_aspect = |n: f64, key: &dyn Fn(f64) -> f64| -> u32 {
        let (lo, hi) = (n.floor(), n.ceil());
        let best = if key(hi) < key(lo) { hi } else { lo };
        (best as u32).max(1)
    };

    let (bw_f, bh_f) = (bw as f64, bh as f64);
    if bw_f / bh_f >= aspect {
        let x = round_aspect(bh_f * aspect, &|n| (aspect - n / bh_f).abs());
        Some((x, bh))
    } else {
        let y = round_aspect(bw_f / aspect, &|n| {
            if n == 0.0 {
                0.0
            } else {
                (aspect - bw_f / n).abs()
            }
        });
        Some((bw, y))
    }
}

/// Scale the watermark into the box `size_pct` percent of the base size.
pub fn scale_mark(mark: &RgbaImage, base: (u32, u32), size_pct: u32) -> Option<RgbaImage> {
    let bounds = (
        (base.0 as u64 * size_pct as u64 / 100).min(u32::MAX as u64) as u32,
        (base.1 as u64 * size_pct as u64 / 100).min(u32::MAX as u64) as u32,
    );
    let (w, h) = fit_within(mark.dimensions(), bounds)?;
    if (w, h) == mark.dimensions() {
        return Some(mark.clone());
    }
    Some(imageops::resize(mark, w, h, FilterType::CatmullRom))
}

/// Produce the watermarked version of `base`.
pub fn compose(
    base: &DynamicImage,
    spec: &WatermarkSpec,
    assets: &WatermarkAssets,
    today: NaiveDate,
) -> Result<RgbaImage> {
    let base = base.to_rgba8();
    if spec.is_noop() {
        return Ok(base);
    }

    let size = base.dimensions();
    let mut overlay = RgbaImage::from_pixel(size.0, size.1, CLEAR);

    match &assets.mark {
        Mark::None => {}
        Mark::Raster(mark) => match scale_mark(mark, size, spec.size_pct) {
            Some(mut scaled) => {
                adjust_transparency(&mut scaled, spec.transparency);
                if spec.soft_edge {
                    apply_soft_edge(&mut scaled);
                }
                let (x, y) = spec.image_position.offset(size, scaled.dimensions());
                debug!(
                    width = scaled.width(),
                    height = scaled.height(),
                    x,
                    y,
                    "Placing watermark image"
                );
                paste_masked(&mut overlay, &scaled, x, y);
            }
            None => debug!(size_pct = spec.size_pct, "Watermark box is empty, skipping image"),
        },
        Mark::Pdf(path) => {
            return Err(FpError::MissingResource {
                path: path.clone(),
                message: "A PDF watermark cannot be applied to a raster image".to_string(),
                help: Some("Use a PNG, JPEG or WebP watermark for images".to_string()),
            });
        }
    }

    if let Some(text) = spec.display_text(today) {
        let origin = spec.text_position.text_origin(size);
        debug!(text = %text, x = origin.0, y = origin.1, "Drawing watermark text");
        assets
            .typeface
            .draw(&mut overlay, &text, origin, spec.font_size, TEXT_FILL);
    }

    Ok(alpha_composite(&base, &overlay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnchorPosition;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    fn builtin(mark: Mark) -> WatermarkAssets {
        WatermarkAssets {
            mark,
            typeface: Typeface::Builtin,
        }
    }

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([10, 20, 30])
            } else {
                image::Rgb([200, 150, 100])
            }
        }))
    }

    #[test]
    fn test_fit_within_never_upscales() {
        assert_eq!(fit_within((10, 10), (100, 100)), Some((10, 10)));
    }

    #[test]
    fn test_fit_within_preserves_aspect() {
        assert_eq!(fit_within((200, 100), (50, 50)), Some((50, 25)));
        assert_eq!(fit_within((100, 200), (50, 50)), Some((25, 50)));
        assert_eq!(fit_within((300, 100), (100, 10)), Some((30, 10)));
    }

    #[test]
    fn test_fit_within_minimum_one_pixel() {
        assert_eq!(fit_within((1000, 1), (10, 10)), Some((10, 1)));
    }

    #[test]
    fn test_fit_within_empty_box() {
        assert_eq!(fit_within((10, 10), (0, 5)), None);
    }

    #[test]
    fn test_scale_mark_uses_percentage_box() {
        let mark = RgbaImage::new(400, 200);
        let scaled = scale_mark(&mark, (1000, 500), 10).unwrap();
        assert_eq!(scaled.dimensions(), (100, 50));
        assert!(scale_mark(&mark, (1000, 500), 0).is_none());
    }

    #[test]
    fn test_noop_spec_is_pixel_identical() {
        let base = checker(17, 9);
        let spec = WatermarkSpec::builder().build().unwrap();
        let out = compose(&base, &spec, &builtin(Mark::None), today()).unwrap();
        assert_eq!(out, base.to_rgba8());
    }

    #[test]
    fn test_opaque_mark_bottom_right() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255])));
        let mark = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let spec = WatermarkSpec::builder()
            .watermark(Some(PathBuf::from("mark.png")))
            .image_position(AnchorPosition::BottomRight)
            .size_pct(100)
            .transparency(255)
            .soft_edge(false)
            .build()
            .unwrap();

        let out = compose(&base, &spec, &builtin(Mark::Raster(mark)), today()).unwrap();
        assert_eq!(out.get_pixel(95, 95).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(90, 90).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(89, 95).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_zero_transparency_leaves_base_unchanged() {
        let base = checker(64, 64);
        let mark = RgbaImage::from_pixel(32, 32, Rgba([255, 0, 0, 255]));
        let spec = WatermarkSpec::builder()
            .watermark(Some(PathBuf::from("mark.png")))
            .size_pct(50)
            .transparency(0)
            .build()
            .unwrap();

        let out = compose(&base, &spec, &builtin(Mark::Raster(mark)), today()).unwrap();
        assert_eq!(out, base.to_rgba8());
    }

    #[test]
    fn test_soft_edge_keeps_border_clear() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([0, 0, 0, 255])));
        let mark = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
        let spec = WatermarkSpec::builder()
            .watermark(Some(PathBuf::from("mark.png")))
            .image_position(AnchorPosition::TopLeft)
            .size_pct(100)
            .transparency(255)
            .soft_edge(true)
            .build()
            .unwrap();

        let out = compose(&base, &spec, &builtin(Mark::Raster(mark)), today()).unwrap();
        // Border of the watermark is fully faded.
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(39, 20).0, [0, 0, 0, 255]);
        // Interior is lightened but not fully white.
        let centre = out.get_pixel(20, 20);
        assert!(centre[0] > 0 && centre[0] < 255);
    }

    #[test]
    fn test_text_is_drawn_near_bottom() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255])));
        let spec = WatermarkSpec::builder()
            .text(Some("HELLO".to_string()))
            .image_position(AnchorPosition::TopLeft)
            .font_size(40)
            .build()
            .unwrap();

        let out = compose(&base, &spec, &builtin(Mark::None), today()).unwrap();
        // Text origin is (10, 50) regardless of the top anchor.
        let changed: Vec<(u32, u32)> = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != 0)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!changed.is_empty());
        assert!(changed.iter().all(|&(x, y)| x >= 10 && (50..90).contains(&y)));
        // Fully covered glyph pixels are white at alpha 128 over black.
        let brightest = out.pixels().map(|p| p[0]).max().unwrap();
        assert_eq!(brightest, 128);
        assert!(out.pixels().all(|p| p[3] == 255 && p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn test_pdf_mark_rejected_for_images() {
        let base = checker(4, 4);
        let spec = WatermarkSpec::builder()
            .watermark(Some(PathBuf::from("stamp.pdf")))
            .build()
            .unwrap();
        let assets = builtin(Mark::Pdf(PathBuf::from("stamp.pdf")));
        assert!(compose(&base, &spec, &assets, today()).is_err());
    }

    #[test]
    fn test_assets_missing_watermark_file() {
        let spec = WatermarkSpec::builder()
            .watermark(Some(PathBuf::from("/nonexistent/logo.png")))
            .build()
            .unwrap();
        let err = WatermarkAssets::load(&spec).unwrap_err();
        assert!(matches!(err, FpError::MissingResource { .. }));
    }
}
