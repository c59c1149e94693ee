//! Alpha channel arithmetic.
//!
//! All blending is done in integer space with a single rounding step so
//! results are exact and reproducible: a fully transparent source never
//! changes its destination, and an alpha scale of 255 is the identity.

use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

use crate::types::Colour;

/// Slope of the soft-edge falloff, in alpha levels per pixel of distance.
pub const SOFT_EDGE_STEP: u32 = 5;

/// `round(v * m / 255)` for 8-bit values.
#[inline]
fn scale(v: u8, m: u8) -> u8 {
    ((v as u32 * m as u32 + 127) / 255) as u8
}

/// Linear blend of `fg` over `bg` weighted by the 8-bit mask `m`.
#[inline]
fn mix(fg: u8, bg: u8, m: u8) -> u8 {
    ((fg as u32 * m as u32 + bg as u32 * (255 - m as u32) + 127) / 255) as u8
}

/// Multiply every pixel's alpha by `transparency / 255`.
pub fn adjust_transparency(image: &mut RgbaImage, transparency: u8) {
    if transparency == 255 {
        return;
    }
    for pixel in image.pixels_mut() {
        pixel[3] = scale(pixel[3], transparency);
    }
}

/// Alpha of the soft-edge mask at `(x, y)` for a `width x height` image.
#[inline]
pub fn soft_edge_alpha(x: u32, y: u32, width: u32, height: u32) -> u8 {
    let distance = x
        .min(y)
        .min(width.saturating_sub(1).saturating_sub(x))
        .min(height.saturating_sub(1).saturating_sub(y));
    distance.saturating_mul(SOFT_EDGE_STEP).min(255) as u8
}

/// Synthesize the soft-edge falloff mask.
///
/// Alpha is zero on the border and rises by [`SOFT_EDGE_STEP`] per pixel of
/// Chebyshev distance to the nearest edge, saturating at 255.
pub fn soft_edge_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        Luma([soft_edge_alpha(x, y, width, height)])
    })
}

/// Fade an image's edges by taking the minimum of its alpha and the mask.
pub fn apply_soft_edge(image: &mut RgbaImage) {
    let (width, height) = image.dimensions();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        pixel[3] = pixel[3].min(soft_edge_alpha(x, y, width, height));
    }
}

/// Paste `src` onto `dst` at `(x, y)` using the source alpha as stencil.
///
/// Every channel of the destination, alpha included, moves toward the
/// source by the source alpha. Parts falling outside `dst` are clipped.
pub fn paste_masked(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + src.width() as i64).min(dw);
    let y1 = (y + src.height() as i64).min(dh);

    for ty in y0..y1 {
        for tx in x0..x1 {
            let s = *src.get_pixel((tx - x) as u32, (ty - y) as u32);
            let m = s[3];
            if m == 0 {
                continue;
            }
            let d = dst.get_pixel_mut(tx as u32, ty as u32);
            for c in 0..4 {
                d[c] = mix(s[c], d[c], m);
            }
        }
    }
}

/// Stencil a solid colour onto one pixel with the given coverage.
///
/// Out-of-bounds coordinates are ignored.
pub fn stamp_pixel(dst: &mut RgbaImage, x: i64, y: i64, colour: Rgba<u8>, coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 || x >= dst.width() as i64 || y >= dst.height() as i64 {
        return;
    }
    let d = dst.get_pixel_mut(x as u32, y as u32);
    for c in 0..4 {
        d[c] = mix(colour[c], d[c], coverage);
    }
}

/// Porter-Duff "over" for one pixel, computed exactly.
pub fn over(fg: Rgba<u8>, bg: Rgba<u8>) -> Rgba<u8> {
    let fa = fg[3] as u64;
    if fa == 0 {
        return bg;
    }
    if fa == 255 {
        return fg;
    }
    let ba = bg[3] as u64;

    // Output alpha scaled by 255.
    let alpha = fa * 255 + ba * (255 - fa);
    if alpha == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |f: u8, b: u8| -> u8 {
        let num = f as u64 * fa * 255 + b as u64 * ba * (255 - fa);
        ((num + alpha / 2) / alpha) as u8
    };

    Rgba([
        channel(fg[0], bg[0]),
        channel(fg[1], bg[1]),
        channel(fg[2], bg[2]),
        ((alpha + 127) / 255) as u8,
    ])
}

/// Composite `overlay` over `base`, returning a new image.
///
/// Both images must share dimensions.
pub fn alpha_composite(base: &RgbaImage, overlay: &RgbaImage) -> RgbaImage {
    debug_assert_eq!(base.dimensions(), overlay.dimensions());
    let mut out = base.clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        *dst = over(*src, *dst);
    }
    out
}

/// Drop the alpha channel by compositing over an opaque background.
pub fn flatten(image: &RgbaImage, background: Colour) -> RgbImage {
    let bg = background.to_rgb();
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let a = p[3];
        Rgb([mix(p[0], bg[0], a), mix(p[1], bg[1], a), mix(p[2], bg[2], a)])
    })
}
