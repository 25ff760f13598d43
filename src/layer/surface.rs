//! Pixel buffer plumbing between the raster backend and straight-alpha images.
//!
//! Drawing happens on premultiplied `tiny_skia` pixmaps; per-pixel work
//! (grain, tinting, shadows) happens on straight-alpha [`RgbaImage`]s, the
//! same representation a browser hands out from `getImageData`.

use image::{Rgba, RgbaImage, imageops};
use palette::Srgb;
use resvg::tiny_skia::{ColorU8, Pixmap};

use crate::error::{Error, Result};

// ============================================================================
// Conversions
// ============================================================================

/// Converts a premultiplied pixmap into a straight-alpha image.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}

/// Converts a straight-alpha image into a premultiplied pixmap.
///
/// Color stored under fully transparent pixels is discarded.
pub fn rgba_to_pixmap(img: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap =
        Pixmap::new(img.width(), img.height()).ok_or(Error::Surface("zero-sized pixmap"))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

// ============================================================================
// Compositing
// ============================================================================

/// Lays `src` over `dest` with source-over, pixel for pixel from the top-left.
///
/// Both images hold straight alpha; only the overlapping area is touched.
pub fn composite_over(dest: &mut RgbaImage, src: &RgbaImage) {
    let width = dest.width().min(src.width());
    let height = dest.height().min(src.height());
    for y in 0..height {
        for x in 0..width {
            let top = src.get_pixel(x, y);
            match top[3] {
                0 => {}
                255 => dest.put_pixel(x, y, *top),
                _ => {
                    let under = dest.get_pixel_mut(x, y);
                    *under = source_over(*top, *under);
                }
            }
        }
    }
}

fn source_over(top: Rgba<u8>, under: Rgba<u8>) -> Rgba<u8> {
    let ta = f32::from(top[3]) / 255.0;
    let ua = f32::from(under[3]) / 255.0 * (1.0 - ta);
    let alpha = ta + ua;
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for (channel, slot) in out.iter_mut().take(3).enumerate() {
        let value = (f32::from(top[channel]) * ta + f32::from(under[channel]) * ua) / alpha;
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (alpha * 255.0).round() as u8;
    Rgba(out)
}

// ============================================================================
// Color effects
// ============================================================================

/// Forces every visible pixel to `color`, keeping its coverage.
pub fn tint(img: &mut RgbaImage, color: Srgb<u8>) {
    for pixel in img.pixels_mut() {
        if pixel[3] > 0 {
            pixel.0 = [color.red, color.green, color.blue, pixel[3]];
        }
    }
}

/// Parameters of a canvas-style drop shadow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStyle {
    pub color: Srgb<u8>,
    pub opacity: f32,
    /// Canvas `shadowBlur`; the Gaussian sigma is half of it.
    pub blur: f32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Builds the shadow cast by `img`: its coverage, offset, blurred and tinted.
///
/// The result has the same size as `img` and is meant to sit beneath it.
pub fn drop_shadow(img: &RgbaImage, style: &ShadowStyle) -> RgbaImage {
    let [r, g, b] = [style.color.red, style.color.green, style.color.blue];
    let mut shadow = RgbaImage::from_pixel(img.width(), img.height(), Rgba([r, g, b, 0]));
    let opacity = style.opacity.clamp(0.0, 1.0);

    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let dx = x as i64 + style.offset_x as i64;
        let dy = y as i64 + style.offset_y as i64;
        if dx < 0 || dy < 0 || dx >= img.width() as i64 || dy >= img.height() as i64 {
            continue;
        }
        let alpha = (pixel[3] as f32 * opacity).round() as u8;
        shadow.put_pixel(dx as u32, dy as u32, Rgba([r, g, b, alpha]));
    }

    let sigma = style.blur / 2.0;
    if sigma > 0.0 {
        imageops::fast_blur(&shadow, sigma)
    } else {
        shadow
    }
}
