//! Per-pixel luminance noise.

use image::RgbaImage;
use rand::Rng;

use super::surface::{pixmap_to_rgba, rgba_to_pixmap};
use super::{FrameContext, LayerEffect};
use crate::error::Result;

/// Grain over the whole composited frame, transparent corners included.
pub struct BackgroundGrain;

impl LayerEffect for BackgroundGrain {
    fn name(&self) -> &'static str {
        "background-grain"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let amount = ctx.params.background_grain;
        if !amount.is_finite() || amount <= 0.0 {
            return Ok(());
        }
        let mut frame = pixmap_to_rgba(&ctx.pixmap);
        add_grain(&mut frame, amount, false);
        ctx.pixmap = rgba_to_pixmap(&frame)?;
        Ok(())
    }
}

/// Adds fresh random grain to every pixel of `img`.
///
/// Each pixel gets one uniform draw in `[-amount/2, amount/2]`, added equally
/// to red, green and blue and clamped to `[0, 255]`. Alpha is never touched.
/// With `respect_alpha`, fully transparent pixels are skipped so the noise
/// cannot paint a halo around a transparent layer.
///
/// Non-finite amounts add nothing.
///
/// Noise is drawn from the thread RNG, so two calls never produce the same
/// texture.
pub fn add_grain(img: &mut RgbaImage, amount: f32, respect_alpha: bool) {
    add_grain_with_rng(img, amount, respect_alpha, &mut rand::thread_rng());
}

/// [`add_grain`] with a caller-supplied random source.
pub fn add_grain_with_rng<R: Rng>(
    img: &mut RgbaImage,
    amount: f32,
    respect_alpha: bool,
    rng: &mut R,
) {
    if !amount.is_finite() || amount <= 0.0 {
        return;
    }
    let half = amount / 2.0;

    for pixel in img.pixels_mut() {
        if respect_alpha && pixel[3] == 0 {
            continue;
        }
        let noise = rng.gen_range(-half..=half);
        for channel in &mut pixel.0[..3] {
            *channel = (*channel as f32 + noise).round().clamp(0.0, 255.0) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn checkerboard() -> RgbaImage {
        RgbaImage::from_fn(32, 32, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([120, 60, 250, 255])
            } else {
                Rgba([7, 250, 3, 0])
            }
        })
    }

    #[test]
    fn zero_amount_is_a_no_op() {
        let original = checkerboard();
        let mut img = original.clone();
        add_grain(&mut img, 0.0, false);
        assert_eq!(img, original);
    }

    #[test]
    fn infinite_amount_is_a_no_op() {
        let original = checkerboard();
        let mut img = original.clone();
        add_grain_with_rng(&mut img, f32::INFINITY, false, &mut StdRng::seed_from_u64(1));
        assert_eq!(img, original);
    }

    #[test]
    fn transparent_pixels_survive_when_respecting_alpha() {
        let original = checkerboard();
        let mut img = original.clone();
        add_grain_with_rng(&mut img, 200.0, true, &mut StdRng::seed_from_u64(7));

        for (before, after) in original.pixels().zip(img.pixels()) {
            if before[3] == 0 {
                assert_eq!(before, after);
            }
        }
        assert_ne!(img, original, "opaque pixels should have changed");
    }

    #[test]
    fn background_pass_touches_transparent_pixels() {
        let original = checkerboard();
        let mut img = original.clone();
        add_grain_with_rng(&mut img, 200.0, false, &mut StdRng::seed_from_u64(7));

        let changed = original
            .pixels()
            .zip(img.pixels())
            .filter(|(before, after)| before[3] == 0 && before != after)
            .count();
        assert!(changed > 0);
    }

    #[test]
    fn alpha_is_never_modified() {
        let original = checkerboard();
        let mut img = original.clone();
        add_grain_with_rng(&mut img, 500.0, false, &mut StdRng::seed_from_u64(1));
        for (before, after) in original.pixels().zip(img.pixels()) {
            assert_eq!(before[3], after[3]);
        }
    }

    #[test]
    fn noise_is_luminance_only() {
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([128, 128, 128, 255]));
        add_grain_with_rng(&mut img, 40.0, false, &mut StdRng::seed_from_u64(3));
        for pixel in img.pixels() {
            assert_eq!(pixel[0], pixel[1]);
            assert_eq!(pixel[1], pixel[2]);
            assert!((108..=148).contains(&pixel[0]));
        }
    }

    #[test]
    fn channels_clamp_at_extremes() {
        let mut img = RgbaImage::from_fn(16, 16, |x, _| {
            if x % 2 == 0 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        // Values are u8, so the interesting check is that nothing wrapped
        // around: dark pixels stay dark, light pixels stay light.
        add_grain_with_rng(&mut img, 60.0, false, &mut StdRng::seed_from_u64(11));
        for (x, _, pixel) in img.enumerate_pixels() {
            if x % 2 == 0 {
                assert!(pixel[0] <= 30);
            } else {
                assert!(pixel[0] >= 225);
            }
        }
    }

    #[test]
    fn repeated_calls_differ() {
        let base = RgbaImage::from_pixel(32, 32, Rgba([128, 128, 128, 255]));
        let mut a = base.clone();
        let mut b = base.clone();
        add_grain(&mut a, 50.0, false);
        add_grain(&mut b, 50.0, false);
        assert_ne!(a, b);
    }
}
