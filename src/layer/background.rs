//! Background stages: clip, flat fill and corner gradient lighting.

use resvg::tiny_skia::{
    BlendMode, GradientStop, Mask, Paint, Point, RadialGradient, Rect, SpreadMode, Transform,
};

use super::shape::{clamp_radius, clip_mask, rounded_rect_path};
use super::{FrameContext, LayerEffect};
use crate::color::{adjust_color, parse_hex, to_skia_color};
use crate::error::{Error, Result};

/// Centers of the four lighting spots, as fractions of the canvas.
const SPOTS: [(f32, f32); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];

/// Brightness offsets applied to the background color for each spot.
const SPOT_OFFSETS: [i32; 4] = [70, 0, 0, -100];

/// The area inside the border, in canvas coordinates.
fn inner_rect(ctx: &FrameContext<'_>) -> Option<Rect> {
    let b = ctx.border_width();
    let side = ctx.size() - b * 2.0;
    if side <= 0.0 {
        return None;
    }
    Rect::from_xywh(b, b, side, side)
}

// ============================================================================
// BackgroundClip
// ============================================================================

/// Restricts all following drawing to the rounded silhouette inside the border.
pub struct BackgroundClip;

impl LayerEffect for BackgroundClip {
    fn name(&self) -> &'static str {
        "background-clip"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let size = ctx.pixmap.width();
        let b = ctx.border_width();
        let side = ctx.size() - b * 2.0;
        let radius = clamp_radius(ctx.params.corner_radius - b, side, side);

        let mask = match rounded_rect_path(b, b, side, side, radius) {
            Some(path) if side > 0.0 => clip_mask(&path, size)?,
            // Nothing left inside the border: clip everything away.
            _ => Mask::new(size, size).ok_or(Error::Surface("zero-sized clip mask"))?,
        };
        ctx.clip = Some(mask);
        Ok(())
    }
}

// ============================================================================
// BackgroundFill
// ============================================================================

/// Fills the clipped area with the resolved background color.
pub struct BackgroundFill;

impl LayerEffect for BackgroundFill {
    fn name(&self) -> &'static str {
        "background-fill"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let Some(rect) = inner_rect(ctx) else {
            return Ok(());
        };

        let mut paint = Paint::default();
        paint.set_color(to_skia_color(ctx.background, 1.0));
        paint.anti_alias = true;
        ctx.pixmap
            .fill_rect(rect, &paint, Transform::identity(), ctx.clip.as_ref());
        Ok(())
    }
}

// ============================================================================
// GradientLighting
// ============================================================================

/// Four radial gradients derived from the background color, screen-blended
/// over the fill.
pub struct GradientLighting;

impl LayerEffect for GradientLighting {
    fn name(&self) -> &'static str {
        "gradient-lighting"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        if !ctx.options.gradient_enabled {
            return Ok(());
        }
        let Some(rect) = inner_rect(ctx) else {
            return Ok(());
        };

        let size = ctx.size();
        for ((fx, fy), offset) in SPOTS.into_iter().zip(SPOT_OFFSETS) {
            let color = parse_hex(&adjust_color(&ctx.background_hex, offset)?)?;
            let center = Point::from_xy(size * fx, size * fy);

            // Canvas interpolates premultiplied, so fade the same color to zero alpha.
            let stops = vec![
                GradientStop::new(0.0, to_skia_color(color, 1.0)),
                GradientStop::new(1.0, to_skia_color(color, 0.0)),
            ];
            let shader = RadialGradient::new(
                center,
                center,
                size,
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            )
            .ok_or(Error::Surface("invalid radial gradient"))?;

            let mut paint = Paint::default();
            paint.shader = shader;
            paint.blend_mode = BlendMode::Screen;
            ctx.pixmap
                .fill_rect(rect, &paint, Transform::identity(), ctx.clip.as_ref());
        }
        Ok(())
    }
}

// ============================================================================
// ReleaseClip
// ============================================================================

/// Drops the clip so later stages reach the whole canvas.
pub struct ReleaseClip;

impl LayerEffect for ReleaseClip {
    fn name(&self) -> &'static str {
        "release-clip"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        ctx.clip = None;
        Ok(())
    }
}
