//! Border stages: the translucent undercoat and the gradient stroke.

use resvg::tiny_skia::{
    Color, FillRule, GradientStop, LinearGradient, Paint, Point, SpreadMode, Stroke, Transform,
};

use super::shape::{clamp_radius, rounded_rect_path};
use super::{FrameContext, LayerEffect};
use crate::color::{adjust_color, parse_hex, to_skia_color};
use crate::error::{Error, Result};

/// Undercoat opacity, black at 10%.
const UNDERCOAT_ALPHA: f32 = 0.1;

/// Brightness offsets at the start and end of the border gradient.
const STROKE_OFFSETS: (i32, i32) = (100, -50);

/// Faint full-frame silhouette drawn beneath the background so the border
/// ring never shows the page through anti-aliased edges.
pub struct BorderUndercoat;

impl LayerEffect for BorderUndercoat {
    fn name(&self) -> &'static str {
        "border-undercoat"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        if !ctx.options.border_undercoat || ctx.border_width() <= 0.0 {
            return Ok(());
        }

        let size = ctx.size();
        let radius = clamp_radius(ctx.params.corner_radius, size, size);
        let path = rounded_rect_path(0.0, 0.0, size, size, radius)
            .ok_or(Error::Surface("invalid undercoat path"))?;

        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba8(0, 0, 0, (UNDERCOAT_ALPHA * 255.0).round() as u8));
        paint.anti_alias = true;
        ctx.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        Ok(())
    }
}

/// Diagonal light-to-dark stroke along the outer edge.
pub struct BorderStroke;

impl LayerEffect for BorderStroke {
    fn name(&self) -> &'static str {
        "border-stroke"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let b = ctx.border_width();
        if b <= 0.0 {
            return Ok(());
        }

        let size = ctx.size();
        let inset = b / 2.0;
        let side = size - b;
        let radius = clamp_radius(ctx.params.corner_radius - inset, side, side);
        let path = rounded_rect_path(inset, inset, side, side, radius)
            .ok_or(Error::Surface("invalid border path"))?;

        let light = parse_hex(&adjust_color(&ctx.background_hex, STROKE_OFFSETS.0)?)?;
        let dark = parse_hex(&adjust_color(&ctx.background_hex, STROKE_OFFSETS.1)?)?;
        let shader = LinearGradient::new(
            Point::from_xy(0.0, 0.0),
            Point::from_xy(size, size),
            vec![
                GradientStop::new(0.0, to_skia_color(light, 1.0)),
                GradientStop::new(1.0, to_skia_color(dark, 1.0)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        )
        .ok_or(Error::Surface("invalid border gradient"))?;

        let mut paint = Paint::default();
        paint.shader = shader;
        paint.anti_alias = true;
        let stroke = Stroke {
            width: b,
            ..Stroke::default()
        };
        ctx.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::surface::pixmap_to_rgba;
    use crate::params::{CompositorOptions, PipelineParameters};

    fn params(border: f32) -> PipelineParameters {
        let mut p = PipelineParameters::new();
        p.set_background_color("#3498db").unwrap();
        p.set_corner_radius(0.0);
        p.set_border_width(border);
        p
    }

    #[test]
    fn undercoat_is_faint_black() {
        let params = params(3.0);
        let options = CompositorOptions::default();
        let mut ctx = FrameContext::new(&params, &options, None).unwrap();
        BorderUndercoat.apply(&mut ctx).unwrap();

        let img = pixmap_to_rgba(&ctx.pixmap);
        let px = img.get_pixel(512, 512);
        assert_eq!((px[0], px[1], px[2]), (0, 0, 0));
        assert_eq!(px[3], 26);
    }

    #[test]
    fn undercoat_skipped_without_border_or_when_disabled() {
        let options = CompositorOptions::default();
        let no_border = params(0.0);
        let mut ctx = FrameContext::new(&no_border, &options, None).unwrap();
        BorderUndercoat.apply(&mut ctx).unwrap();
        assert!(ctx.pixmap.data().iter().all(|&v| v == 0));

        let mut disabled = CompositorOptions::default();
        disabled.border_undercoat = false;
        let with_border = params(3.0);
        let mut ctx = FrameContext::new(&with_border, &disabled, None).unwrap();
        BorderUndercoat.apply(&mut ctx).unwrap();
        assert!(ctx.pixmap.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn stroke_runs_light_to_dark() {
        let params = params(10.0);
        let options = CompositorOptions::default();
        let mut ctx = FrameContext::new(&params, &options, None).unwrap();
        BorderStroke.apply(&mut ctx).unwrap();

        let img = pixmap_to_rgba(&ctx.pixmap);
        let near_origin = img.get_pixel(5, 40);
        let far_corner = img.get_pixel(1018, 984);
        let luma = |p: &image::Rgba<u8>| p[0] as u32 + p[1] as u32 + p[2] as u32;

        assert_eq!(near_origin[3], 255);
        assert_eq!(far_corner[3], 255);
        assert!(luma(near_origin) > luma(far_corner));
        assert_eq!(img.get_pixel(512, 512)[3], 0, "stroke only covers the edge");
    }

    #[test]
    fn zero_border_draws_no_stroke() {
        let params = params(0.0);
        let options = CompositorOptions::default();
        let mut ctx = FrameContext::new(&params, &options, None).unwrap();
        BorderStroke.apply(&mut ctx).unwrap();
        assert!(ctx.pixmap.data().iter().all(|&v| v == 0));
    }
}
