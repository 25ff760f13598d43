//! The icon stage: recolored glyph with a soft drop shadow and its own grain.

use palette::Srgb;
use resvg::tiny_skia::{PixmapPaint, Transform};

use super::grain::add_grain;
use super::surface::{ShadowStyle, composite_over, drop_shadow, rgba_to_pixmap};
use super::{FrameContext, LayerEffect};
use crate::error::Result;
use crate::params::CANVAS_SIZE;

/// Shadow cast by the icon onto the background.
pub const ICON_SHADOW: ShadowStyle = ShadowStyle {
    color: Srgb::new(0, 0, 0),
    opacity: 0.2,
    blur: 20.0,
    offset_x: 10,
    offset_y: 10,
};

/// Square area the icon is fitted into, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconRegion {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl IconRegion {
    /// The centered square covering `scale_percent` of the canvas side.
    ///
    /// ```
    /// use iconcraft_renderer::IconRegion;
    ///
    /// let region = IconRegion::centered(50.0);
    /// assert_eq!((region.x, region.y, region.size), (256.0, 256.0, 512.0));
    /// ```
    pub fn centered(scale_percent: f32) -> Self {
        let canvas = CANVAS_SIZE as f32;
        let percent = if scale_percent.is_nan() { 0.0 } else { scale_percent.clamp(0.0, 100.0) };
        let size = canvas * percent / 100.0;
        let offset = (canvas - size) / 2.0;
        Self {
            x: offset,
            y: offset,
            size,
        }
    }
}

/// Draws the selected icon inside the background clip.
pub struct IconLayer;

impl LayerEffect for IconLayer {
    fn name(&self) -> &'static str {
        "icon"
    }

    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()> {
        let Some(icon) = ctx.icon else {
            return Ok(());
        };
        let region = IconRegion::centered(ctx.params.icon_scale_percent);
        if region.size < 1.0 {
            return Ok(());
        }

        let glyph = icon.rasterize(CANVAS_SIZE, region)?;
        let mut layer = drop_shadow(&glyph, &ICON_SHADOW);
        composite_over(&mut layer, &glyph);
        add_grain(&mut layer, ctx.params.icon_grain, true);

        let layer = rgba_to_pixmap(&layer)?;
        ctx.pixmap.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            ctx.clip.as_ref(),
        );
        Ok(())
    }
}
