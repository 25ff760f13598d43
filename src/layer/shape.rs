//! Rounded-rectangle geometry used for the clip region and the border.

use resvg::tiny_skia::{FillRule, Mask, Path, PathBuilder, Transform};

use crate::error::{Error, Result};

/// Builds a closed rounded rectangle: four straight edges joined by four
/// quadratic corners whose control points sit on the rectangle's corners.
///
/// `radius` is used as given; callers clamp it with [`clamp_radius`] first.
pub fn rounded_rect_path(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Option<Path> {
    let right = x + width;
    let bottom = y + height;

    let mut pb = PathBuilder::new();
    pb.move_to(x + radius, y);
    pb.line_to(right - radius, y);
    pb.quad_to(right, y, right, y + radius);
    pb.line_to(right, bottom - radius);
    pb.quad_to(right, bottom, right - radius, bottom);
    pb.line_to(x + radius, bottom);
    pb.quad_to(x, bottom, x, bottom - radius);
    pb.line_to(x, y + radius);
    pb.quad_to(x, y, x + radius, y);
    pb.close();
    pb.finish()
}

/// Clamps a corner radius into `[0, min(width, height) / 2]`.
pub fn clamp_radius(radius: f32, width: f32, height: f32) -> f32 {
    let max = (width.min(height) / 2.0).max(0.0);
    if radius.is_nan() { 0.0 } else { radius.clamp(0.0, max) }
}

/// Rasterizes `path` into an anti-aliased clip mask of `size`×`size`.
pub fn clip_mask(path: &Path, size: u32) -> Result<Mask> {
    let mut mask = Mask::new(size, size).ok_or(Error::Surface("zero-sized clip mask"))?;
    mask.fill_path(path, FillRule::Winding, true, Transform::identity());
    Ok(mask)
}
