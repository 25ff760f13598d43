//! Hex color parsing and per-channel brightness arithmetic.
//!
//! Colors travel through the pipeline as 6-digit hex strings (optionally
//! `#`-prefixed), the same form the catalog and color pickers produce. Shades
//! for gradient and border stops are derived with [`adjust_color`], which only
//! shifts brightness channel by channel and never touches hue directly.

use palette::Srgb;
use resvg::tiny_skia::Color;

use crate::error::{Error, Result};

/// Parses a 6-digit hex color, with or without a leading `#`.
pub fn parse_hex(color: &str) -> Result<Srgb<u8>> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidColor(color.to_string()));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| Error::InvalidColor(color.to_string()))
    };
    Ok(Srgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Serializes a color as lowercase zero-padded hex.
pub fn to_hex(color: Srgb<u8>, with_pound: bool) -> String {
    format!(
        "{}{:02x}{:02x}{:02x}",
        if with_pound { "#" } else { "" },
        color.red,
        color.green,
        color.blue
    )
}

/// Adds `amount` to each channel of `color`, clamping to `[0, 255]`.
///
/// The `#` prefix is preserved if the input had one.
///
/// ```
/// use iconcraft_renderer::adjust_color;
///
/// assert_eq!(adjust_color("#3498db", 70).unwrap(), "#7adeff");
/// assert_eq!(adjust_color("3498db", -100).unwrap(), "003477");
/// ```
pub fn adjust_color(color: &str, amount: i32) -> Result<String> {
    let rgb = parse_hex(color)?;
    let shift = |c: u8| i32::from(c).saturating_add(amount).clamp(0, 255) as u8;
    let adjusted = Srgb::new(shift(rgb.red), shift(rgb.green), shift(rgb.blue));
    Ok(to_hex(adjusted, color.starts_with('#')))
}

/// Normalizes any accepted hex form to `#rrggbb`.
pub fn normalize_hex(color: &str) -> Result<String> {
    parse_hex(color).map(|rgb| to_hex(rgb, true))
}

/// Converts a parsed color plus opacity into the raster backend's color type.
pub(crate) fn to_skia_color(color: Srgb<u8>, alpha: f32) -> Color {
    Color::from_rgba8(
        color.red,
        color.green,
        color.blue,
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}
