//! Pipeline parameters and compositor options.
//!
//! [`PipelineParameters`] is the small mutable state the UI edits between
//! frames. [`CompositorOptions`] carries the product variation points that
//! differ between deployments of the tool (gradient lighting, border
//! undercoat, light/dark color mappings).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::normalize_hex;
use crate::error::{Error, Result};

/// Side length of the square canvas every frame is composited at.
pub const CANVAS_SIZE: u32 = 1024;

/// Largest accepted corner radius (half the canvas).
pub const MAX_CORNER_RADIUS: f32 = CANVAS_SIZE as f32 / 2.0;

// ============================================================================
// ThemeMode
// ============================================================================

/// Where a layer takes its color from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "tsify", derive(tsify_next::Tsify))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ThemeMode {
    /// Use the explicit user color.
    #[default]
    Color,
    /// Use the palette's light constant.
    Light,
    /// Use the palette's dark constant.
    Dark,
}

impl FromStr for ThemeMode {
    type Err = Error;

    /// Accepts `color` (or `explicit-color`), `light` and `dark`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "color" | "explicit-color" => Ok(Self::Color),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(Error::InvalidTheme(s.to_string())),
        }
    }
}

/// The fixed colors a [`ThemeMode`] resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "tsify", derive(tsify_next::Tsify))]
pub struct ThemePalette {
    pub light: String,
    pub dark: String,
}

impl ThemePalette {
    pub fn new(light: impl Into<String>, dark: impl Into<String>) -> Self {
        Self {
            light: light.into(),
            dark: dark.into(),
        }
    }

    /// Picks `explicit`, or the palette constant selected by `mode`.
    pub fn resolve<'a>(&'a self, mode: ThemeMode, explicit: &'a str) -> &'a str {
        match mode {
            ThemeMode::Color => explicit,
            ThemeMode::Light => &self.light,
            ThemeMode::Dark => &self.dark,
        }
    }

    /// Returns the palette with light and dark exchanged.
    pub fn swapped(&self) -> Self {
        Self::new(self.dark.clone(), self.light.clone())
    }
}

// ============================================================================
// CompositorOptions
// ============================================================================

/// Deployment-level switches for the compositor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "tsify", derive(tsify_next::Tsify))]
pub struct CompositorOptions {
    /// Paint the four screen-blended corner gradients.
    pub gradient_enabled: bool,

    /// Paint a translucent undercoat beneath the border.
    pub border_undercoat: bool,

    /// Light/dark constants for the background.
    pub background_palette: ThemePalette,

    /// Light/dark constants for the icon.
    pub icon_palette: ThemePalette,
}

impl Default for CompositorOptions {
    fn default() -> Self {
        Self {
            gradient_enabled: true,
            border_undercoat: true,
            background_palette: ThemePalette::new("#f0f0f0", "#1a1a1a"),
            icon_palette: ThemePalette::new("#ffffff", "#000000"),
        }
    }
}

// ============================================================================
// PipelineParameters
// ============================================================================

/// Per-frame appearance parameters.
///
/// Fields are public for reading; mutate through the setters so ranges are
/// enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "tsify", derive(tsify_next::Tsify))]
pub struct PipelineParameters {
    pub background_color: String,
    pub icon_color: String,
    pub background_theme: ThemeMode,
    pub icon_theme: ThemeMode,
    /// Corner radius in canvas pixels, `0..=512`.
    pub corner_radius: f32,
    /// Icon size as a percentage of the canvas, `0..=100`.
    pub icon_scale_percent: f32,
    pub background_grain: f32,
    pub icon_grain: f32,
    pub border_width: f32,
}

impl Default for PipelineParameters {
    fn default() -> Self {
        Self {
            background_color: "#3498db".to_string(),
            icon_color: "#3498db".to_string(),
            background_theme: ThemeMode::Color,
            icon_theme: ThemeMode::Color,
            corner_radius: 125.0,
            icon_scale_percent: 50.0,
            background_grain: 35.0,
            icon_grain: 15.0,
            border_width: 3.0,
        }
    }
}

impl PipelineParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the explicit background color (any accepted hex form).
    pub fn set_background_color(&mut self, color: &str) -> Result<()> {
        self.background_color = normalize_hex(color)?;
        Ok(())
    }

    /// Sets the explicit icon color (any accepted hex form).
    pub fn set_icon_color(&mut self, color: &str) -> Result<()> {
        self.icon_color = normalize_hex(color)?;
        Ok(())
    }

    pub fn set_background_theme(&mut self, mode: ThemeMode) {
        self.background_theme = mode;
    }

    pub fn set_icon_theme(&mut self, mode: ThemeMode) {
        self.icon_theme = mode;
    }

    pub fn set_corner_radius(&mut self, radius: f32) {
        self.corner_radius = sanitize(radius).min(MAX_CORNER_RADIUS);
    }

    pub fn set_icon_scale_percent(&mut self, percent: f32) {
        self.icon_scale_percent = sanitize(percent).min(100.0);
    }

    pub fn set_background_grain(&mut self, amount: f32) {
        self.background_grain = sanitize(amount);
    }

    pub fn set_icon_grain(&mut self, amount: f32) {
        self.icon_grain = sanitize(amount);
    }

    pub fn set_border_width(&mut self, width: f32) {
        self.border_width = sanitize(width).min(MAX_CORNER_RADIUS);
    }

    /// Re-applies every range rule, e.g. after deserializing.
    pub fn validated(mut self) -> Result<Self> {
        let background = self.background_color.clone();
        let icon = self.icon_color.clone();
        self.set_background_color(&background)?;
        self.set_icon_color(&icon)?;
        self.set_corner_radius(self.corner_radius);
        self.set_icon_scale_percent(self.icon_scale_percent);
        self.set_background_grain(self.background_grain);
        self.set_icon_grain(self.icon_grain);
        self.set_border_width(self.border_width);
        Ok(self)
    }

    /// The background color after applying the theme mode.
    pub fn resolved_background_color<'a>(&'a self, options: &'a CompositorOptions) -> &'a str {
        options
            .background_palette
            .resolve(self.background_theme, &self.background_color)
    }

    /// The icon color after applying the theme mode.
    pub fn resolved_icon_color<'a>(&'a self, options: &'a CompositorOptions) -> &'a str {
        options
            .icon_palette
            .resolve(self.icon_theme, &self.icon_color)
    }
}

/// Maps NaN, infinities and negatives to zero.
fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}
