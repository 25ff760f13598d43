//! Serializable render profile for saving and sharing settings.
//!
//! A [`RenderProfile`] bundles the per-frame [`PipelineParameters`] with the
//! deployment-level [`CompositorOptions`] in a JSON-friendly format.
//!
//! # Example
//!
//! ```
//! use iconcraft_renderer::{PipelineParameters, RenderProfile};
//!
//! let mut parameters = PipelineParameters::default();
//! parameters.set_corner_radius(200.0);
//!
//! let profile = RenderProfile::new().with_parameters(parameters);
//! let json = profile.to_json().unwrap();
//!
//! let restored = RenderProfile::from_json(&json).unwrap();
//! assert_eq!(restored.parameters.corner_radius, 200.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::{CompositorOptions, PipelineParameters};

/// A serializable profile containing all render settings.
///
/// # JSON Format
///
/// ```json
/// {
///   "parameters": {
///     "backgroundColor": "#3498db",
///     "iconColor": "#ffffff",
///     "backgroundTheme": "color",
///     "iconTheme": "light",
///     "cornerRadius": 125.0,
///     "iconScalePercent": 50.0,
///     "backgroundGrain": 35.0,
///     "iconGrain": 15.0,
///     "borderWidth": 3.0
///   },
///   "options": { "gradientEnabled": true }
/// }
/// ```
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "tsify", derive(tsify_next::Tsify))]
pub struct RenderProfile {
    pub parameters: PipelineParameters,
    pub options: CompositorOptions,
}

impl RenderProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters(mut self, parameters: PipelineParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_options(mut self, options: CompositorOptions) -> Self {
        self.options = options;
        self
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a profile and re-applies every parameter range rule.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut profile: Self = serde_json::from_str(json)?;
        profile.parameters = profile.parameters.validated()?;
        Ok(profile)
    }

    /// JSON Schema describing the profile document.
    #[cfg(feature = "jsonschema")]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RenderProfile)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::Compositor;
    use crate::error::Error;
    use crate::params::ThemeMode;

    #[test]
    fn profile_json_format() {
        let json = RenderProfile::new().to_json_pretty().unwrap();

        // Verify camelCase serialization
        assert!(json.contains("\"parameters\""));
        assert!(json.contains("\"cornerRadius\""));
        assert!(json.contains("\"gradientEnabled\""));
        assert!(json.contains("\"backgroundTheme\": \"color\""));
    }

    #[test]
    fn empty_profile_deserializes_to_defaults() {
        let profile = RenderProfile::from_json("{}").unwrap();
        assert_eq!(profile, RenderProfile::default());
    }

    #[test]
    fn partial_profile_keeps_other_defaults() {
        let json = r#"{ "parameters": { "iconTheme": "dark", "borderWidth": 0 } }"#;
        let profile = RenderProfile::from_json(json).unwrap();

        assert_eq!(profile.parameters.icon_theme, ThemeMode::Dark);
        assert_eq!(profile.parameters.border_width, 0.0);
        assert_eq!(profile.parameters.corner_radius, 125.0);
        assert!(profile.options.gradient_enabled);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let json = r#"{ "parameters": { "cornerRadius": 9000, "iconScalePercent": -4 } }"#;
        let profile = RenderProfile::from_json(json).unwrap();
        assert_eq!(profile.parameters.corner_radius, 512.0);
        assert_eq!(profile.parameters.icon_scale_percent, 0.0);
    }

    #[test]
    fn overflowing_grain_is_zeroed_and_renders() {
        let profile =
            RenderProfile::from_json(r#"{ "parameters": { "backgroundGrain": 1e39, "iconGrain": -1e39 } }"#)
                .unwrap();
        assert_eq!(profile.parameters.background_grain, 0.0);
        assert_eq!(profile.parameters.icon_grain, 0.0);

        let frame = Compositor::default()
            .compose(&profile.parameters, None)
            .unwrap();
        assert_eq!(frame.dimensions(), (1024, 1024));
    }

    #[test]
    fn bad_color_is_rejected() {
        let json = r#"{ "parameters": { "backgroundColor": "blue" } }"#;
        assert!(matches!(
            RenderProfile::from_json(json),
            Err(Error::InvalidColor(_))
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            RenderProfile::from_json("{ nope"),
            Err(Error::Json(_))
        ));
    }
}
