//! HTML Canvas rendering for WASM environments.
//!
//! This module provides [`CanvasRenderer`], a wrapper around a [`Studio`]
//! that renders frames straight into an HTML canvas element for live
//! preview. Icons are handed over as markup by the page, which does its own
//! fetching; the renderer keeps their decoded form and recolors without
//! re-parsing.
//!
//! # Feature Flag
//!
//! This module is only available with the `canvas` feature enabled:
//!
//! ```toml
//! [dependencies]
//! iconcraft-renderer = { version = "0.1", features = ["canvas"] }
//! ```
//!
//! # Example (JavaScript/TypeScript)
//!
//! ```javascript
//! import init, { CanvasRenderer } from 'iconcraft-renderer';
//!
//! await init();
//!
//! const canvas = document.getElementById('preview-canvas');
//! const renderer = new CanvasRenderer();
//!
//! renderer.setIcon('GitHub', svgMarkup);
//! renderer.setBackgroundColor('#181717');
//! renderer.setIconTheme('light');
//! renderer.renderToCanvas(canvas);
//!
//! const png = renderer.exportPng();
//! ```

use wasm_bindgen::Clamped;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::catalog::Catalog;
use crate::error::Error;
use crate::export::export_filename;
use crate::loader::MemoryFetcher;
use crate::params::{CANVAS_SIZE, ThemeMode};
use crate::profile::RenderProfile;
use crate::studio::{Configurable, Studio};

fn js_error(e: Error) -> JsError {
    JsError::new(&e.to_string())
}

fn theme(mode: &str) -> Result<ThemeMode, JsError> {
    mode.parse().map_err(js_error)
}

// ============================================================================
// CanvasRenderer
// ============================================================================

/// A [`Studio`] exposed to JavaScript for live preview.
#[wasm_bindgen]
pub struct CanvasRenderer {
    studio: Studio<MemoryFetcher>,
}

#[wasm_bindgen]
impl CanvasRenderer {
    /// Creates a renderer with default parameters and no icon.
    #[wasm_bindgen(constructor)]
    pub fn new() -> CanvasRenderer {
        Self {
            studio: Studio::new(Catalog::new(), MemoryFetcher::new()),
        }
    }

    /// Selects an icon from its markup, recolored to the current icon color.
    #[wasm_bindgen(js_name = "setIcon")]
    pub fn set_icon(&mut self, title: &str, svg_data: &str) -> Result<(), JsError> {
        self.studio
            .select_default_icon(title, svg_data)
            .map_err(js_error)
    }

    /// Removes the icon; frames show the background only.
    #[wasm_bindgen(js_name = "clearIcon")]
    pub fn clear_icon(&mut self) {
        self.studio.clear_selection();
    }

    /// Title of the selected icon, if any.
    #[wasm_bindgen(js_name = "selectedTitle")]
    pub fn selected_title(&self) -> Option<String> {
        self.studio.selected().map(|h| h.title().to_string())
    }

    // ---- Parameters ----

    #[wasm_bindgen(js_name = "setBackgroundColor")]
    pub fn set_background_color(&mut self, color: &str) -> Result<(), JsError> {
        self.studio.set_background_color(color).map_err(js_error)
    }

    /// Accepts `"color"`, `"light"` or `"dark"`.
    #[wasm_bindgen(js_name = "setBackgroundTheme")]
    pub fn set_background_theme(&mut self, mode: &str) -> Result<(), JsError> {
        self.studio.set_background_theme(theme(mode)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = "setIconColor")]
    pub fn set_icon_color(&mut self, color: &str) -> Result<(), JsError> {
        self.studio.set_icon_color(color).map_err(js_error)
    }

    /// Accepts `"color"`, `"light"` or `"dark"`.
    #[wasm_bindgen(js_name = "setIconTheme")]
    pub fn set_icon_theme(&mut self, mode: &str) -> Result<(), JsError> {
        self.studio.set_icon_theme(theme(mode)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = "setCornerRadius")]
    pub fn set_corner_radius(&mut self, radius: f32) {
        self.studio.update(|p| p.set_corner_radius(radius));
    }

    /// Icon size as a percentage of the canvas (0-100).
    #[wasm_bindgen(js_name = "setIconScale")]
    pub fn set_icon_scale(&mut self, percent: f32) {
        self.studio.update(|p| p.set_icon_scale_percent(percent));
    }

    #[wasm_bindgen(js_name = "setBackgroundGrain")]
    pub fn set_background_grain(&mut self, amount: f32) {
        self.studio.update(|p| p.set_background_grain(amount));
    }

    #[wasm_bindgen(js_name = "setIconGrain")]
    pub fn set_icon_grain(&mut self, amount: f32) {
        self.studio.update(|p| p.set_icon_grain(amount));
    }

    #[wasm_bindgen(js_name = "setBorderWidth")]
    pub fn set_border_width(&mut self, width: f32) {
        self.studio.update(|p| p.set_border_width(width));
    }

    // ---- Options ----

    #[wasm_bindgen(js_name = "setGradientEnabled")]
    pub fn set_gradient_enabled(&mut self, enabled: bool) {
        let mut options = self.studio.options().clone();
        options.gradient_enabled = enabled;
        self.studio.set_options(options);
    }

    #[wasm_bindgen(js_name = "setBorderUndercoat")]
    pub fn set_border_undercoat(&mut self, enabled: bool) {
        let mut options = self.studio.options().clone();
        options.border_undercoat = enabled;
        self.studio.set_options(options);
    }

    // ---- Rendering ----

    /// Renders a frame into `canvas`, resizing it to 1024×1024.
    #[wasm_bindgen(js_name = "renderToCanvas")]
    pub fn render_to_canvas(&self, canvas: &HtmlCanvasElement) -> Result<(), JsError> {
        let frame = self.studio.render().map_err(js_error)?;

        canvas.set_width(CANVAS_SIZE);
        canvas.set_height(CANVAS_SIZE);

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|_| JsError::new("Failed to get 2d context"))?
            .ok_or_else(|| JsError::new("Canvas 2d context is null"))?
            .dyn_into()
            .map_err(|_| JsError::new("Failed to cast to CanvasRenderingContext2d"))?;

        let raw_pixels: Vec<u8> = frame.into_raw();
        let image_data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(&raw_pixels),
            CANVAS_SIZE,
            CANVAS_SIZE,
        )
        .map_err(|_| JsError::new("Failed to create ImageData"))?;

        ctx.put_image_data(&image_data, 0.0, 0.0)
            .map_err(|_| JsError::new("Failed to put image data"))?;

        Ok(())
    }

    /// Renders a frame and returns raw straight-alpha RGBA pixels.
    #[wasm_bindgen(js_name = "renderToPixels")]
    pub fn render_to_pixels(&self) -> Result<js_sys::Uint8Array, JsError> {
        let raw_pixels = self.studio.render().map_err(js_error)?.into_raw();
        let array = js_sys::Uint8Array::new_with_length(raw_pixels.len() as u32);
        array.copy_from(&raw_pixels);
        Ok(array)
    }

    /// Renders a frame and encodes it as PNG. Fails while no icon is set.
    #[wasm_bindgen(js_name = "exportPng")]
    pub fn export_png(&self) -> Result<Vec<u8>, JsError> {
        let image = self.studio.export_current().map_err(js_error)?;
        Ok(image.png)
    }

    /// A download name for the current icon, with a random suffix.
    #[wasm_bindgen(js_name = "exportFilename")]
    pub fn export_filename(&self) -> String {
        export_filename(
            self.studio
                .selected()
                .map(|h| h.title())
                .unwrap_or("icon"),
        )
    }

    // ---- Profile Import/Export ----

    /// Exports the current settings as a JSON string.
    #[wasm_bindgen(js_name = "exportProfileJson")]
    pub fn export_profile_json(&self) -> Result<String, JsError> {
        self.studio.export_profile().to_json().map_err(js_error)
    }

    /// Imports settings from a JSON string.
    #[wasm_bindgen(js_name = "importProfileJson")]
    pub fn import_profile_json(&mut self, json: &str) -> Result<(), JsError> {
        let profile = RenderProfile::from_json(json).map_err(js_error)?;
        self.studio.apply_profile(&profile).map_err(js_error)
    }

    /// Restores default parameters and options, keeping the icon.
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.studio
            .apply_profile(&RenderProfile::default())
            .map_err(js_error)
    }

    /// Drops cached decoded icons. The selected icon stays usable.
    #[wasm_bindgen(js_name = "clearCache")]
    pub fn clear_cache(&mut self) {
        self.studio.loader().cache().clear();
    }
}

impl Default for CanvasRenderer {
    fn default() -> Self {
        Self::new()
    }
}
