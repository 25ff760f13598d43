//! PNG export, output naming and batch exports.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use log::{info, warn};
use rand::Rng;

use crate::error::{Error, Result};
use crate::loader::AssetFetcher;
use crate::params::ThemeMode;
use crate::studio::Studio;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 6;

/// Fixed variant colors.
const LIGHT: &str = "#ffffff";
const DARK: &str = "#000000";

// ============================================================================
// Encoding & naming
// ============================================================================

/// Encodes a frame as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Makes `title` safe to use as a file name on common filesystems.
///
/// Reserved characters and control characters (tabs and newlines included)
/// are removed first, then runs of whitespace become a single `_` and
/// leading dots are stripped.
///
/// ```
/// use iconcraft_renderer::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Adobe Acrobat Reader"), "Adobe_Acrobat_Reader");
/// assert_eq!(sanitize_filename("..a/b:c"), "abc");
/// ```
pub fn sanitize_filename(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
            continue;
        }
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            in_space = false;
            out.push(c);
        }
    }
    out.trim_start_matches('.').to_string()
}

/// `<sanitized title>_<6 random [a-z0-9]>.png`.
pub fn export_filename(title: &str) -> String {
    export_filename_with_rng(title, &mut rand::thread_rng())
}

/// [`export_filename`] with a caller-supplied random source.
pub fn export_filename_with_rng<R: Rng>(title: &str, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{}_{suffix}.png", stem(title))
}

fn stem(title: &str) -> String {
    let sanitized = sanitize_filename(title);
    if sanitized.is_empty() { "icon".to_string() } else { sanitized }
}

// ============================================================================
// Variants
// ============================================================================

/// The six fixed background/icon color combinations.
///
/// Names read `<background>-<icon>`: `color` is the icon's catalog color,
/// `light` is white and `dark` is black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    ColorLight,
    ColorDark,
    LightColor,
    DarkColor,
    LightDark,
    DarkLight,
}

impl Variant {
    /// Every variant in export order.
    pub const ALL: [Variant; 6] = [
        Variant::ColorLight,
        Variant::ColorDark,
        Variant::LightColor,
        Variant::DarkColor,
        Variant::LightDark,
        Variant::DarkLight,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Variant::ColorLight => "color-light",
            Variant::ColorDark => "color-dark",
            Variant::LightColor => "light-color",
            Variant::DarkColor => "dark-color",
            Variant::LightDark => "light-dark",
            Variant::DarkLight => "dark-light",
        }
    }

    /// `(background, icon)` colors for this variant.
    pub fn colors(self, preferred: &str) -> (&str, &str) {
        match self {
            Variant::ColorLight => (preferred, LIGHT),
            Variant::ColorDark => (preferred, DARK),
            Variant::LightColor => (LIGHT, preferred),
            Variant::DarkColor => (DARK, preferred),
            Variant::LightDark => (LIGHT, DARK),
            Variant::DarkLight => (DARK, LIGHT),
        }
    }
}

// ============================================================================
// Batch results
// ============================================================================

/// One encoded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub filename: String,
    pub png: Vec<u8>,
}

impl ExportedImage {
    /// Writes the PNG into `dir`, returning the full path.
    #[cfg(feature = "fs")]
    pub async fn save(&self, dir: &std::path::Path) -> Result<std::path::PathBuf> {
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.png).await?;
        Ok(path)
    }
}

/// An item of a batch that could not be exported.
#[derive(Debug)]
pub struct BatchFailure {
    pub item: String,
    pub error: Error,
}

/// Outcome of a batch export; failures never abort the batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub exported: Vec<ExportedImage>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    fn record(&mut self, filename: String, result: Result<Vec<u8>>) {
        match result {
            Ok(png) => self.exported.push(ExportedImage { filename, png }),
            Err(error) => {
                warn!("export of {filename} failed: {error}");
                self.failures.push(BatchFailure { item: filename, error });
            }
        }
    }

    /// Whether every item was exported.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Studio exports
// ============================================================================

impl<F: AssetFetcher> Studio<F> {
    /// Encodes the current frame under a fresh randomized name.
    ///
    /// Refuses with [`Error::NoSelection`] while no icon is selected.
    pub fn export_current(&self) -> Result<ExportedImage> {
        let handle = self.require_selection()?;
        Ok(ExportedImage {
            filename: export_filename(handle.title()),
            png: encode_png(&self.render()?)?,
        })
    }

    /// Renders the selected icon in all six [`Variant`]s.
    ///
    /// Outputs are named `<sanitized title>_<suffix>.png`. Parameters and
    /// selection are restored afterwards, whatever failed.
    pub fn export_variants(&mut self) -> Result<BatchReport> {
        let handle = self.require_selection()?;
        let preferred = match self.catalog().find(handle.title()) {
            Ok(record) => record.preferred_color(),
            Err(_) => self.params().icon_color.clone(),
        };
        let saved = self.params().clone();
        let stem = stem(handle.title());

        let mut report = BatchReport::default();
        for variant in Variant::ALL {
            let filename = format!("{stem}_{}.png", variant.suffix());
            let result = self.render_variant(variant, &preferred);
            report.record(filename, result);
        }

        self.restore(saved, Some(handle));
        info!(
            "exported {} variants, {} failed",
            report.exported.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn render_variant(&mut self, variant: Variant, preferred: &str) -> Result<Vec<u8>> {
        let (background, icon) = variant.colors(preferred);
        self.update(|p| {
            p.set_background_theme(ThemeMode::Color);
            p.set_icon_theme(ThemeMode::Color);
            p.set_background_color(background)?;
            p.set_icon_color(icon)
        })?;
        encode_png(&self.render()?)
    }

    /// Loads and renders every icon of the active library in its catalog
    /// color, as `<sanitized title>.png`.
    ///
    /// Parameters and selection are restored afterwards; loads that were in
    /// flight before the batch are invalidated.
    pub async fn export_library(&mut self) -> Result<BatchReport> {
        let titles: Vec<String> = self
            .catalog()
            .active()
            .map(|library| library.icons().iter().map(|r| r.title.clone()).collect())
            .unwrap_or_default();
        let saved_params = self.params().clone();
        let saved_selection = self.selected().cloned();

        self.update(|p| p.set_icon_theme(ThemeMode::Color));
        let mut report = BatchReport::default();
        for title in &titles {
            let filename = format!("{}.png", stem(title));
            let result = self.render_title(title).await;
            report.record(filename, result);
        }

        self.restore(saved_params, saved_selection);
        info!(
            "exported {} of {} library icons",
            report.exported.len(),
            titles.len()
        );
        Ok(report)
    }

    async fn render_title(&mut self, title: &str) -> Result<Vec<u8>> {
        self.select_icon(title).await?;
        encode_png(&self.render()?)
    }
}
