//! Interactive session state: catalog, parameters, selection and rendering.

use std::sync::Arc;

use image::RgbaImage;
use log::{debug, info, warn};

use crate::catalog::Catalog;
use crate::compositor::Compositor;
use crate::error::{Error, Result};
use crate::loader::{AssetFetcher, AssetLoader, LoadTicket, LoadedIcon, RasterHandle};
use crate::params::{CompositorOptions, PipelineParameters, ThemeMode};
use crate::profile::RenderProfile;

// ============================================================================
// Configurable Trait
// ============================================================================

/// Types that can be configured from a [`RenderProfile`].
pub trait Configurable {
    /// Applies a profile's settings to this instance.
    fn apply_profile(&mut self, profile: &RenderProfile) -> Result<()>;

    /// Exports the current settings as a profile.
    fn export_profile(&self) -> RenderProfile;
}

// ============================================================================
// Studio
// ============================================================================

/// One customization session.
///
/// `Studio` owns the parameters and the selected icon, and is the only thing
/// that mutates them. Icon loads are stamped with a generation number; a
/// load that resolves after a newer one was requested is discarded by
/// [`accept`](Self::accept), so a slow stale fetch can never overwrite a fast
/// fresh one.
///
/// Any parameter change that alters the resolved icon color swaps the
/// selected [`RasterHandle`] for a recolored copy that shares the decoded
/// tree; nothing is fetched again.
///
/// # Example
///
/// ```
/// use iconcraft_renderer::{Catalog, Library, MemoryFetcher, Studio};
///
/// # tokio_test_block_on(async {
/// let catalog = Catalog::new().with_library(Library::from_json(
///     "brands",
///     r#"{ "icons": [ { "title": "Dot", "hex": "ff0000", "source": "dot.svg" } ] }"#,
/// )?);
/// let fetcher = MemoryFetcher::new().with_asset(
///     "dot.svg",
///     r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 2 2"><circle cx="1" cy="1" r="1"/></svg>"#,
/// );
///
/// let mut studio = Studio::new(catalog, fetcher);
/// studio.select_icon("Dot").await?;
/// studio.update(|p| p.set_corner_radius(300.0));
///
/// let frame = studio.render()?;
/// assert_eq!(frame.dimensions(), (1024, 1024));
/// # Ok::<(), iconcraft_renderer::Error>(())
/// # }).unwrap();
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct Studio<F> {
    catalog: Catalog,
    params: PipelineParameters,
    compositor: Compositor,
    loader: Arc<AssetLoader<F>>,
    selected: Option<RasterHandle>,
    generation: u64,
    /// Catalog color of the outstanding request, committed on accept.
    pending_color: Option<String>,
}

impl<F: AssetFetcher> Studio<F> {
    pub fn new(catalog: Catalog, fetcher: F) -> Self {
        Self::with_loader(catalog, Arc::new(AssetLoader::new(fetcher)))
    }

    /// Creates a session sharing an existing loader and its cache.
    pub fn with_loader(catalog: Catalog, loader: Arc<AssetLoader<F>>) -> Self {
        Self {
            catalog,
            params: PipelineParameters::default(),
            compositor: Compositor::default(),
            loader,
            selected: None,
            generation: 0,
            pending_color: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn params(&self) -> &PipelineParameters {
        &self.params
    }

    pub fn options(&self) -> &CompositorOptions {
        &self.compositor.options
    }

    pub fn loader(&self) -> Arc<AssetLoader<F>> {
        Arc::clone(&self.loader)
    }

    /// The currently displayed icon, if any.
    pub fn selected(&self) -> Option<&RasterHandle> {
        self.selected.as_ref()
    }

    /// Generation of the most recent load request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ---- Selection ----

    /// Starts selecting `title` from the active library.
    ///
    /// The returned ticket is resolved by [`AssetLoader::load`] and handed
    /// back through [`accept`](Self::accept), which makes the catalog's
    /// preferred color the explicit background and icon color. Until then the
    /// parameters are left alone, so a load that fails or goes stale changes
    /// nothing. An unknown title leaves the session untouched.
    pub fn request_icon(&mut self, title: &str) -> Result<LoadTicket> {
        let record = self.catalog.find(title)?;
        let source = record.source.clone();
        let title = record.title.clone();
        let preferred = record.preferred_color();

        let mut adopted = self.params.clone();
        adopted.set_background_color(&preferred)?;
        adopted.set_icon_color(&preferred)?;
        let color = adopted.resolved_icon_color(self.options()).to_string();

        self.generation += 1;
        self.pending_color = Some(adopted.icon_color);
        debug!("requesting {title} (generation {})", self.generation);

        Ok(LoadTicket {
            generation: self.generation,
            title,
            source,
            color,
        })
    }

    /// Installs a finished load unless a newer request superseded it.
    ///
    /// Returns whether the icon was installed. The icon is recolored if the
    /// parameters changed while it was loading.
    pub fn accept(&mut self, loaded: LoadedIcon) -> bool {
        if loaded.generation != self.generation {
            warn!(
                "discarding stale load of {} (generation {}, current {})",
                loaded.handle.title(),
                loaded.generation,
                self.generation
            );
            return false;
        }

        if let Some(preferred) = self.pending_color.take() {
            self.params.background_color = preferred.clone();
            self.params.icon_color = preferred;
        }

        let color = self.params.resolved_icon_color(self.options());
        let handle = if loaded.handle.color() == color {
            loaded.handle
        } else {
            match loaded.handle.with_color(color) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("keeping load color for {}: {e}", loaded.handle.title());
                    loaded.handle
                }
            }
        };
        info!("selected {}", handle.title());
        self.selected = Some(handle);
        true
    }

    /// Requests, loads and installs `title` in one step.
    ///
    /// On failure the previous selection stays displayed.
    pub async fn select_icon(&mut self, title: &str) -> Result<()> {
        let ticket = self.request_icon(title)?;
        let loaded = self.loader.load(ticket).await?;
        self.accept(loaded);
        Ok(())
    }

    /// Selects an icon from markup already in hand, e.g. a bundled default.
    ///
    /// Any load still in flight is invalidated.
    pub fn select_default_icon(&mut self, title: &str, markup: &str) -> Result<()> {
        let color = self.params.resolved_icon_color(self.options()).to_string();
        let handle = self.loader.load_inline(title, markup, &color)?;
        self.generation += 1;
        self.pending_color = None;
        self.selected = Some(handle);
        Ok(())
    }

    /// Drops the selection; frames render background only.
    pub fn clear_selection(&mut self) {
        self.generation += 1;
        self.pending_color = None;
        self.selected = None;
    }

    // ---- Parameters ----

    /// Mutates the parameters, then recolors the selected icon if needed.
    ///
    /// ```
    /// # use iconcraft_renderer::{Catalog, MemoryFetcher, Studio};
    /// let mut studio = Studio::new(Catalog::new(), MemoryFetcher::new());
    /// studio.update(|p| {
    ///     p.set_icon_scale_percent(80.0);
    ///     p.set_border_width(0.0);
    /// });
    /// assert_eq!(studio.params().icon_scale_percent, 80.0);
    /// ```
    pub fn update<R>(&mut self, f: impl FnOnce(&mut PipelineParameters) -> R) -> R {
        let out = f(&mut self.params);
        self.refresh_selected();
        out
    }

    pub fn set_background_color(&mut self, color: &str) -> Result<()> {
        self.params.set_background_color(color)
    }

    pub fn set_background_theme(&mut self, mode: ThemeMode) {
        self.params.set_background_theme(mode);
    }

    pub fn set_icon_color(&mut self, color: &str) -> Result<()> {
        self.update(|p| p.set_icon_color(color))
    }

    pub fn set_icon_theme(&mut self, mode: ThemeMode) {
        self.update(|p| p.set_icon_theme(mode));
    }

    /// Replaces all parameters at once.
    pub fn set_params(&mut self, params: PipelineParameters) -> Result<()> {
        let params = params.validated()?;
        self.update(|p| *p = params);
        Ok(())
    }

    pub fn set_options(&mut self, options: CompositorOptions) {
        self.compositor.options = options;
        self.refresh_selected();
    }

    /// Swaps the selected handle for one in the current resolved icon color.
    fn refresh_selected(&mut self) {
        let Some(handle) = &self.selected else {
            return;
        };
        let color = self.params.resolved_icon_color(&self.compositor.options);
        if handle.color() == color {
            return;
        }
        match handle.with_color(color) {
            Ok(recolored) => self.selected = Some(recolored),
            Err(e) => warn!("cannot recolor {}: {e}", handle.title()),
        }
    }

    // ---- Rendering ----

    /// Composites the current state into a 1024×1024 frame.
    pub fn render(&self) -> Result<RgbaImage> {
        self.compositor.compose(&self.params, self.selected.as_ref())
    }

    pub(crate) fn restore(&mut self, params: PipelineParameters, selected: Option<RasterHandle>) {
        self.params = params;
        self.selected = selected;
    }

    pub(crate) fn require_selection(&self) -> Result<RasterHandle> {
        self.selected.clone().ok_or(Error::NoSelection)
    }
}

impl<F: AssetFetcher> Configurable for Studio<F> {
    fn apply_profile(&mut self, profile: &RenderProfile) -> Result<()> {
        let params = profile.parameters.clone().validated()?;
        self.compositor.options = profile.options.clone();
        self.update(|p| *p = params);
        Ok(())
    }

    fn export_profile(&self) -> RenderProfile {
        RenderProfile::new()
            .with_parameters(self.params.clone())
            .with_options(self.compositor.options.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Library;
    use crate::loader::MemoryFetcher;

    const DOT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 2 2"><circle cx="1" cy="1" r="1"/></svg>"#;
    const BAR: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 4 1"><rect width="4" height="1"/></svg>"#;

    fn studio() -> Studio<MemoryFetcher> {
        let library = Library::from_json(
            "brands",
            r#"{ "icons": [
                { "title": "Example", "hex": "FF0000", "source": "example.svg" },
                { "title": "Bar", "hex": "00ff00", "source": "bar.svg" },
                { "title": "Broken", "hex": "0000ff", "source": "missing.svg" }
            ] }"#,
        )
        .unwrap();
        let fetcher = MemoryFetcher::new()
            .with_asset("example.svg", DOT)
            .with_asset("bar.svg", BAR);
        Studio::new(Catalog::new().with_library(library), fetcher)
    }

    #[tokio::test]
    async fn selecting_adopts_catalog_color() {
        let mut studio = studio();
        studio.select_icon("Example").await.unwrap();

        let selected = studio.selected().unwrap();
        assert_eq!(selected.title(), "Example");
        assert_eq!(selected.color(), "#ff0000");
        assert_eq!(studio.params().icon_color, "#ff0000");
        assert_eq!(studio.params().background_color, "#ff0000");
    }

    #[tokio::test]
    async fn unknown_title_leaves_session_untouched() {
        let mut studio = studio();
        studio.select_icon("Example").await.unwrap();
        let params = studio.params().clone();
        let generation = studio.generation();

        let err = studio.select_icon("Nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(studio.selected().unwrap().title(), "Example");
        assert_eq!(studio.params(), &params);
        assert_eq!(studio.generation(), generation);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_selection() {
        let mut studio = studio();
        studio.select_icon("Example").await.unwrap();

        let before = studio.params().clone();

        let err = studio.select_icon("Broken").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
        assert_eq!(studio.selected().unwrap().title(), "Example");
        assert_eq!(studio.params(), &before);

        studio.update(|p| p.set_border_width(8.0));
        assert_eq!(studio.selected().unwrap().color(), "#ff0000");
    }

    #[tokio::test]
    async fn stale_load_does_not_adopt_its_colors() {
        let mut studio = studio();
        let loader = studio.loader();

        let slow = studio.request_icon("Example").unwrap();
        let fast = studio.request_icon("Bar").unwrap();
        assert!(studio.accept(loader.load(fast).await.unwrap()));
        assert!(!studio.accept(loader.load(slow).await.unwrap()));

        assert_eq!(studio.params().background_color, "#00ff00");
        assert_eq!(studio.params().icon_color, "#00ff00");
    }

    #[test]
    fn default_icon_with_reused_title_shows_new_artwork() {
        let mut studio = studio();
        studio.select_default_icon("Home", DOT).unwrap();
        studio.select_default_icon("Home", BAR).unwrap();
        assert_eq!(studio.selected().unwrap().intrinsic_size(), (4.0, 1.0));
    }

    #[tokio::test]
    async fn stale_load_is_discarded() {
        let mut studio = studio();
        let loader = studio.loader();

        let slow = studio.request_icon("Example").unwrap();
        let fast = studio.request_icon("Bar").unwrap();

        let fast = loader.load(fast).await.unwrap();
        assert!(studio.accept(fast));

        let slow = loader.load(slow).await.unwrap();
        assert!(!studio.accept(slow));
        assert_eq!(studio.selected().unwrap().title(), "Bar");
    }

    #[tokio::test]
    async fn theme_change_recolors_without_refetch() {
        let mut studio = studio();
        studio.select_icon("Example").await.unwrap();

        studio.set_icon_theme(ThemeMode::Light);
        assert_eq!(studio.selected().unwrap().color(), "#ffffff");

        studio.set_icon_color("#123456").unwrap();
        studio.set_icon_theme(ThemeMode::Color);
        assert_eq!(studio.selected().unwrap().color(), "#123456");

        assert_eq!(studio.loader().fetcher().fetch_count(), 1);
    }

    #[tokio::test]
    async fn accept_applies_color_changed_during_load() {
        let mut studio = studio();
        let loader = studio.loader();
        let ticket = studio.request_icon("Example").unwrap();
        studio.set_icon_theme(ThemeMode::Dark);

        let loaded = loader.load(ticket).await.unwrap();
        assert!(studio.accept(loaded));
        assert_eq!(studio.selected().unwrap().color(), "#000000");
    }

    #[test]
    fn default_icon_invalidates_pending_load() {
        let mut studio = studio();
        let ticket = studio.request_icon("Example").unwrap();
        studio.select_default_icon("Default", DOT).unwrap();
        assert!(ticket.generation < studio.generation());
        assert_eq!(studio.selected().unwrap().title(), "Default");
    }

    #[tokio::test]
    async fn selected_icon_renders_over_explicit_background() {
        let mut studio = studio();
        studio.select_icon("Example").await.unwrap();
        studio.set_background_color("#3498db").unwrap();
        studio.update(|p| {
            p.set_corner_radius(200.0);
            p.set_icon_scale_percent(50.0);
            p.set_background_grain(0.0);
            p.set_icon_grain(0.0);
            p.set_border_width(0.0);
        });

        let frame = studio.render().unwrap();
        assert_eq!(frame.get_pixel(512, 512).0, [255, 0, 0, 255]);
        assert_eq!(frame.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn render_without_selection() {
        let studio = studio();
        let frame = studio.render().unwrap();
        assert_eq!(frame.dimensions(), (1024, 1024));
    }

    #[test]
    fn profile_roundtrip_through_studio() {
        let mut studio = studio();
        let mut profile = studio.export_profile();
        profile.parameters.set_corner_radius(42.0);
        profile.options.gradient_enabled = false;

        studio.apply_profile(&profile).unwrap();
        assert_eq!(studio.params().corner_radius, 42.0);
        assert!(!studio.options().gradient_enabled);
        assert_eq!(studio.export_profile(), profile);
    }
}
