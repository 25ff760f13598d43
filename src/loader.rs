//! Asset retrieval and decoding.
//!
//! Icons are fetched once per source, recolored, and decoded into a
//! resolution-independent [`Tree`]. The decoded tree is cached and shared
//! between every [`RasterHandle`] that points at it; changing an icon's color
//! only swaps the tint a handle applies at raster time, so recoloring never
//! hits the network or the filesystem again.
//!
//! Loads are tagged with a generation number by the session that requested
//! them (see [`LoadTicket`]). The loader itself never discards results; the
//! session compares generations when a [`LoadedIcon`] comes back.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;
use log::{debug, warn};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::color::{normalize_hex, parse_hex};
use crate::error::{Error, Result};
use crate::layer::IconRegion;
use crate::layer::surface::{pixmap_to_rgba, tint};
use crate::recolor::recolor_svg;

// ============================================================================
// Fetchers
// ============================================================================

/// Retrieves the raw markup behind a catalog `source` locator.
pub trait AssetFetcher {
    fn fetch(&self, source_ref: &str) -> impl Future<Output = Result<String>>;
}

/// Reads assets from a directory on disk.
#[cfg(feature = "fs")]
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: std::path::PathBuf,
}

#[cfg(feature = "fs")]
impl FsFetcher {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[cfg(feature = "fs")]
impl AssetFetcher for FsFetcher {
    async fn fetch(&self, source_ref: &str) -> Result<String> {
        let path = self.root.join(source_ref);
        debug!("reading asset {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::fetch(source_ref, e))
    }
}

/// Downloads assets over HTTP, resolving relative locators against a base URL.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<String>,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("iconcraft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::fetch("<client>", e))?;
        Ok(Self { client, base_url })
    }

    fn resolve(&self, source_ref: &str) -> String {
        match &self.base_url {
            Some(base) if !source_ref.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                source_ref.trim_start_matches('/')
            ),
            _ => source_ref.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, source_ref: &str) -> Result<String> {
        let url = self.resolve(source_ref);
        debug!("downloading asset {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fetch(source_ref, e))?;

        if !response.status().is_success() {
            return Err(Error::fetch(
                source_ref,
                format!("HTTP status: {}", response.status()),
            ));
        }
        response.text().await.map_err(|e| Error::fetch(source_ref, e))
    }
}

/// Serves assets from memory. Used by the canvas build and by tests.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    assets: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_ref: impl Into<String>, markup: impl Into<String>) {
        self.assets.insert(source_ref.into(), markup.into());
    }

    pub fn with_asset(mut self, source_ref: impl Into<String>, markup: impl Into<String>) -> Self {
        self.insert(source_ref, markup);
        self
    }

    /// Number of fetches served so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl AssetFetcher for MemoryFetcher {
    async fn fetch(&self, source_ref: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.assets
            .get(source_ref)
            .cloned()
            .ok_or_else(|| Error::fetch(source_ref, "not found"))
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Raw markup and decoded trees, keyed by source locator.
#[derive(Default)]
pub struct AssetCache {
    raw: Mutex<HashMap<String, Arc<str>>>,
    decoded: Mutex<HashMap<String, Arc<Tree>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AssetCache {
    pub fn raw(&self, source_ref: &str) -> Option<Arc<str>> {
        lock(&self.raw).get(source_ref).cloned()
    }

    pub fn decoded(&self, source_ref: &str) -> Option<Arc<Tree>> {
        lock(&self.decoded).get(source_ref).cloned()
    }

    fn store_raw(&self, source_ref: &str, markup: Arc<str>) {
        lock(&self.raw).insert(source_ref.to_string(), markup);
    }

    fn store_decoded(&self, source_ref: &str, tree: Arc<Tree>) {
        lock(&self.decoded).insert(source_ref.to_string(), tree);
    }

    /// Number of decoded trees held.
    pub fn len(&self) -> usize {
        lock(&self.decoded).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops everything. Handles already given out keep their trees alive.
    pub fn clear(&self) {
        lock(&self.raw).clear();
        lock(&self.decoded).clear();
    }
}

impl fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCache")
            .field("raw", &lock(&self.raw).len())
            .field("decoded", &lock(&self.decoded).len())
            .finish()
    }
}

// ============================================================================
// RasterHandle
// ============================================================================

/// A decoded icon ready to be drawn in a given color.
///
/// Cloning is cheap: the tree is shared.
#[derive(Clone)]
pub struct RasterHandle {
    title: String,
    color: String,
    tree: Arc<Tree>,
}

impl RasterHandle {
    fn new(title: String, color: String, tree: Arc<Tree>) -> Self {
        Self { title, color, tree }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The tint applied when rasterizing, as `#rrggbb`.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Intrinsic size of the decoded icon.
    pub fn intrinsic_size(&self) -> (f32, f32) {
        let size = self.tree.size();
        (size.width(), size.height())
    }

    /// The same icon in another color, sharing the decoded tree.
    pub fn with_color(&self, color: &str) -> Result<Self> {
        Ok(Self::new(
            self.title.clone(),
            normalize_hex(color)?,
            Arc::clone(&self.tree),
        ))
    }

    /// Renders the icon onto a transparent `canvas`×`canvas` image.
    ///
    /// The icon is scaled uniformly so its larger side fills `region` and is
    /// centered along the other axis. Every visible pixel is tinted with the
    /// handle's color, anti-aliased coverage kept.
    pub fn rasterize(&self, canvas: u32, region: IconRegion) -> Result<RgbaImage> {
        let mut pixmap =
            Pixmap::new(canvas, canvas).ok_or(Error::Surface("zero-sized icon surface"))?;

        let (width, height) = self.intrinsic_size();
        let scale = region.size / width.max(height);
        let tx = region.x + (region.size - width * scale) / 2.0;
        let ty = region.y + (region.size - height * scale) / 2.0;
        let transform = Transform::from_scale(scale, scale).post_translate(tx, ty);
        resvg::render(&self.tree, transform, &mut pixmap.as_mut());

        let mut img = pixmap_to_rgba(&pixmap);
        tint(&mut img, parse_hex(&self.color)?);
        Ok(img)
    }
}

impl fmt::Debug for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterHandle")
            .field("title", &self.title)
            .field("color", &self.color)
            .field("size", &self.intrinsic_size())
            .finish()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// A request to load one icon, stamped with the requester's generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub title: String,
    pub source: String,
    pub color: String,
}

/// The result of a [`LoadTicket`].
#[derive(Debug, Clone)]
pub struct LoadedIcon {
    pub generation: u64,
    pub handle: RasterHandle,
}

/// Recolors and decodes `markup`.
///
/// Markup the recolorer cannot make sense of is decoded as-is; the color is
/// still applied as a tint when rasterizing.
fn decode(markup: &str, color: &str) -> Result<Arc<Tree>> {
    let markup = match recolor_svg(markup, color) {
        Ok(recolored) => Cow::Owned(recolored),
        Err(Error::MalformedMarkup) => {
            warn!("recoloring skipped, markup has no recognizable root");
            Cow::Borrowed(markup)
        }
        Err(e) => return Err(e),
    };
    let tree =
        Tree::from_str(&markup, &Options::default()).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(Arc::new(tree))
}

/// Decodes markup that is already in hand, bypassing any fetcher or cache.
pub fn decode_inline(title: &str, markup: &str, color: &str) -> Result<RasterHandle> {
    let color = normalize_hex(color)?;
    let tree = decode(markup, &color)?;
    Ok(RasterHandle::new(title.to_string(), color, tree))
}

fn inline_key(markup: &str) -> String {
    let mut hasher = DefaultHasher::new();
    markup.hash(&mut hasher);
    format!("inline:{:016x}", hasher.finish())
}

/// Fetches and decodes icons through an [`AssetFetcher`], caching both steps.
pub struct AssetLoader<F> {
    fetcher: F,
    cache: AssetCache,
}

impl<F: AssetFetcher> AssetLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache: AssetCache::default(),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Loads the icon named by `ticket`.
    ///
    /// A cached decoded tree is reused regardless of the ticket's color.
    pub async fn load(&self, ticket: LoadTicket) -> Result<LoadedIcon> {
        let color = normalize_hex(&ticket.color)?;
        let tree = match self.cache.decoded(&ticket.source) {
            Some(tree) => {
                debug!("decoded cache hit for {}", ticket.source);
                tree
            }
            None => {
                let raw = self.fetch_raw(&ticket.source).await?;
                let tree = decode(&raw, &color)?;
                self.cache.store_decoded(&ticket.source, Arc::clone(&tree));
                tree
            }
        };

        Ok(LoadedIcon {
            generation: ticket.generation,
            handle: RasterHandle::new(ticket.title, color, tree),
        })
    }

    /// Decodes in-hand markup, caching the tree by the markup's content.
    ///
    /// Titles are not part of the key: two libraries may both carry a
    /// "Home" icon with different artwork.
    pub fn load_inline(&self, title: &str, markup: &str, color: &str) -> Result<RasterHandle> {
        let key = inline_key(markup);
        let color = normalize_hex(color)?;
        let tree = match self.cache.decoded(&key) {
            Some(tree) => tree,
            None => {
                let tree = decode(markup, &color)?;
                self.cache.store_decoded(&key, Arc::clone(&tree));
                tree
            }
        };
        Ok(RasterHandle::new(title.to_string(), color, tree))
    }

    async fn fetch_raw(&self, source_ref: &str) -> Result<Arc<str>> {
        if let Some(raw) = self.cache.raw(source_ref) {
            return Ok(raw);
        }
        let markup: Arc<str> = self.fetcher.fetch(source_ref).await?.into();
        self.cache.store_raw(source_ref, Arc::clone(&markup));
        Ok(markup)
    }
}

impl<F> fmt::Debug for AssetLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLoader")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 20 10"><rect fill="#123456" width="20" height="10"/></svg>"##;

    fn ticket(generation: u64, color: &str) -> LoadTicket {
        LoadTicket {
            generation,
            title: "Box".into(),
            source: "icons/box.svg".into(),
            color: color.into(),
        }
    }

    fn loader() -> AssetLoader<MemoryFetcher> {
        AssetLoader::new(MemoryFetcher::new().with_asset("icons/box.svg", BOX))
    }

    #[tokio::test]
    async fn load_fetches_once_per_source() {
        let loader = loader();
        let first = loader.load(ticket(1, "#ff0000")).await.unwrap();
        let second = loader.load(ticket(2, "#00ff00")).await.unwrap();

        assert_eq!(loader.fetcher().fetch_count(), 1);
        assert_eq!(loader.cache().len(), 1);
        assert_eq!(first.generation, 1);
        assert_eq!(second.generation, 2);
        assert_eq!(second.handle.color(), "#00ff00");
    }

    #[tokio::test]
    async fn missing_asset_is_a_fetch_error() {
        let loader = AssetLoader::new(MemoryFetcher::new());
        let err = loader.load(ticket(1, "#ff0000")).await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
        assert!(loader.cache().is_empty());
    }

    #[tokio::test]
    async fn undecodable_markup_is_a_decode_error() {
        let loader =
            AssetLoader::new(MemoryFetcher::new().with_asset("icons/box.svg", "definitely not markup"));
        let err = loader.load(ticket(1, "#ff0000")).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn cleared_cache_fetches_again() {
        let loader = loader();
        loader.load(ticket(1, "#ff0000")).await.unwrap();
        loader.cache().clear();
        loader.load(ticket(2, "#ff0000")).await.unwrap();
        assert_eq!(loader.fetcher().fetch_count(), 2);
    }

    #[test]
    fn rasterize_keeps_aspect_and_centers() {
        let handle = decode_inline("Box", BOX, "#00ff00").unwrap();
        assert_eq!(handle.intrinsic_size(), (20.0, 10.0));

        let region = IconRegion { x: 0.0, y: 0.0, size: 100.0 };
        let img = handle.rasterize(100, region).unwrap();

        // 20x10 fitted into 100x100 becomes 100x50, centered vertically.
        assert_eq!(img.get_pixel(50, 50).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(50, 10)[3], 0);
        assert_eq!(img.get_pixel(50, 90)[3], 0);
        assert_eq!(img.get_pixel(1, 30)[3], 255);
    }

    #[test]
    fn with_color_shares_tree_and_changes_tint() {
        let red = decode_inline("Box", BOX, "#ff0000").unwrap();
        let blue = red.with_color("0000FF").unwrap();
        assert!(Arc::ptr_eq(&red.tree, &blue.tree));
        assert_eq!(blue.color(), "#0000ff");

        let region = IconRegion { x: 0.0, y: 0.0, size: 40.0 };
        let img = blue.rasterize(40, region).unwrap();
        assert_eq!(img.get_pixel(20, 20).0, [0, 0, 255, 255]);
    }

    #[test]
    fn with_color_rejects_bad_color() {
        let handle = decode_inline("Box", BOX, "#ff0000").unwrap();
        assert!(matches!(handle.with_color("red"), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn load_inline_is_cached_by_content() {
        let loader = AssetLoader::new(MemoryFetcher::new());
        let a = loader.load_inline("Default", BOX, "#ff0000").unwrap();
        let b = loader.load_inline("Default", BOX, "#0000ff").unwrap();
        assert!(Arc::ptr_eq(&a.tree, &b.tree));
        assert_eq!(loader.fetcher().fetch_count(), 0);
    }

    #[test]
    fn same_title_with_new_markup_decodes_again() {
        const WIDE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 4 1"><rect width="4" height="1"/></svg>"#;
        let loader = AssetLoader::new(MemoryFetcher::new());
        let first = loader.load_inline("Home", BOX, "#ff0000").unwrap();
        let second = loader.load_inline("Home", WIDE, "#ff0000").unwrap();

        assert!(!Arc::ptr_eq(&first.tree, &second.tree));
        assert_eq!(second.intrinsic_size(), (4.0, 1.0));
        assert_eq!(loader.cache().len(), 2);
    }
}
