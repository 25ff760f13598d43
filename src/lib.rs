//! iconcraft-renderer: icon compositing and recoloring pipeline
//!
//! This crate turns a single-color vector icon and a handful of appearance
//! parameters into a finished 1024×1024 app-icon style raster: a rounded,
//! gradient-lit background, the recolored icon with a soft shadow, film-like
//! grain, and a gradient border.
//!
//! # Example
//!
//! ```
//! use iconcraft_renderer::{Compositor, PipelineParameters, decode_inline};
//!
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
//!     <path d="M12 2l10 20H2z"/>
//! </svg>"#;
//! let icon = decode_inline("Triangle", svg, "#ffffff").unwrap();
//!
//! let mut params = PipelineParameters::default();
//! params.set_background_color("#e74c3c").unwrap();
//! params.set_corner_radius(200.0);
//!
//! let frame = Compositor::default().compose(&params, Some(&icon)).unwrap();
//! assert_eq!(frame.dimensions(), (1024, 1024));
//! ```
//!
//! # Sessions
//!
//! [`Studio`] ties a [`Catalog`], an [`AssetLoader`] and the parameters
//! together: selecting icons by title, recoloring on theme changes without
//! refetching, discarding stale loads, and exporting PNGs and variant
//! batches.
//!
//! # Serializable Profiles
//!
//! Settings travel as a [`RenderProfile`] through the [`Configurable`] trait:
//!
//! ```
//! use iconcraft_renderer::{Catalog, Configurable, MemoryFetcher, RenderProfile, Studio};
//!
//! let mut studio = Studio::new(Catalog::new(), MemoryFetcher::new());
//! let profile = RenderProfile::from_json(r#"{ "parameters": { "borderWidth": 0 } }"#).unwrap();
//! studio.apply_profile(&profile).unwrap();
//!
//! let json = studio.export_profile().to_json().unwrap();
//! assert!(json.contains("\"borderWidth\":0.0"));
//! ```

mod catalog;
mod color;
mod compositor;
mod error;
mod export;
mod layer;
mod loader;
mod params;
mod profile;
mod recolor;
mod studio;

#[cfg(feature = "canvas")]
mod canvas;

pub use catalog::{Catalog, IconRecord, Library};
pub use color::{adjust_color, normalize_hex, parse_hex, to_hex};
pub use compositor::Compositor;
pub use error::{Error, Result};
pub use export::{
    BatchFailure, BatchReport, ExportedImage, Variant, encode_png, export_filename,
    export_filename_with_rng, sanitize_filename,
};
pub use layer::surface::{ShadowStyle, composite_over, drop_shadow, tint};
pub use layer::{
    FrameContext, IconRegion, LayerEffect, add_grain, add_grain_with_rng, clamp_radius,
    rounded_rect_path,
};
pub use loader::{
    AssetCache, AssetFetcher, AssetLoader, LoadTicket, LoadedIcon, MemoryFetcher, RasterHandle,
    decode_inline,
};
#[cfg(feature = "fs")]
pub use loader::FsFetcher;
#[cfg(feature = "http")]
pub use loader::HttpFetcher;
pub use params::{
    CANVAS_SIZE, CompositorOptions, MAX_CORNER_RADIUS, PipelineParameters, ThemeMode, ThemePalette,
};
pub use profile::RenderProfile;
pub use recolor::recolor_svg;
pub use studio::{Configurable, Studio};

#[cfg(feature = "canvas")]
pub use canvas::CanvasRenderer;
