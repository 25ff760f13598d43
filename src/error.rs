//! Error type shared by every stage of the pipeline.

use thiserror::Error;

/// Errors produced while loading, recoloring, compositing or exporting icons.
///
/// None of these are fatal to a session: callers abort the in-flight
/// operation and keep whatever was displayed before.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested title is not part of the active library.
    #[error("no such icon: {title}")]
    NotFound { title: String },

    /// An operation needed a selected icon and there was none.
    #[error("no icon selected")]
    NoSelection,

    /// Retrieving a catalog or vector asset failed.
    #[error("failed to fetch {source_ref}: {message}")]
    Fetch { source_ref: String, message: String },

    /// The vector markup could not be decoded into a renderable tree.
    #[error("failed to decode icon: {0}")]
    Decode(String),

    /// Recoloring could not locate the root `<svg>` element.
    #[error("markup has no recognizable <svg> root")]
    MalformedMarkup,

    /// A color string was not a 6-digit hex color.
    #[error("invalid hex color: {0:?}")]
    InvalidColor(String),

    /// A theme name was not one of `color`, `light` or `dark`.
    #[error("unknown theme mode: {0:?}")]
    InvalidTheme(String),

    /// A catalog or profile document could not be parsed.
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// PNG encoding failed.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// Writing an exported file failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// A raster surface or path could not be constructed.
    #[error("surface error: {0}")]
    Surface(&'static str),
}

impl Error {
    pub(crate) fn fetch(source_ref: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            source_ref: source_ref.into(),
            message: message.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
