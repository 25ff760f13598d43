//! Frame stages for the icon compositor.
//!
//! A frame is built by running a fixed sequence of stages over a shared
//! [`FrameContext`]. Each stage implements [`LayerEffect`] and decides on its
//! own whether its prerequisites are present (no selected icon, no border,
//! gradients disabled); a stage that has nothing to do leaves the context
//! untouched.
//!
//! # Stage order
//!
//! ```text
//! clear + resolve background color   (FrameContext::new)
//!     │
//!     ▼
//! BorderUndercoat ─► BackgroundClip ─► BackgroundFill ─► GradientLighting
//!                                                              │
//!     ┌────────────────────────────────────────────────────────┘
//!     ▼
//! IconLayer ─► ReleaseClip ─► BackgroundGrain ─► BorderStroke
//! ```

pub mod background;
pub mod border;
pub mod grain;
pub mod icon;
pub mod shape;
pub mod surface;

pub use background::{BackgroundClip, BackgroundFill, GradientLighting, ReleaseClip};
pub use border::{BorderStroke, BorderUndercoat};
pub use grain::{BackgroundGrain, add_grain, add_grain_with_rng};
pub use icon::{IconLayer, IconRegion};
pub use shape::{clamp_radius, rounded_rect_path};

use palette::Srgb;
use resvg::tiny_skia::{Mask, Pixmap};

use crate::color::parse_hex;
use crate::error::{Error, Result};
use crate::loader::RasterHandle;
use crate::params::{CANVAS_SIZE, CompositorOptions, PipelineParameters};

// ============================================================================
// Frame Context
// ============================================================================

/// State that flows through the stages of one frame.
pub struct FrameContext<'a> {
    /// The surface being composited.
    pub pixmap: Pixmap,

    /// Active clip region, if any stage established one.
    pub clip: Option<Mask>,

    pub params: &'a PipelineParameters,
    pub options: &'a CompositorOptions,

    /// The selected icon, if any.
    pub icon: Option<&'a RasterHandle>,

    /// Resolved background color as `#rrggbb`.
    pub background_hex: String,
    pub background: Srgb<u8>,
}

impl<'a> FrameContext<'a> {
    /// Allocates a cleared canvas and resolves the background color.
    pub fn new(
        params: &'a PipelineParameters,
        options: &'a CompositorOptions,
        icon: Option<&'a RasterHandle>,
    ) -> Result<Self> {
        let pixmap =
            Pixmap::new(CANVAS_SIZE, CANVAS_SIZE).ok_or(Error::Surface("canvas allocation failed"))?;
        let background_hex = params.resolved_background_color(options).to_string();
        let background = parse_hex(&background_hex)?;

        Ok(Self {
            pixmap,
            clip: None,
            params,
            options,
            icon,
            background_hex,
            background,
        })
    }

    /// Canvas side length in pixels.
    pub fn size(&self) -> f32 {
        CANVAS_SIZE as f32
    }

    /// Border width, never wider than half the canvas.
    pub fn border_width(&self) -> f32 {
        self.params.border_width.clamp(0.0, self.size() / 2.0)
    }
}

// ============================================================================
// Layer Trait
// ============================================================================

/// One stage of the frame.
pub trait LayerEffect {
    /// Short name used in trace logging.
    fn name(&self) -> &'static str;

    /// Draws this stage into the context.
    fn apply(&self, ctx: &mut FrameContext<'_>) -> Result<()>;
}
