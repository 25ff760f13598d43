//! The fixed-order frame compositor.

use image::RgbaImage;
use log::trace;

use crate::error::Result;
use crate::layer::surface::pixmap_to_rgba;
use crate::layer::{
    BackgroundClip, BackgroundFill, BackgroundGrain, BorderStroke, BorderUndercoat, FrameContext,
    GradientLighting, IconLayer, LayerEffect, ReleaseClip,
};
use crate::loader::RasterHandle;
use crate::params::{CompositorOptions, PipelineParameters};

/// Stages in drawing order, after the canvas is cleared.
const STAGES: [&dyn LayerEffect; 8] = [
    &BorderUndercoat,
    &BackgroundClip,
    &BackgroundFill,
    &GradientLighting,
    &IconLayer,
    &ReleaseClip,
    &BackgroundGrain,
    &BorderStroke,
];

/// Renders complete 1024×1024 frames.
///
/// Every call to [`compose`](Self::compose) starts from a transparent canvas
/// and draws all stages; nothing is carried over between frames. Grain is
/// freshly random each time, so two frames with identical inputs differ in
/// their noise.
///
/// # Example
///
/// ```
/// use iconcraft_renderer::{Compositor, PipelineParameters};
///
/// let compositor = Compositor::default();
/// let frame = compositor.compose(&PipelineParameters::default(), None).unwrap();
/// assert_eq!(frame.dimensions(), (1024, 1024));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    /// Deployment switches applied to every frame.
    pub options: CompositorOptions,
}

impl Compositor {
    pub fn new(options: CompositorOptions) -> Self {
        Self { options }
    }

    /// Composites one frame from `params` and the optional selected icon.
    pub fn compose(
        &self,
        params: &PipelineParameters,
        icon: Option<&RasterHandle>,
    ) -> Result<RgbaImage> {
        let mut ctx = FrameContext::new(params, &self.options, icon)?;
        for stage in STAGES {
            trace!("compositing stage {}", stage.name());
            stage.apply(&mut ctx)?;
        }
        Ok(pixmap_to_rgba(&ctx.pixmap))
    }
}
