//! A mounted flamechart: chart data, surface, viewport and both draw passes.

use std::sync::Arc;

use flamechart_protocol::{Rect, RenderCommand, Vec2};

use crate::config::ChartConfig;
use crate::flamechart::{Flamechart, FlamechartFrame};
use crate::render::{LabelRenderer, RectangleBackend, RectangleRenderer, TextMeasurer};
use crate::view::{Gesture, InteractionEvent, SpaceTransforms, Surface, Viewport};

#[derive(Debug)]
struct Mounted {
    surface: Surface,
    viewport: Viewport,
}

/// Interactive view over one [`Flamechart`].
///
/// Lifecycle: [`attach`](Self::attach) once a drawing surface exists (uploads
/// the rectangle batch and builds labels), [`render`](Self::render) on every
/// redraw, [`resize`](Self::resize) when the surface changes size and
/// [`detach`](Self::detach) when it goes away. Until attached, rendering and
/// gestures are no-ops.
#[derive(Debug)]
pub struct FlamechartView {
    chart: Arc<Flamechart>,
    config: ChartConfig,
    mounted: Option<Mounted>,
    rects: RectangleRenderer,
    labels: LabelRenderer,
}

impl FlamechartView {
    pub fn new(chart: impl Into<Arc<Flamechart>>, config: ChartConfig) -> Self {
        let labels = LabelRenderer::new(config.label_font_size, config.label_padding);
        Self {
            chart: chart.into(),
            config,
            mounted: None,
            rects: RectangleRenderer::new(),
            labels,
        }
    }

    pub fn chart(&self) -> &Arc<Flamechart> {
        &self.chart
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<Surface> {
        self.mounted.as_ref().map(|m| m.surface)
    }

    /// The viewport in world space, when attached.
    pub fn viewport(&self) -> Option<Rect> {
        self.mounted.as_ref().map(|m| m.viewport.rect())
    }

    pub fn is_attached(&self) -> bool {
        self.mounted.is_some()
    }

    /// Whether the rectangle batch made it onto the backend.
    pub fn is_uploaded(&self) -> bool {
        self.rects.is_prepared()
    }

    /// Duration used for the config → world scale. A zero-length chart is
    /// laid out as if it were one unit long.
    fn layout_duration(&self) -> f64 {
        let d = self.chart.duration();
        if d > 0.0 && d.is_finite() { d } else { 1.0 }
    }

    fn world_size(&self, surface: &Surface) -> Vec2 {
        Vec2::new(
            surface.width,
            self.chart.layer_count() as f64 * self.config.frame_height,
        )
    }

    /// Mount onto `surface` and upload the rectangle batch to `backend`.
    ///
    /// A degenerate surface leaves the view detached. Upload failures are
    /// returned, but the view stays attached: labels and gestures keep
    /// working with no rectangles drawn.
    pub fn attach<B: RectangleBackend + ?Sized>(
        &mut self,
        surface: Surface,
        backend: &mut B,
    ) -> Result<(), B::Error> {
        if surface.is_degenerate() {
            tracing::warn!(?surface, "not attaching to a degenerate surface");
            self.detach();
            return Ok(());
        }
        let viewport = Viewport::new(
            self.world_size(&surface),
            surface.height,
            self.config.min_viewport_width,
        );
        self.mounted = Some(Mounted { surface, viewport });
        self.labels.prepare(&self.chart);
        tracing::debug!(?surface, layers = self.chart.layer_count(), "attached flamechart view");
        self.rects.prepare(&self.chart, backend)
    }

    /// New canvas size. The vertex batch is in config space and is not
    /// rebuilt.
    pub fn resize(&mut self, surface: Surface) {
        if surface.is_degenerate() {
            tracing::trace!(?surface, "ignoring resize to a degenerate surface");
            return;
        }
        let world = self.world_size(&surface);
        if let Some(mounted) = self.mounted.as_mut()
            && mounted.surface != surface
        {
            mounted.viewport.resize(world, surface.height);
            mounted.surface = surface;
        }
    }

    pub fn detach(&mut self) {
        if self.mounted.take().is_some() {
            tracing::debug!("detached flamechart view");
        }
        self.rects.reset();
        self.labels.clear();
    }

    pub fn transforms(&self) -> Option<SpaceTransforms> {
        let mounted = self.mounted.as_ref()?;
        Some(SpaceTransforms::new(
            &mounted.surface,
            &mounted.viewport.rect(),
            self.layout_duration(),
            self.config.frame_height,
        ))
    }

    pub fn handle_interaction(&mut self, event: &InteractionEvent) -> bool {
        match event.gesture() {
            Some(Gesture::Pan(delta)) => self.pan(delta),
            Some(Gesture::Zoom { focus, multiplier }) => self.zoom(focus, multiplier),
            None => false,
        }
    }

    /// Pan by a view-space displacement. Returns whether anything moved.
    pub fn pan(&mut self, view_delta: Vec2) -> bool {
        let Some(transforms) = self.transforms() else {
            return false;
        };
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };
        let before = mounted.viewport.rect();
        mounted
            .viewport
            .pan(view_delta, &transforms.world_space_to_view_space);
        tracing::trace!(?view_delta, viewport = ?mounted.viewport.rect(), "pan");
        mounted.viewport.rect() != before
    }

    /// Zoom the time axis around a view-space point. `multiplier < 1` zooms
    /// in.
    pub fn zoom(&mut self, view_focus: Vec2, multiplier: f64) -> bool {
        let Some(transforms) = self.transforms() else {
            return false;
        };
        let Some(mounted) = self.mounted.as_mut() else {
            return false;
        };
        let before = mounted.viewport.rect();
        mounted
            .viewport
            .zoom(view_focus, multiplier, &transforms.world_space_to_view_space);
        tracing::trace!(?view_focus, multiplier, viewport = ?mounted.viewport.rect(), "zoom");
        mounted.viewport.rect() != before
    }

    /// Show the whole chart width again.
    pub fn reset_zoom(&mut self) {
        if let Some(mounted) = self.mounted.as_mut() {
            let rect = mounted.viewport.rect();
            mounted.viewport.set_rect(Rect::new(
                Vec2::new(0.0, rect.top()),
                rect.size.with_x(mounted.viewport.world_size().x),
            ));
        }
    }

    /// The interval under a view-space point.
    pub fn frame_at(&self, view_position: Vec2) -> Option<&FlamechartFrame> {
        let config = self
            .transforms()?
            .config_space_to_view_space()
            .inverse_transform_position(view_position)?;
        self.chart.interval_at(config)
    }

    /// Draw the rectangle pass on `backend` and return the label overlay.
    pub fn render<B: RectangleBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        measurer: &mut dyn TextMeasurer,
    ) -> Vec<RenderCommand> {
        let Some(transforms) = self.transforms() else {
            return Vec::new();
        };
        let Some(surface) = self.surface() else {
            return Vec::new();
        };
        self.rects.draw(backend, &transforms.config_space_to_ndc());
        self.labels.render(&transforms, &surface, measurer)
    }
}
