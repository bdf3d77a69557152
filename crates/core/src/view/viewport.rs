use flamechart_protocol::{AffineTransform, Rect, Vec2};

/// The visible window into world space.
///
/// Every mutation goes through [`Viewport::clamp`], so the rectangle never
/// scrolls past the content and never gets narrower than `min_width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    rect: Rect,
    world_size: Vec2,
    min_width: f64,
}

impl Viewport {
    /// A viewport showing the whole world width, `height` tall, anchored at
    /// the top-left corner.
    pub fn new(world_size: Vec2, height: f64, min_width: f64) -> Self {
        let mut viewport = Self {
            rect: Rect::new(Vec2::ZERO, Vec2::new(world_size.x, height)),
            world_size,
            min_width,
        };
        viewport.clamp();
        viewport
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn world_size(&self) -> Vec2 {
        self.world_size
    }

    /// Replace the rectangle (e.g. to restore a zoom level), then clamp.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
        self.clamp();
    }

    /// Re-derive bounds after the surface changed size. The viewport keeps
    /// its horizontal position and width as fractions of the world, and takes
    /// `height` as its new height.
    pub fn resize(&mut self, world_size: Vec2, height: f64) {
        let fraction = |v: f64, total: f64| if total > 0.0 { v / total } else { 0.0 };
        let x0 = fraction(self.rect.left(), self.world_size.x);
        let w = if self.world_size.x > 0.0 {
            fraction(self.rect.width(), self.world_size.x)
        } else {
            1.0
        };
        self.world_size = world_size;
        self.rect = Rect::new(
            Vec2::new(x0 * world_size.x, self.rect.top()),
            Vec2::new(w * world_size.x, height),
        );
        self.clamp();
    }

    /// Translate by a view-space delta. Skipped when `world_to_view` cannot
    /// be inverted.
    pub fn pan(&mut self, view_delta: Vec2, world_to_view: &AffineTransform) -> bool {
        let Some(world_delta) = world_to_view.inverse_transform_vector(view_delta) else {
            tracing::warn!(?view_delta, "pan skipped: world-to-view transform is singular");
            return false;
        };
        self.rect = self.rect.with_origin(self.rect.origin + world_delta);
        self.clamp();
        true
    }

    /// Scale the x-axis by `multiplier` around a view-space focal point.
    /// Depth is never zoomed.
    pub fn zoom(&mut self, view_focus: Vec2, multiplier: f64, world_to_view: &AffineTransform) -> bool {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            tracing::warn!(multiplier, "zoom skipped: degenerate multiplier");
            return false;
        }
        let Some(world_focus) = world_to_view.inverse_transform_position(view_focus) else {
            tracing::warn!(?view_focus, "zoom skipped: world-to-view transform is singular");
            return false;
        };
        let zoom = AffineTransform::translation(-world_focus)
            .then_scale(Vec2::new(multiplier, 1.0))
            .then_translate(world_focus);
        self.rect = zoom.transform_rect(&self.rect);
        self.clamp();
        true
    }

    /// Width into `[min_width, world width]`, then the origin into
    /// `[0, world - size]` per axis. Idempotent.
    pub fn clamp(&mut self) {
        let max_width = self.world_size.x.max(self.min_width);
        let width = self.rect.width().clamp(self.min_width, max_width);
        let size = self.rect.size.with_x(width);

        let scrollable = Rect::new(Vec2::ZERO, (self.world_size - size).max(Vec2::ZERO));
        let origin = scrollable.closest_point_to(self.rect.origin);

        self.rect = Rect::new(origin, size);
    }
}
