//! The chain of coordinate spaces between the flamechart and the screen.
//!
//! ```text
//!   config ──▶ world ──▶ view ──┬──▶ NDC       (rectangle pass, GPU uniform)
//!   (time ×    (pixels,  (canvas │
//!    depth)    whole     pixels) └──▶ overlay  (label pass, device pixels)
//!              chart)
//! ```

use flamechart_protocol::{AffineTransform, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// The drawing surface: canvas size in view-space (logical) pixels plus the
/// device pixel ratio used for the text overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// `[0, 0] – [width, height]` in view space.
    pub fn view_rect(&self) -> Rect {
        Rect::new(Vec2::ZERO, self.size())
    }

    /// The full overlay canvas in device pixels.
    pub fn overlay_rect(&self) -> Rect {
        Rect::new(Vec2::ZERO, self.size() * self.device_pixel_ratio)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.device_pixel_ratio > 0.0)
    }
}

/// Scale time by `surface_width / duration` and depth by `frame_height`.
pub fn config_space_to_world_space(
    surface_width: f64,
    duration: f64,
    frame_height: f64,
) -> AffineTransform {
    AffineTransform::scale(Vec2::new(surface_width / duration, frame_height))
}

/// Map the viewport rectangle (world space) onto the whole canvas.
pub fn world_space_to_view_space(viewport: &Rect, surface: &Surface) -> AffineTransform {
    AffineTransform::between_rects(viewport, &surface.view_rect())
}

/// Flip y (screen origin is top-left, NDC is bottom-left) and map the canvas
/// onto `[-1, 1]²`.
pub fn view_space_to_ndc(surface: &Surface) -> AffineTransform {
    let flipped = AffineTransform::scale(Vec2::new(1.0, -1.0));
    let flipped_canvas = flipped.transform_rect(&surface.view_rect());
    AffineTransform::between_rects(&flipped_canvas, &Rect::NDC).times(&flipped)
}

pub fn view_space_to_overlay_space(surface: &Surface) -> AffineTransform {
    AffineTransform::scale(Vec2::UNIT * surface.device_pixel_ratio)
}

/// Every transform needed for one redraw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceTransforms {
    pub config_space_to_world_space: AffineTransform,
    pub world_space_to_view_space: AffineTransform,
    pub view_space_to_ndc: AffineTransform,
    pub view_space_to_overlay_space: AffineTransform,
}

impl SpaceTransforms {
    pub fn new(surface: &Surface, viewport: &Rect, duration: f64, frame_height: f64) -> Self {
        Self {
            config_space_to_world_space: config_space_to_world_space(
                surface.width,
                duration,
                frame_height,
            ),
            world_space_to_view_space: world_space_to_view_space(viewport, surface),
            view_space_to_ndc: view_space_to_ndc(surface),
            view_space_to_overlay_space: view_space_to_overlay_space(surface),
        }
    }

    pub fn config_space_to_view_space(&self) -> AffineTransform {
        self.world_space_to_view_space
            .times(&self.config_space_to_world_space)
    }

    /// Fed to the rectangle pass as its only uniform.
    pub fn config_space_to_ndc(&self) -> AffineTransform {
        self.view_space_to_ndc
            .times(&self.config_space_to_view_space())
    }

    /// Used to place labels on the overlay.
    pub fn config_space_to_overlay_space(&self) -> AffineTransform {
        self.view_space_to_overlay_space
            .times(&self.config_space_to_view_space())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn surface() -> Surface {
        Surface::new(800.0, 600.0, 2.0)
    }

    #[test]
    fn ndc_flips_y() {
        let t = view_space_to_ndc(&surface());
        assert!(t.transform_position(Vec2::ZERO).approx_eq(Vec2::new(-1.0, 1.0), EPS));
        assert!(
            t.transform_position(Vec2::new(800.0, 600.0))
                .approx_eq(Vec2::new(1.0, -1.0), EPS)
        );
        assert!(
            t.transform_position(Vec2::new(400.0, 300.0))
                .approx_eq(Vec2::ZERO, EPS)
        );
    }

    #[test]
    fn full_viewport_maps_whole_duration_across_canvas() {
        let s = surface();
        let viewport = Rect::from_xywh(0.0, 0.0, 800.0, 600.0);
        let t = SpaceTransforms::new(&s, &viewport, 50.0, 16.0);

        let to_view = t.config_space_to_view_space();
        assert!(to_view.transform_position(Vec2::new(50.0, 2.0)).approx_eq(Vec2::new(800.0, 32.0), EPS));

        let to_ndc = t.config_space_to_ndc();
        assert!(to_ndc.transform_position(Vec2::ZERO).approx_eq(Vec2::new(-1.0, 1.0), EPS));
        assert!(
            to_ndc
                .transform_position(Vec2::new(50.0, 0.0))
                .approx_eq(Vec2::new(1.0, 1.0), EPS)
        );
    }

    #[test]
    fn overlay_is_view_scaled_by_device_pixel_ratio() {
        let s = surface();
        let viewport = Rect::from_xywh(100.0, 0.0, 400.0, 600.0);
        let t = SpaceTransforms::new(&s, &viewport, 800.0, 16.0);
        let view = t.config_space_to_view_space().transform_position(Vec2::new(300.0, 1.0));
        let overlay = t.config_space_to_overlay_space().transform_position(Vec2::new(300.0, 1.0));
        assert!(overlay.approx_eq(view * 2.0, EPS));
        // Viewport starts at world x = 100 and is half as wide as the canvas.
        assert!(view.approx_eq(Vec2::new(400.0, 16.0), EPS));
    }

    #[test]
    fn degenerate_surfaces() {
        assert!(Surface::new(0.0, 10.0, 1.0).is_degenerate());
        assert!(Surface::new(10.0, 10.0, 0.0).is_degenerate());
        assert!(!surface().is_degenerate());
    }
}
