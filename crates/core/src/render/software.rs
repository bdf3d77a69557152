use std::convert::Infallible;

use flamechart_protocol::{AffineTransform, Color, Rect, RenderCommand, Vec2};

use super::rects::{RectVertex, RectangleBackend, VERTICES_PER_RECT};
use crate::view::{Surface, view_space_to_ndc};

/// CPU stand-in for the GPU rectangle pass.
///
/// Keeps the uploaded vertices, and on every draw maps them back from NDC
/// into view space and records one `DrawRect` per visible rectangle.
#[derive(Debug, Clone)]
pub struct SoftwareRasterizer {
    surface: Surface,
    vertices: Vec<RectVertex>,
    commands: Vec<RenderCommand>,
    draw_calls: usize,
}

impl SoftwareRasterizer {
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            vertices: Vec::new(),
            commands: Vec::new(),
            draw_calls: 0,
        }
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    /// Rectangles recorded by the most recent draw, in view space.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }
}

impl RectangleBackend for SoftwareRasterizer {
    type Error = Infallible;

    fn upload(&mut self, vertices: &[RectVertex]) -> Result<(), Infallible> {
        self.vertices = vertices.to_vec();
        Ok(())
    }

    fn draw(&mut self, config_space_to_ndc: &AffineTransform, vertex_count: usize) {
        self.draw_calls += 1;
        self.commands.clear();

        let Some(ndc_to_view) = view_space_to_ndc(&self.surface).inverted() else {
            tracing::warn!(surface = ?self.surface, "software draw skipped: degenerate surface");
            return;
        };
        let to_view = ndc_to_view.times(config_space_to_ndc);
        let canvas = self.surface.view_rect();
        let count = vertex_count.min(self.vertices.len());

        for quad in self.vertices[..count].chunks_exact(VERTICES_PER_RECT) {
            let mut corners = quad.iter().map(|v| {
                to_view.transform_position(Vec2::new(v.position[0].into(), v.position[1].into()))
            });
            let Some(first) = corners.next() else {
                continue;
            };
            let (lo, hi) = corners.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
            let rect = Rect::from_corners(lo, hi);
            if !rect.has_intersection_with(&canvas) {
                continue;
            }
            let [r, g, b] = quad[0].color;
            self.commands.push(RenderCommand::DrawRect {
                rect,
                color: Color::rgb(r, g, b),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::push_rect;
    use crate::view::SpaceTransforms;

    fn rects(commands: &[RenderCommand]) -> Vec<Rect> {
        commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    fn approx(a: Rect, b: Rect) -> bool {
        a.origin.approx_eq(b.origin, 1e-4) && a.size.approx_eq(b.size, 1e-4)
    }

    #[test]
    fn places_rectangles_where_the_transforms_say() {
        let surface = Surface::new(200.0, 100.0, 1.0);
        let mut vertices = Vec::new();
        push_rect(&mut vertices, &Rect::from_xywh(0.0, 0.0, 10.0, 1.0), Color::rgb(1.0, 0.0, 0.0));
        push_rect(&mut vertices, &Rect::from_xywh(5.0, 1.0, 5.0, 1.0), Color::rgb(0.0, 1.0, 0.0));

        let mut raster = SoftwareRasterizer::new(surface);
        raster.upload(&vertices).unwrap();

        // Zoomed into the right half of a 10-unit chart.
        let viewport = Rect::from_xywh(100.0, 0.0, 100.0, 100.0);
        let t = SpaceTransforms::new(&surface, &viewport, 10.0, 16.0);
        raster.draw(&t.config_space_to_ndc(), vertices.len());

        let drawn = rects(raster.commands());
        assert_eq!(drawn.len(), 2);
        assert!(approx(drawn[0], Rect::from_xywh(-200.0, 0.0, 400.0, 16.0)));
        assert!(approx(drawn[1], Rect::from_xywh(0.0, 16.0, 200.0, 16.0)));
        assert_eq!(
            raster.commands()[1],
            RenderCommand::DrawRect {
                rect: drawn[1],
                color: Color::rgb(0.0, 1.0, 0.0)
            }
        );
    }

    #[test]
    fn culls_offscreen_rectangles() {
        let surface = Surface::new(100.0, 100.0, 1.0);
        let mut vertices = Vec::new();
        push_rect(&mut vertices, &Rect::from_xywh(0.0, 0.0, 4.0, 1.0), Color::BLACK);
        push_rect(&mut vertices, &Rect::from_xywh(6.0, 0.0, 4.0, 1.0), Color::BLACK);

        let mut raster = SoftwareRasterizer::new(surface);
        raster.upload(&vertices).unwrap();
        let viewport = Rect::from_xywh(50.0, 0.0, 50.0, 100.0);
        let t = SpaceTransforms::new(&surface, &viewport, 10.0, 16.0);
        raster.draw(&t.config_space_to_ndc(), vertices.len());

        assert_eq!(rects(raster.commands()).len(), 1);
        assert_eq!(raster.draw_calls(), 1);
    }
}
