use bytemuck::{Pod, Zeroable};
use flamechart_protocol::{AffineTransform, Color, Rect};

use crate::flamechart::{Flamechart, config_space_bounds};

/// One vertex of the rectangle pass: config-space position plus flat color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RectVertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

pub const VERTICES_PER_RECT: usize = 6;

/// Where the rectangle pass actually draws.
///
/// `upload` is called once per surface; `draw` once per redraw with the
/// config-space → NDC matrix as the only parameter.
pub trait RectangleBackend {
    type Error: std::error::Error;

    fn upload(&mut self, vertices: &[RectVertex]) -> Result<(), Self::Error>;

    fn draw(&mut self, config_space_to_ndc: &AffineTransform, vertex_count: usize);
}

/// Push the two triangles covering `rect`.
pub fn push_rect(out: &mut Vec<RectVertex>, rect: &Rect, color: Color) {
    let color = [color.r, color.g, color.b];
    let corner = |x: f64, y: f64| RectVertex {
        position: [x as f32, y as f32],
        color,
    };
    let (l, r, t, b) = (rect.left(), rect.right(), rect.top(), rect.bottom());
    out.extend_from_slice(&[
        corner(l, t),
        corner(l, b),
        corner(r, t),
        corner(l, b),
        corner(r, t),
        corner(r, b),
    ]);
}

/// Flatten every interval of the chart into rectangle-pass vertices.
pub fn chart_vertices(chart: &Flamechart) -> Vec<RectVertex> {
    let mut vertices = Vec::with_capacity(chart.interval_count() * VERTICES_PER_RECT);
    for (depth, interval) in chart.intervals() {
        push_rect(
            &mut vertices,
            &config_space_bounds(depth, interval),
            chart.color_for(&interval.frame),
        );
    }
    vertices
}

/// Batched rectangle pass. Vertices are built and uploaded once in
/// [`prepare`](Self::prepare); [`draw`](Self::draw) then costs one backend
/// call no matter how many rectangles there are.
#[derive(Debug, Default)]
pub struct RectangleRenderer {
    vertex_count: usize,
    prepared: bool,
}

impl RectangleRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prepare<B: RectangleBackend + ?Sized>(
        &mut self,
        chart: &Flamechart,
        backend: &mut B,
    ) -> Result<(), B::Error> {
        let vertices = chart_vertices(chart);
        self.prepared = false;
        backend.upload(&vertices)?;
        self.vertex_count = vertices.len();
        self.prepared = true;
        tracing::debug!(
            rects = vertices.len() / VERTICES_PER_RECT,
            bytes = std::mem::size_of_val(vertices.as_slice()),
            "uploaded rectangle batch"
        );
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Issue the single draw. Does nothing until prepared.
    pub fn draw<B: RectangleBackend + ?Sized>(
        &self,
        backend: &mut B,
        config_space_to_ndc: &AffineTransform,
    ) {
        if self.prepared && self.vertex_count > 0 {
            backend.draw(config_space_to_ndc, self.vertex_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileBuilder;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[derive(Default)]
    struct CountingBackend {
        uploads: Vec<usize>,
        draws: Vec<(AffineTransform, usize)>,
        fail: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("upload refused")]
    struct Refused;

    impl RectangleBackend for CountingBackend {
        type Error = Refused;

        fn upload(&mut self, vertices: &[RectVertex]) -> Result<(), Refused> {
            if self.fail {
                return Err(Refused);
            }
            self.uploads.push(vertices.len());
            Ok(())
        }

        fn draw(&mut self, matrix: &AffineTransform, vertex_count: usize) {
            self.draws.push((*matrix, vertex_count));
        }
    }

    fn chart() -> Flamechart {
        let mut b = ProfileBuilder::new();
        b.push_named_sample(&["A", "B"], 10.0);
        b.push_named_sample(&["A", "C"], 5.0);
        Flamechart::new(&b.build(), &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn six_vertices_per_interval_in_config_space() {
        let chart = chart();
        let vertices = chart_vertices(&chart);
        assert_eq!(vertices.len(), 3 * VERTICES_PER_RECT);

        // Layer 1, "C": [10, 15] x [1, 2].
        let c = &vertices[2 * VERTICES_PER_RECT..];
        let xs: Vec<f32> = c.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = c.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 15.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 2.0);
        assert!(c.windows(2).all(|w| w[0].color == w[1].color));
    }

    #[test]
    fn uploads_once_then_draws_once_per_redraw() {
        let chart = chart();
        let mut backend = CountingBackend::default();
        let mut renderer = RectangleRenderer::new();

        renderer.draw(&mut backend, &AffineTransform::IDENTITY);
        assert!(backend.draws.is_empty());

        renderer.prepare(&chart, &mut backend).unwrap();
        for _ in 0..3 {
            renderer.draw(&mut backend, &AffineTransform::IDENTITY);
        }
        assert_eq!(backend.uploads, vec![18]);
        assert_eq!(backend.draws.len(), 3);
        assert!(backend.draws.iter().all(|(_, n)| *n == 18));
    }

    #[test]
    fn failed_upload_leaves_nothing_to_draw() {
        let mut backend = CountingBackend {
            fail: true,
            ..Default::default()
        };
        let mut renderer = RectangleRenderer::new();
        assert!(renderer.prepare(&chart(), &mut backend).is_err());
        renderer.draw(&mut backend, &AffineTransform::IDENTITY);
        assert!(backend.draws.is_empty());
        assert!(!renderer.is_prepared());
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<RectVertex>(), 20);
        let v = [RectVertex {
            position: [1.0, 2.0],
            color: [0.5, 0.25, 0.125],
        }];
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(bytes.len(), 20);
    }
}
