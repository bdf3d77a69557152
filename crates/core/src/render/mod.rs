//! The two draw passes: batched rectangles below, text labels above.

mod labels;
mod rects;
mod software;

pub use labels::{
    Label, LabelRenderer, MonospaceMeasurer, TextMeasurer, TextWidthCache, trim_text_to_fit,
};
pub use rects::{
    RectVertex, RectangleBackend, RectangleRenderer, VERTICES_PER_RECT, chart_vertices, push_rect,
};
pub use software::SoftwareRasterizer;
