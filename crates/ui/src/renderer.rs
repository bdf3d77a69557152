use egui::{Align2, Color32, CornerRadius, FontId, Pos2, Rect};
use flamechart_core::render::TextMeasurer;
use flamechart_protocol::RenderCommand;

use crate::theme::{self, ThemeMode};

/// Measures label text with egui's fonts. Overlay space is in physical
/// pixels, egui lays out in points, so sizes are converted both ways.
pub struct EguiMeasurer<'a> {
    painter: &'a egui::Painter,
    pixels_per_point: f32,
}

impl<'a> EguiMeasurer<'a> {
    pub fn new(painter: &'a egui::Painter, pixels_per_point: f32) -> Self {
        Self {
            painter,
            pixels_per_point,
        }
    }
}

impl TextMeasurer for EguiMeasurer<'_> {
    fn measure(&mut self, text: &str, font_size: f64) -> f64 {
        let ppp = self.pixels_per_point;
        let galley = self.painter.layout_no_wrap(
            text.to_owned(),
            FontId::proportional(font_size as f32 / ppp),
            Color32::WHITE,
        );
        f64::from(galley.size().x * ppp)
    }
}

/// Replay overlay commands (physical pixels, canvas-relative) into an egui
/// `Painter`.
///
/// `origin` is the canvas' top-left corner in points.
pub fn paint_overlay(
    painter: &egui::Painter,
    commands: &[RenderCommand],
    origin: Pos2,
    pixels_per_point: f32,
    mode: ThemeMode,
) {
    let to_points = |x: f64, y: f64| origin + egui::vec2(x as f32, y as f32) / pixels_per_point;

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect { rect, color } => {
                let [r, g, b, a] = color.to_rgba8();
                let min = to_points(rect.left(), rect.top());
                let max = to_points(rect.right(), rect.bottom());
                painter.rect_filled(
                    Rect::from_min_max(min, max),
                    CornerRadius::ZERO,
                    Color32::from_rgba_unmultiplied(r, g, b, a),
                );
            }
            RenderCommand::FillText {
                position,
                text,
                color,
                font_size,
            } => {
                let size = *font_size as f32 / pixels_per_point;
                if size < 1.0 {
                    continue;
                }
                painter.text(
                    to_points(position.x, position.y),
                    Align2::LEFT_TOP,
                    text.as_str(),
                    FontId::proportional(size),
                    theme::resolve(*color, mode),
                );
            }
            // egui repaints the whole frame; nothing carries over to clear.
            RenderCommand::ClearRect { .. } => {}
        }
    }
}
