//! egui input → chart gestures.

use egui::{Modifiers, MouseWheelUnit, Pos2, Rect, Vec2};
use flamechart_core::view::InteractionEvent;
use flamechart_protocol::Vec2 as ChartVec;

/// Points per wheel "line" when the platform reports line units.
const POINTS_PER_LINE: f32 = 24.0;

/// Map a raw wheel event over `canvas` to an interaction.
///
/// egui reports positive `y` for scrolling up; the chart expects browser
/// wheel deltas (positive `y` scrolls down), so the sign is flipped. Events
/// with the pointer outside the canvas are ignored.
pub fn wheel_interaction(
    unit: MouseWheelUnit,
    delta: Vec2,
    modifiers: Modifiers,
    pointer: Option<Pos2>,
    canvas: Rect,
) -> Option<InteractionEvent> {
    let pointer = pointer.filter(|p| canvas.contains(*p))?;
    let points = match unit {
        MouseWheelUnit::Point => delta,
        MouseWheelUnit::Line => delta * POINTS_PER_LINE,
        MouseWheelUnit::Page => delta * canvas.height(),
    };
    let offset = pointer - canvas.min;
    Some(InteractionEvent::wheel(
        ChartVec::new(f64::from(offset.x), f64::from(offset.y)),
        ChartVec::new(-f64::from(points.x), -f64::from(points.y)),
        modifiers.command || modifiers.ctrl,
    ))
}

/// Dragging moves the content with the pointer, so the viewport goes the
/// other way.
pub fn drag_pan(drag_delta: Vec2) -> ChartVec {
    ChartVec::new(-f64::from(drag_delta.x), -f64::from(drag_delta.y))
}

/// Pinch factor (`> 1` means fingers spreading) → viewport width multiplier.
pub fn pinch_multiplier(zoom_factor: f32) -> Option<f64> {
    (zoom_factor.is_finite() && zoom_factor > 0.0).then(|| 1.0 / f64::from(zoom_factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flamechart_core::view::Gesture;

    fn canvas() -> Rect {
        Rect::from_min_size(Pos2::new(10.0, 40.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn scroll_down_pans_down() {
        let event = wheel_interaction(
            MouseWheelUnit::Point,
            egui::vec2(0.0, -30.0),
            Modifiers::NONE,
            Some(Pos2::new(110.0, 140.0)),
            canvas(),
        );
        assert_eq!(
            event.and_then(|e| e.gesture()),
            Some(Gesture::Pan(ChartVec::new(0.0, 30.0)))
        );
    }

    #[test]
    fn ctrl_scroll_up_zooms_in_at_pointer() {
        let event = wheel_interaction(
            MouseWheelUnit::Line,
            egui::vec2(0.0, 1.0),
            Modifiers::CTRL,
            Some(Pos2::new(410.0, 40.0)),
            canvas(),
        );
        let Some(Gesture::Zoom { focus, multiplier }) = event.and_then(|e| e.gesture()) else {
            panic!("expected zoom, got {event:?}");
        };
        assert_eq!(focus, ChartVec::new(400.0, 0.0));
        assert!((multiplier - 0.76).abs() < 1e-9);
    }

    #[test]
    fn wheel_outside_canvas_is_ignored() {
        assert!(
            wheel_interaction(
                MouseWheelUnit::Point,
                egui::vec2(0.0, 5.0),
                Modifiers::NONE,
                Some(Pos2::new(0.0, 0.0)),
                canvas(),
            )
            .is_none()
        );
    }

    #[test]
    fn pinch_out_narrows_viewport() {
        assert_eq!(pinch_multiplier(2.0), Some(0.5));
        assert_eq!(pinch_multiplier(0.0), None);
    }
}
