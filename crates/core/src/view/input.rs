use flamechart_protocol::Vec2;
use serde::{Deserialize, Serialize};

/// Raw pointer/wheel input in view space, as delivered by the host.
///
/// `delta` follows browser wheel conventions: positive `y` scrolls down,
/// which zooms out when `modifier` is held.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub offset: Vec2,
    pub delta: Vec2,
    pub modifier: bool,
}

impl InteractionEvent {
    pub fn pan(delta: Vec2) -> Self {
        Self {
            offset: Vec2::ZERO,
            delta,
            modifier: false,
        }
    }

    pub fn wheel(offset: Vec2, delta: Vec2, modifier: bool) -> Self {
        Self {
            offset,
            delta,
            modifier,
        }
    }

    pub fn gesture(&self) -> Option<Gesture> {
        if self.modifier {
            let multiplier = 1.0 + self.delta.y / 100.0;
            if !(multiplier.is_finite() && multiplier > 0.0) {
                tracing::trace!(multiplier, "ignoring zoom with degenerate multiplier");
                return None;
            }
            Some(Gesture::Zoom {
                focus: self.offset,
                multiplier,
            })
        } else {
            Some(Gesture::Pan(self.delta))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// View-space displacement.
    Pan(Vec2),
    /// Horizontal zoom around a view-space point. `multiplier < 1` zooms in.
    Zoom { focus: Vec2, multiplier: f64 },
}
