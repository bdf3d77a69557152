use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Color, Rect, Vec2};

/// A single, stateless render instruction.
///
/// The label pass emits a `Vec<RenderCommand>` every redraw, and the software
/// rasterizer records the rectangle pass the same way. Renderers consume the
/// list sequentially; each command carries all the data it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Fill a rectangle with a flat color.
    DrawRect { rect: Rect, color: Color },

    /// Draw a text string whose top-left corner sits at `position`.
    FillText {
        position: Vec2,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
    },

    /// Clear a region back to transparent.
    ClearRect { rect: Rect },
}
