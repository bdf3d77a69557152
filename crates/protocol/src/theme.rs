use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
///
/// Frame rectangles carry concrete colors from the flamechart's color map;
/// everything around them is themed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    /// Text drawn on top of frame rectangles. Frame colors are light and
    /// muted, so this stays dark in every theme.
    LabelText,

    TextPrimary,
    TextMuted,

    Background,
    Surface,
    Border,
}
