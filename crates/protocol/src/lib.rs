pub mod commands;
pub mod shared_str;
pub mod theme;
pub mod transform;
pub mod types;

pub use commands::RenderCommand;
pub use shared_str::SharedStr;
pub use theme::ThemeToken;
pub use transform::AffineTransform;
pub use types::{Color, Rect, Vec2};
