//! Coordinate spaces, the pan/zoom viewport and gesture decoding.

mod input;
mod spaces;
mod viewport;

pub use input::{Gesture, InteractionEvent};
pub use spaces::{
    SpaceTransforms, Surface, config_space_to_world_space, view_space_to_ndc,
    view_space_to_overlay_space, world_space_to_view_space,
};
pub use viewport::Viewport;
