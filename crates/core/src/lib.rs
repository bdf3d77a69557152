//! Flamechart construction, the config → screen coordinate pipeline, and
//! the rectangle and label draw passes.

pub mod chart;
pub mod config;
pub mod flamechart;
pub mod model;
pub mod parsers;
pub mod render;
pub mod svg;
pub mod view;

pub use chart::FlamechartView;
pub use config::{ChartConfig, ConfigError};
pub use flamechart::{Flamechart, FlamechartFrame, FrameColors, StackLayer};
pub use model::{Frame, FrameSource, Profile, ProfileBuilder, Sample, SampleSource};
