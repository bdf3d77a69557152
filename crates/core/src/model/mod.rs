pub mod profile;

pub use profile::{Frame, FrameSource, Profile, ProfileBuilder, Sample, SampleSource};
