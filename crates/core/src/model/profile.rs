use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use flamechart_protocol::SharedStr;

/// One function / call-site.
///
/// A `Frame` is an identity: two frames are equal exactly when their ids are
/// equal, regardless of name. Cloning is cheap (the strings are shared).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Unique identifier within the owning profile.
    pub id: u64,
    /// Display name (function, method, symbol).
    pub name: SharedStr,
    /// Source file, when the profiler recorded one.
    pub file: Option<SharedStr>,
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Frame {}

impl Hash for Frame {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Frame {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frame {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

/// One timed call-stack observation. `stack[0]` is the bottom of the stack.
#[derive(Debug, Clone)]
pub struct Sample {
    pub stack: Vec<Frame>,
    /// Duration (or weight) attributed to this stack.
    pub weight: f64,
}

/// Capability: visit every sample in profile order as `(stack, weight)`.
pub trait SampleSource {
    fn for_each_sample(&self, visit: &mut dyn FnMut(&[Frame], f64));
}

/// Capability: visit every distinct frame referenced by the profile.
pub trait FrameSource {
    fn for_each_frame(&self, visit: &mut dyn FnMut(&Frame));
}

/// An in-memory sampled profile: a frame table plus an ordered sample list.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub name: Option<String>,
    frames: Vec<Frame>,
    samples: Vec<Sample>,
}

impl Profile {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Sum of all sample weights.
    pub fn total_weight(&self) -> f64 {
        self.samples.iter().map(|s| s.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for Profile {
    fn for_each_sample(&self, visit: &mut dyn FnMut(&[Frame], f64)) {
        for sample in &self.samples {
            visit(&sample.stack, sample.weight);
        }
    }
}

impl FrameSource for Profile {
    fn for_each_frame(&self, visit: &mut dyn FnMut(&Frame)) {
        for frame in &self.frames {
            visit(frame);
        }
    }
}

/// Builds a [`Profile`], interning frames by `(name, file)` so every
/// call-site gets exactly one identity.
#[derive(Debug, Default)]
pub struct ProfileBuilder {
    name: Option<String>,
    frames: Vec<Frame>,
    index: HashMap<(SharedStr, Option<SharedStr>), usize>,
    samples: Vec<Sample>,
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Return the frame for `(name, file)`, creating it on first use.
    pub fn frame(&mut self, name: &str, file: Option<&str>) -> Frame {
        let key = (SharedStr::from(name), file.map(SharedStr::from));
        if let Some(&idx) = self.index.get(&key) {
            return self.frames[idx].clone();
        }
        let frame = Frame {
            id: self.frames.len() as u64,
            name: key.0.clone(),
            file: key.1.clone(),
        };
        self.index.insert(key, self.frames.len());
        self.frames.push(frame.clone());
        frame
    }

    /// Append a sample. Stacks are bottom-first.
    pub fn push_sample(&mut self, stack: Vec<Frame>, weight: f64) {
        self.samples.push(Sample { stack, weight });
    }

    /// Convenience for synthetic data: intern every name (no file) and push.
    pub fn push_named_sample(&mut self, names: &[&str], weight: f64) {
        let stack = names.iter().map(|name| self.frame(name, None)).collect();
        self.push_sample(stack, weight);
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn build(self) -> Profile {
        Profile {
            name: self.name,
            frames: self.frames,
            samples: self.samples,
        }
    }
}
