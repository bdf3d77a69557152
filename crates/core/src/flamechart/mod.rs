//! Layered interval model built from a stream of `(stack, duration)` samples.

mod color;

pub use color::{FrameColors, frame_parts};

use flamechart_protocol::{Color, Rect, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{Frame, FrameSource, SampleSource};

/// One occurrence of a frame on the time axis. `start`/`end` are cumulative
/// sample-duration units, not timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct FlamechartFrame {
    pub frame: Frame,
    pub start: f64,
    pub end: f64,
}

impl FlamechartFrame {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Intervals at one stack depth, sorted by `start` and non-overlapping.
pub type StackLayer = Vec<FlamechartFrame>;

/// The immutable flamechart: one layer per stack depth (index 0 is the stack
/// bottom), the total duration, and a color per frame.
#[derive(Debug, Clone)]
pub struct Flamechart {
    layers: Vec<StackLayer>,
    duration: f64,
    colors: FrameColors,
}

impl Flamechart {
    /// Build the chart from a profile. `rng` drives the per-frame
    /// saturation/value jitter.
    pub fn new<P, R>(profile: &P, rng: &mut R) -> Self
    where
        P: SampleSource + FrameSource + ?Sized,
        R: Rng + ?Sized,
    {
        let mut layers: Vec<StackLayer> = Vec::new();
        let mut duration = 0.0;

        profile.for_each_sample(&mut |stack, time_delta| {
            for (depth, frame) in stack.iter().enumerate() {
                if depth >= layers.len() {
                    layers.push(Vec::new());
                }
                layers[depth].push(FlamechartFrame {
                    frame: frame.clone(),
                    start: duration,
                    end: duration + time_delta,
                });
            }
            duration += time_delta;
        });

        let layers: Vec<StackLayer> = layers.into_iter().map(merge_layer).collect();
        let colors = FrameColors::assign(profile, rng);

        tracing::debug!(
            layers = layers.len(),
            intervals = layers.iter().map(Vec::len).sum::<usize>(),
            frames = colors.len(),
            duration,
            "built flamechart"
        );

        Self {
            layers,
            duration,
            colors,
        }
    }

    /// Build with a seeded generator when `color_seed` is set, otherwise from
    /// OS entropy.
    pub fn from_profile<P>(profile: &P, color_seed: Option<u64>) -> Self
    where
        P: SampleSource + FrameSource + ?Sized,
    {
        let mut rng = match color_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(profile, &mut rng)
    }

    pub fn layers(&self) -> &[StackLayer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn colors(&self) -> &FrameColors {
        &self.colors
    }

    /// Color for `frame`, black when it has none.
    pub fn color_for(&self, frame: &Frame) -> Color {
        self.colors.color_for(frame)
    }

    /// Every interval with its depth, bottom layer first.
    pub fn intervals(&self) -> impl Iterator<Item = (usize, &FlamechartFrame)> {
        self.layers
            .iter()
            .enumerate()
            .flat_map(|(depth, layer)| layer.iter().map(move |f| (depth, f)))
    }

    pub fn interval_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// The interval at `position` in config space (x = duration units,
    /// y = depth), if any.
    pub fn interval_at(&self, position: Vec2) -> Option<&FlamechartFrame> {
        if position.y < 0.0 {
            return None;
        }
        let layer = self.layers.get(position.y.floor() as usize)?;
        let idx = layer.partition_point(|f| f.end <= position.x);
        layer
            .get(idx)
            .filter(|f| f.start <= position.x && position.x < f.end)
    }
}

/// Config-space rectangle of an interval: `[start, end] x [depth, depth + 1]`.
pub fn config_space_bounds(depth: usize, frame: &FlamechartFrame) -> Rect {
    Rect::new(
        Vec2::new(frame.start, depth as f64),
        Vec2::new(frame.duration(), 1.0),
    )
}

/// Coalesce consecutive intervals of the same frame that touch end-to-start.
pub fn merge_layer(layer: StackLayer) -> StackLayer {
    let mut merged: StackLayer = Vec::with_capacity(layer.len());
    for next in layer {
        if let Some(prev) = merged.last_mut()
            && prev.frame == next.frame
            && prev.end == next.start
        {
            prev.end = next.end;
            continue;
        }
        merged.push(next);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Profile, ProfileBuilder};

    fn build(profile: &Profile) -> Flamechart {
        Flamechart::new(profile, &mut StdRng::seed_from_u64(1))
    }

    fn names(layer: &StackLayer) -> Vec<(String, f64, f64)> {
        layer
            .iter()
            .map(|f| (f.frame.name.to_string(), f.start, f.end))
            .collect()
    }

    #[test]
    fn two_sample_example() {
        let mut b = ProfileBuilder::new();
        b.push_named_sample(&["A", "B"], 10.0);
        b.push_named_sample(&["A", "C"], 5.0);
        let chart = build(&b.build());

        assert_eq!(chart.duration(), 15.0);
        assert_eq!(chart.layer_count(), 2);
        assert_eq!(names(&chart.layers()[0]), vec![("A".into(), 0.0, 15.0)]);
        assert_eq!(
            names(&chart.layers()[1]),
            vec![("B".into(), 0.0, 10.0), ("C".into(), 10.0, 15.0)]
        );
    }

    #[test]
    fn gaps_in_deeper_layers_are_not_merged_across() {
        let mut b = ProfileBuilder::new();
        b.push_named_sample(&["main", "work"], 4.0);
        b.push_named_sample(&["main"], 2.0);
        b.push_named_sample(&["main", "work"], 4.0);
        let chart = build(&b.build());

        assert_eq!(names(&chart.layers()[0]), vec![("main".into(), 0.0, 10.0)]);
        assert_eq!(
            names(&chart.layers()[1]),
            vec![("work".into(), 0.0, 4.0), ("work".into(), 6.0, 10.0)]
        );
    }

    #[test]
    fn layer_zero_covers_duration_and_deeper_layers_do_not_exceed_it() {
        let mut b = ProfileBuilder::new();
        let stacks: [&[&str]; 6] = [
            &["main", "a", "b"],
            &["main", "a"],
            &["main", "c"],
            &["main", "c", "d", "e"],
            &["main"],
            &["main", "a", "b"],
        ];
        for (i, stack) in stacks.iter().enumerate() {
            b.push_named_sample(stack, (i + 1) as f64 * 1.5);
        }
        let chart = build(&b.build());

        let coverage = |layer: &StackLayer| layer.iter().map(FlamechartFrame::duration).sum::<f64>();
        assert!((coverage(&chart.layers()[0]) - chart.duration()).abs() < 1e-9);
        for layer in chart.layers() {
            assert!(coverage(layer) <= chart.duration() + 1e-9);
            for pair in layer.windows(2) {
                assert!(pair[0].end <= pair[1].start);
            }
        }
    }

    #[test]
    fn merge_is_idempotent_and_leaves_no_touching_duplicates() {
        let mut b = ProfileBuilder::new();
        for (stack, w) in [
            (&["x", "y"][..], 1.0),
            (&["x", "y"][..], 1.0),
            (&["x", "z"][..], 1.0),
            (&["x", "y"][..], 0.0),
            (&["x", "y"][..], 2.0),
        ] {
            b.push_named_sample(stack, w);
        }
        let chart = build(&b.build());
        for layer in chart.layers() {
            let again = merge_layer(layer.clone());
            assert_eq!(&again, layer);
            for pair in layer.windows(2) {
                assert!(!(pair[0].frame == pair[1].frame && pair[0].end == pair[1].start));
            }
        }
    }

    #[test]
    fn zero_duration_samples_are_tolerated() {
        let mut b = ProfileBuilder::new();
        b.push_named_sample(&["idle"], 0.0);
        let chart = build(&b.build());
        assert_eq!(chart.duration(), 0.0);
        assert_eq!(chart.layers()[0].len(), 1);
        assert_eq!(chart.layers()[0][0].duration(), 0.0);
    }

    #[test]
    fn empty_profile_has_no_layers() {
        let chart = build(&ProfileBuilder::new().build());
        assert_eq!(chart.layer_count(), 0);
        assert_eq!(chart.duration(), 0.0);
        assert_eq!(chart.interval_count(), 0);
    }

    #[test]
    fn interval_lookup_by_config_position() {
        let mut b = ProfileBuilder::new();
        b.push_named_sample(&["A", "B"], 10.0);
        b.push_named_sample(&["A", "C"], 5.0);
        let chart = build(&b.build());

        let hit = chart.interval_at(Vec2::new(12.0, 1.5)).map(|f| f.frame.name.to_string());
        assert_eq!(hit.as_deref(), Some("C"));
        assert!(chart.interval_at(Vec2::new(12.0, 2.5)).is_none());
        assert!(chart.interval_at(Vec2::new(15.0, 0.5)).is_none());
    }

    #[test]
    fn same_seed_same_colors() {
        let mut b = ProfileBuilder::new();
        b.push_named_sample(&["main", "parse"], 3.0);
        b.push_named_sample(&["main", "render"], 2.0);
        let profile = b.build();
        let a = Flamechart::from_profile(&profile, Some(9));
        let c = Flamechart::from_profile(&profile, Some(9));
        for f in profile.frames() {
            assert_eq!(a.color_for(f), c.color_for(f));
        }
    }

    #[test]
    fn bounds_follow_depth_and_interval() {
        let f = FlamechartFrame {
            frame: Frame {
                id: 0,
                name: "f".into(),
                file: None,
            },
            start: 2.0,
            end: 7.0,
        };
        assert_eq!(config_space_bounds(3, &f), Rect::from_xywh(2.0, 3.0, 5.0, 1.0));
    }
}
