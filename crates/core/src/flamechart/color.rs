use std::collections::HashMap;

use flamechart_protocol::Color;
use rand::Rng;

use crate::model::{Frame, FrameSource};

const PREFIX_FALLOFF: f64 = 0.95;
const SATURATION_RANGE: (f64, f64) = (0.10, 0.20);
const VALUE_RANGE: (f64, f64) = (0.80, 0.90);

/// Frame → color map.
///
/// Hues are spread around the color wheel in an order that clusters frames
/// sharing a file-path / name prefix, so related code gets related hues.
/// Saturation and value are jittered per frame within a narrow, muted band.
#[derive(Debug, Clone, Default)]
pub struct FrameColors {
    colors: HashMap<Frame, Color>,
}

impl FrameColors {
    pub fn assign<P, R>(profile: &P, rng: &mut R) -> Self
    where
        P: FrameSource + ?Sized,
        R: Rng + ?Sized,
    {
        let mut frames: Vec<(Frame, Vec<String>)> = Vec::new();
        profile.for_each_frame(&mut |frame| {
            frames.push((frame.clone(), frame_parts(frame)));
        });
        if frames.is_empty() {
            return Self::default();
        }

        frames.sort_by(|(_, a), (_, b)| {
            signed_dissimilarity(a, b)
                .partial_cmp(&0.0)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let n = frames.len();
        let mut cumulative = Vec::with_capacity(n);
        let mut total = 0.0;
        for i in 0..n {
            total += signed_dissimilarity(&frames[i].1, &frames[(i + 1) % n].1).abs();
            cumulative.push(total);
        }
        if total == 0.0 {
            total = 1.0;
        }

        let colors = frames
            .into_iter()
            .zip(cumulative)
            .map(|((frame, _), score)| {
                let hue = 360.0 * score / total;
                let saturation = rng.gen_range(SATURATION_RANGE.0..=SATURATION_RANGE.1);
                let value = rng.gen_range(VALUE_RANGE.0..=VALUE_RANGE.1);
                (frame, Color::from_hsv(hue, saturation, value))
            })
            .collect();

        Self { colors }
    }

    /// Color for `frame`, opaque black when it was never assigned one.
    pub fn color_for(&self, frame: &Frame) -> Color {
        self.colors.get(frame).copied().unwrap_or(Color::BLACK)
    }

    pub fn get(&self, frame: &Frame) -> Option<Color> {
        self.colors.get(frame).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Frame, &Color)> {
        self.colors.iter()
    }
}

/// Ordering tokens for a frame: the file path split on `/` (a missing file
/// is one empty token), followed by the name split on runs of non-word
/// characters.
pub fn frame_parts(frame: &Frame) -> Vec<String> {
    let file = frame.file.as_deref().unwrap_or("");
    let words = frame
        .name
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty());
    file.split('/').chain(words).map(str::to_owned).collect()
}

/// `0.95^(shared prefix length)`, negative when `a` sorts before `b`.
fn signed_dissimilarity(a: &[String], b: &[String]) -> f64 {
    let shared = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let score = PREFIX_FALLOFF.powi(shared as i32);
    match a.join("/").cmp(&b.join("/")) {
        std::cmp::Ordering::Greater => score,
        std::cmp::Ordering::Less => -score,
        std::cmp::Ordering::Equal => 0.0,
    }
}
