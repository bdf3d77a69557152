use serde::Deserialize;
use thiserror::Error;

use crate::model::{Frame, Profile, ProfileBuilder};

#[derive(Debug, Error)]
pub enum SpeedscopeParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported schema or missing profiles")]
    Unsupported,
    #[error("event closes frame {frame} at {at}, but no frame is open")]
    UnbalancedClose { frame: usize, at: f64 },
}

/// Speedscope file format: evented and sampled profile types.
/// Schema: https://www.speedscope.app/file-format-spec.json
#[derive(Debug, Deserialize)]
struct SpeedscopeFile {
    #[serde(default)]
    shared: Option<SharedData>,
    profiles: Vec<SpeedscopeProfile>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "activeProfileIndex")]
    active_profile_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SharedData {
    frames: Vec<SpeedscopeFrame>,
}

#[derive(Debug, Deserialize)]
struct SpeedscopeFrame {
    name: String,
    #[serde(default)]
    file: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum SpeedscopeProfile {
    #[serde(rename = "evented")]
    Evented {
        #[serde(default)]
        name: Option<String>,
        events: Vec<SpeedscopeEvent>,
    },
    #[serde(rename = "sampled")]
    Sampled {
        #[serde(default)]
        name: Option<String>,
        samples: Vec<Vec<usize>>,
        #[serde(default)]
        weights: Vec<f64>,
    },
}

#[derive(Debug, Deserialize)]
struct SpeedscopeEvent {
    #[serde(rename = "type")]
    event_type: String, // "O" (open) or "C" (close)
    frame: usize,
    at: f64,
}

/// Resolves speedscope frame indices to interned frames.
struct FrameTable<'a> {
    shared: &'a [SpeedscopeFrame],
    builder: ProfileBuilder,
}

impl FrameTable<'_> {
    fn get(&mut self, index: usize) -> Frame {
        match self.shared.get(index) {
            Some(f) => self.builder.frame(&f.name, f.file.as_deref()),
            None => self.builder.frame(&format!("frame-{index}"), None),
        }
    }
}

/// Parse a speedscope JSON file into a `Profile`.
///
/// Only one profile is imported: `activeProfileIndex` when present, the
/// first one otherwise. Evented profiles become one sample per interval
/// between consecutive events, carrying the stack open during it.
pub fn parse_speedscope(data: &[u8]) -> Result<Profile, SpeedscopeParseError> {
    let file: SpeedscopeFile = serde_json::from_slice(data)?;

    let shared_frames = file.shared.as_ref().map(|s| &s.frames[..]).unwrap_or(&[]);
    let index = file.active_profile_index.unwrap_or(0);
    let Some(profile) = file.profiles.get(index).or(file.profiles.first()) else {
        return Err(SpeedscopeParseError::Unsupported);
    };
    if file.profiles.len() > 1 {
        tracing::debug!(
            profiles = file.profiles.len(),
            index,
            "speedscope file has several profiles, importing one"
        );
    }

    let mut table = FrameTable {
        shared: shared_frames,
        builder: ProfileBuilder::new(),
    };

    let profile_name = match profile {
        SpeedscopeProfile::Evented { name, events } => {
            let mut stack: Vec<Frame> = Vec::new();
            let mut last_at: Option<f64> = None;

            for event in events {
                if let Some(prev) = last_at
                    && event.at > prev
                    && !stack.is_empty()
                {
                    table.builder.push_sample(stack.clone(), event.at - prev);
                }
                last_at = Some(event.at);

                match event.event_type.as_str() {
                    "O" => stack.push(table.get(event.frame)),
                    "C" => {
                        if stack.pop().is_none() {
                            return Err(SpeedscopeParseError::UnbalancedClose {
                                frame: event.frame,
                                at: event.at,
                            });
                        }
                    }
                    other => tracing::trace!(event_type = other, "ignoring speedscope event"),
                }
            }
            name
        }
        SpeedscopeProfile::Sampled {
            name,
            samples,
            weights,
        } => {
            for (i, sample) in samples.iter().enumerate() {
                let weight = weights.get(i).copied().unwrap_or(1.0);
                let stack = sample.iter().map(|&idx| table.get(idx)).collect();
                table.builder.push_sample(stack, weight);
            }
            name
        }
    };

    let mut builder = table.builder;
    builder.set_name(file.name.or_else(|| profile_name.clone()));
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(profile: &Profile, i: usize) -> Vec<String> {
        profile.samples()[i]
            .stack
            .iter()
            .map(|f| f.name.to_string())
            .collect()
    }

    #[test]
    fn parse_evented_profile() {
        let json = r#"{
            "$schema": "https://www.speedscope.app/file-format-spec.json",
            "shared": {
                "frames": [
                    {"name": "main"},
                    {"name": "foo", "file": "foo.js"},
                    {"name": "bar"}
                ]
            },
            "profiles": [{
                "type": "evented",
                "name": "thread 0",
                "unit": "microseconds",
                "startValue": 0,
                "endValue": 100,
                "events": [
                    {"type": "O", "frame": 0, "at": 0},
                    {"type": "O", "frame": 1, "at": 10},
                    {"type": "C", "frame": 1, "at": 50},
                    {"type": "O", "frame": 2, "at": 60},
                    {"type": "C", "frame": 2, "at": 80},
                    {"type": "C", "frame": 0, "at": 100}
                ]
            }],
            "name": "test profile"
        }"#;

        let profile = parse_speedscope(json.as_bytes()).unwrap();
        assert_eq!(profile.name.as_deref(), Some("test profile"));
        assert_eq!(profile.frames().len(), 3);
        assert_eq!(profile.total_weight(), 100.0);

        let weights: Vec<f64> = profile.samples().iter().map(|s| s.weight).collect();
        assert_eq!(weights, vec![10.0, 40.0, 10.0, 20.0, 20.0]);
        assert_eq!(names(&profile, 1), vec!["main", "foo"]);
        assert_eq!(names(&profile, 2), vec!["main"]);

        let foo = &profile.samples()[1].stack[1];
        assert_eq!(foo.file.as_deref(), Some("foo.js"));
    }

    #[test]
    fn parse_sampled_profile() {
        let json = r#"{
            "shared": {
                "frames": [
                    {"name": "main"},
                    {"name": "work"}
                ]
            },
            "profiles": [{
                "type": "sampled",
                "name": "samples",
                "unit": "milliseconds",
                "startValue": 0,
                "endValue": 30,
                "samples": [[0, 1], [0, 1], [0]],
                "weights": [10, 10, 5]
            }]
        }"#;

        let profile = parse_speedscope(json.as_bytes()).unwrap();
        assert_eq!(profile.name.as_deref(), Some("samples"));
        assert_eq!(profile.samples().len(), 3);
        assert_eq!(profile.frames().len(), 2);
        assert_eq!(profile.total_weight(), 25.0);
        assert_eq!(names(&profile, 0), vec!["main", "work"]);
    }

    #[test]
    fn active_profile_index_selects_profile() {
        let json = r#"{
            "shared": {"frames": [{"name": "a"}, {"name": "b"}]},
            "activeProfileIndex": 1,
            "profiles": [
                {"type": "sampled", "unit": "none", "startValue": 0, "endValue": 1,
                 "samples": [[0]], "weights": [1]},
                {"type": "sampled", "unit": "none", "startValue": 0, "endValue": 1,
                 "samples": [[1]]}
            ]
        }"#;
        let profile = parse_speedscope(json.as_bytes()).unwrap();
        assert_eq!(names(&profile, 0), vec!["b"]);
        // Missing weights default to 1.
        assert_eq!(profile.samples()[0].weight, 1.0);
    }

    #[test]
    fn unbalanced_close_errors() {
        let json = r#"{
            "shared": {"frames": [{"name": "a"}]},
            "profiles": [{"type": "evented", "unit": "none", "startValue": 0, "endValue": 1,
                "events": [{"type": "C", "frame": 0, "at": 1}]}]
        }"#;
        assert!(matches!(
            parse_speedscope(json.as_bytes()),
            Err(SpeedscopeParseError::UnbalancedClose { frame: 0, .. })
        ));
    }

    #[test]
    fn empty_profiles_errors() {
        let json = r#"{"shared":{"frames":[]},"profiles":[]}"#;
        assert!(matches!(
            parse_speedscope(json.as_bytes()),
            Err(SpeedscopeParseError::Unsupported)
        ));
    }
}
