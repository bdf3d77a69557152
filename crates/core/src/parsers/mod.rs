pub mod collapsed;
pub mod speedscope;

use crate::model::Profile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("collapsed: {0}")]
    Collapsed(#[from] collapsed::CollapsedParseError),
    #[error("speedscope: {0}")]
    Speedscope(#[from] speedscope::SpeedscopeParseError),
    #[error("unable to detect format")]
    UnknownFormat,
}

/// Auto-detect the profile format and parse it.
///
/// Detection strategy:
/// 1. Try to parse as JSON and look for speedscope's top-level keys.
/// 2. Fall back to collapsed stacks, the most permissive text format.
pub fn parse_auto(data: &[u8]) -> Result<Profile, ParseError> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        if let Some(obj) = value.as_object() {
            // Speedscope: has "$schema" containing "speedscope" or has "shared" + "profiles"
            let schema_matches = obj
                .get("$schema")
                .and_then(|s| s.as_str())
                .is_some_and(|s| s.contains("speedscope"));
            if schema_matches || (obj.contains_key("shared") && obj.contains_key("profiles")) {
                tracing::debug!("detected speedscope profile");
                return Ok(speedscope::parse_speedscope(data)?);
            }
        }
        // Valid JSON in some other shape is never a folded stack file.
        return Err(ParseError::UnknownFormat);
    }

    match collapsed::parse_collapsed(data) {
        Ok(profile) => {
            tracing::debug!(samples = profile.samples().len(), "detected collapsed stacks");
            Ok(profile)
        }
        Err(collapsed::CollapsedParseError::Empty) => Err(ParseError::UnknownFormat),
        Err(e) => Err(e.into()),
    }
}
