use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("label_padding must be a non-negative finite number, got {0}")]
    NegativePadding(f64),
}

/// Tunables for a chart view. Every field has a default, so a config file
/// only needs to list what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// World-space height of one stack layer, in view pixels.
    pub frame_height: f64,
    /// Label font size in view pixels (scaled by the device pixel ratio on
    /// the overlay).
    pub label_font_size: f64,
    /// Inset between a rectangle's edge and its label, in view pixels.
    pub label_padding: f64,
    /// Narrowest viewport allowed, in world-space units.
    pub min_viewport_width: f64,
    /// Seed for frame color saturation/value. `None` draws from OS entropy,
    /// so colors differ from run to run.
    pub color_seed: Option<u64>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            frame_height: 16.0,
            label_font_size: 12.0,
            label_padding: 3.0,
            min_viewport_width: 1.0,
            color_seed: None,
        }
    }
}

impl ChartConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: ChartConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_color_seed(mut self, seed: u64) -> Self {
        self.color_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("frame_height", self.frame_height),
            ("label_font_size", self.label_font_size),
            ("min_viewport_width", self.min_viewport_width),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if !(self.label_padding.is_finite() && self.label_padding >= 0.0) {
            return Err(ConfigError::NegativePadding(self.label_padding));
        }
        Ok(())
    }
}
