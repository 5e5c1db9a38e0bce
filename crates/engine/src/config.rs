use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Tunables for the whole engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub slider: SliderConfig,
    pub playback: PlaybackConfig,
}

/// Range slider tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliderConfig {
    /// Minimum handle separation on screen, enforced alongside the time gap.
    pub min_gap_px: f32,
    /// Number of decorative time labels along the track.
    pub tick_count: usize,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            min_gap_px: 30.0,
            tick_count: 5,
        }
    }
}

/// Bounded playback tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Rates cycled by repeated rate presses.
    pub rate_ladder: Vec<f32>,
    pub default_rate: f32,
    /// Distance from a seek target within which a notification confirms the seek.
    pub seek_tolerance_ms: u64,
    /// Notifications tolerated while a seek is unconfirmed before it is retried.
    pub stale_notification_budget: u32,
    /// Whether playback starts with looping enabled.
    pub looping: bool,
    pub correct_pitch: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rate_ladder: vec![0.5, 1.0, 1.25, 1.5, 2.0],
            default_rate: 1.0,
            seek_tolerance_ms: 250,
            stale_notification_budget: 8,
            looping: true,
            correct_pitch: true,
        }
    }
}

impl PlaybackConfig {
    /// Index of `default_rate` in the ladder.
    pub fn default_rate_index(&self) -> usize {
        self.rate_ladder
            .iter()
            .position(|rate| (*rate - self.default_rate).abs() < f32::EPSILON)
            .unwrap_or(0)
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config. Missing fields keep their defaults.
    ///
    /// # Example
    /// ```
    /// use engine::EngineConfig;
    ///
    /// let config = EngineConfig::from_json_str(r#"{ "slider": { "tick_count": 8 } }"#)
    ///     .expect("valid config");
    /// assert_eq!(config.slider.tick_count, 8);
    /// assert_eq!(config.playback.seek_tolerance_ms, 250);
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;
        if playback.rate_ladder.is_empty() {
            return Err(invalid("rate ladder is empty"));
        }
        if playback
            .rate_ladder
            .iter()
            .any(|rate| !rate.is_finite() || *rate <= 0.0)
        {
            return Err(invalid("rate ladder entries must be positive"));
        }
        if !playback
            .rate_ladder
            .iter()
            .any(|rate| (*rate - playback.default_rate).abs() < f32::EPSILON)
        {
            return Err(invalid("default rate is not in the rate ladder"));
        }
        if playback.stale_notification_budget == 0 {
            return Err(invalid("stale notification budget must be at least 1"));
        }
        if !self.slider.min_gap_px.is_finite() || self.slider.min_gap_px < 0.0 {
            return Err(invalid("slider min gap must be a non-negative pixel count"));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> EngineError {
    EngineError::InvalidConfig {
        reason: reason.to_owned(),
    }
}
