//! Configuration management for screening sessions
//!
//! This module provides runtime configuration loading from JSON files so
//! stimulus timing, the hearing frequency set and the ambient noise policy can
//! be adjusted per deployment without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::hearing::FrequencySet;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub hearing: HearingConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
}

/// Hearing test timing and stimulus set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HearingConfig {
    /// Standard 3-frequency or extended 5-frequency protocol
    pub frequency_set: FrequencySet,
    /// Silence before each tone
    pub pre_stimulus_delay_ms: u64,
    /// Tone length handed to the playback device
    pub stimulus_duration_ms: u64,
    /// Feedback display after each response
    pub feedback_ms: u64,
}

impl Default for HearingConfig {
    fn default() -> Self {
        Self {
            frequency_set: FrequencySet::Standard,
            pre_stimulus_delay_ms: 500,
            stimulus_duration_ms: 1500,
            feedback_ms: 1000,
        }
    }
}

impl HearingConfig {
    pub fn pre_stimulus_delay(&self) -> Duration {
        Duration::from_millis(self.pre_stimulus_delay_ms)
    }

    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }
}

/// Vision test timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Feedback display after each response
    pub feedback_ms: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self { feedback_ms: 800 }
    }
}

impl VisionConfig {
    pub fn feedback(&self) -> Duration {
        Duration::from_millis(self.feedback_ms)
    }
}

/// Ambient noise policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Maximum acceptable sample (dB SPL estimate)
    pub threshold_db: f32,
    /// Sub-interval between samples during an assessment
    pub sample_interval_ms: u64,
    /// Default assessment window
    pub assessment_duration_ms: u64,
    /// Cadence of continuous monitoring callbacks
    pub monitor_interval_ms: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            // ANSI S3.1 overall A-weighted limit
            threshold_db: 40.0,
            sample_interval_ms: 500,
            assessment_duration_ms: 5000,
            monitor_interval_ms: 1000,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration. If the file doesn't exist or the JSON is
    /// invalid, a warning is logged and defaults are returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/screening_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.hearing.frequency_set, FrequencySet::Standard);
        assert_eq!(config.hearing.stimulus_duration_ms, 1500);
        assert_eq!(config.noise.threshold_db, 40.0);
        assert_eq!(config.noise.sample_interval_ms, 500);
        assert_eq!(config.vision.feedback_ms, 800);
    }

    #[test]
    fn test_partial_json_uses_section_defaults() {
        let json = r#"{ "hearing": {
            "frequency_set": "extended",
            "pre_stimulus_delay_ms": 0,
            "stimulus_duration_ms": 200,
            "feedback_ms": 0
        } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.hearing.frequency_set, FrequencySet::Extended);
        assert_eq!(config.hearing.stimulus_duration_ms, 200);
        assert_eq!(config.noise.threshold_db, 40.0);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/screening_config.json");
        assert_eq!(config.hearing.feedback_ms, 1000);
    }
}
