//! # Estimator Configuration
//!
//! All settings are optional; a missing file section or key falls back to the
//! built-in defaults, which reproduce the reference timing model.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [estimator]
//! calibration_factor = 1.32
//! rapid_feedrate = 1000.0
//! feed_feedrate = 100.0
//! include_dwell = true
//! modal_motion = true
//! work_offset = [0.0, 0.0, -2.5]
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::machine::Point3;
use crate::motion::{MotionProfile, CALIBRATION_FACTOR, FEED_FALLBACK_FEEDRATE, RAPID_FALLBACK_FEEDRATE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

/// Timing model and parse options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EstimatorConfig {
    /// Multiplier on every `distance / feedrate` time.
    #[serde(default = "default_calibration_factor")]
    pub calibration_factor: f64,
    /// G0 feedrate used until the first F word (mm/min).
    #[serde(default = "default_rapid_feedrate")]
    pub rapid_feedrate: f64,
    /// G1/G2/G3 feedrate used until the first F word (mm/min).
    #[serde(default = "default_feed_feedrate")]
    pub feed_feedrate: f64,
    /// Add `G4 P<seconds>` dwell time to the totals.
    #[serde(default)]
    pub include_dwell: bool,
    /// Run bare axis lines (`X20 Y10`) with the last `G0`..`G3` code.
    #[serde(default)]
    pub modal_motion: bool,
    /// Work offset applied to absolute X/Y/Z targets.
    #[serde(default)]
    pub work_offset: [f64; 3],
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            calibration_factor: default_calibration_factor(),
            rapid_feedrate: default_rapid_feedrate(),
            feed_feedrate: default_feed_feedrate(),
            include_dwell: false,
            modal_motion: false,
            work_offset: [0.0; 3],
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.calibration_factor.is_finite() && self.calibration_factor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "calibration_factor must be > 0, got {}",
                self.calibration_factor
            )));
        }
        for (name, value) in [("rapid_feedrate", self.rapid_feedrate), ("feed_feedrate", self.feed_feedrate)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be > 0, got {}", name, value)));
            }
        }
        if self.work_offset.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("work_offset must be finite".to_string()));
        }
        Ok(())
    }

    pub fn motion_profile(&self) -> MotionProfile {
        MotionProfile {
            calibration_factor: self.calibration_factor,
            rapid_fallback: self.rapid_feedrate,
            feed_fallback: self.feed_feedrate,
        }
    }

    pub fn offset(&self) -> Point3 {
        let [x, y, z] = self.work_offset;
        Point3::new(x, y, z)
    }
}

// Default value functions
fn default_calibration_factor() -> f64 { CALIBRATION_FACTOR }
fn default_rapid_feedrate() -> f64 { RAPID_FALLBACK_FEEDRATE }
fn default_feed_feedrate() -> f64 { FEED_FALLBACK_FEEDRATE }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    let config: Config = match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to parse config TOML: {}", e);
            return Err(ConfigError::Toml(e));
        }
    };
    config.estimator.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.estimator.calibration_factor, 1.32);
        assert_eq!(config.estimator.rapid_feedrate, 1000.0);
        assert_eq!(config.estimator.feed_feedrate, 100.0);
        assert!(!config.estimator.include_dwell);
        assert!(!config.estimator.modal_motion);
        assert_eq!(config.estimator.offset(), Point3::ORIGIN);
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[estimator]\ncalibration_factor = 1.1\ninclude_dwell = true\nmodal_motion = true").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.estimator.calibration_factor, 1.1);
        assert!(config.estimator.include_dwell);
        assert!(config.estimator.modal_motion);
        // Defaults for missing fields
        assert_eq!(config.estimator.rapid_feedrate, 1000.0);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_config_rejects_bad_values() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("zero.toml");
        std::fs::write(&file_path, "[estimator]\nfeed_feedrate = 0.0\n").unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_motion_profile_and_offset() {
        let toml = r#"
        [estimator]
        calibration_factor = 1.0
        rapid_feedrate = 5000.0
        work_offset = [1.0, 2.0, 3.0]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let profile = config.estimator.motion_profile();
        assert_eq!(profile.calibration_factor, 1.0);
        assert_eq!(profile.rapid_fallback, 5000.0);
        assert_eq!(profile.feed_fallback, 100.0);
        assert_eq!(config.estimator.offset(), Point3::new(1.0, 2.0, 3.0));
        assert!(config.estimator.validate().is_ok());
    }
}
