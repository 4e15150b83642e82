//! TOML settings files.
//!
//! ```toml
//! [input]
//! fs = 256.0
//!
//! [window]
//! size = 1280
//! step = 256
//!
//! [filter]
//! median_length = 5
//!
//! [alert]
//! threshold_bpm = 150.0
//! on_empty_window = "skip"
//! ```
//!
//! `alert.threshold_bpm` has no default and must be present.

use crate::{
    detectors::EcgDetectorConfig,
    error::ConfigError,
    pipeline::{EmptyWindowPolicy, PipelineConfig},
    windows::WindowSpec,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_WINDOW_SIZE: usize = 1280;
pub const DEFAULT_WINDOW_STEP: usize = 256;
pub const DEFAULT_MEDIAN_LENGTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub filter: FilterSettings,
    pub alert: AlertSettings,
    #[serde(default)]
    pub detector: EcgDetectorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSettings {
    /// Sampling rate for sources that do not carry one (text, CSV, QuantumLeap).
    pub fs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub size: usize,
    pub step: usize,
    pub offset: usize,
    pub end: Option<usize>,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
            step: DEFAULT_WINDOW_STEP,
            offset: 0,
            end: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    pub median_length: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            median_length: DEFAULT_MEDIAN_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertSettings {
    pub threshold_bpm: f64,
    #[serde(default)]
    pub on_empty_window: EmptyWindowPolicy,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec {
            size: self.window.size,
            step: self.window.step,
            offset: self.window.offset,
            end: self.window.end,
        }
    }

    /// Validated pipeline parameters.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let config = PipelineConfig::new(
            self.window_spec(),
            self.filter.median_length,
            self.alert.threshold_bpm,
        )
        .with_empty_window_policy(self.alert.on_empty_window);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_uses_defaults() {
        let settings = Settings::from_toml_str("[alert]\nthreshold_bpm = 150.0\n").unwrap();
        let config = settings.pipeline_config().unwrap();
        assert_eq!(config.window, WindowSpec::new(1280, 256));
        assert_eq!(config.median_filter_length, 5);
        assert_eq!(config.threshold_bpm, 150.0);
        assert_eq!(config.on_empty_window, EmptyWindowPolicy::Abort);
        assert_eq!(settings.detector, EcgDetectorConfig::default());
        assert_eq!(settings.input.fs, None);
    }

    #[test]
    fn threshold_is_required() {
        let err = Settings::from_toml_str("[window]\nsize = 512\n").unwrap_err();
        assert!(format!("{err:#}").contains("alert"), "{err:#}");
    }

    #[test]
    fn full_file() {
        let text = r#"
            [input]
            fs = 256.0

            [window]
            size = 512
            step = 128
            offset = 64
            end = 4095

            [filter]
            median_length = 3

            [alert]
            threshold_bpm = 120.0
            on_empty_window = "skip"

            [detector]
            min_rr_s = 0.3
        "#;
        let settings = Settings::from_toml_str(text).unwrap();
        assert_eq!(settings.input.fs, Some(256.0));
        assert_eq!(settings.detector.min_rr_s, 0.3);
        assert_eq!(settings.detector.lowcut_hz, 5.0);
        let config = settings.pipeline_config().unwrap();
        assert_eq!(config.window, WindowSpec::new(512, 128).with_offset(64).with_end(4095));
        assert_eq!(config.on_empty_window, EmptyWindowPolicy::Skip);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let settings =
            Settings::from_toml_str("[filter]\nmedian_length = 4\n[alert]\nthreshold_bpm = 150.0\n")
                .unwrap();
        assert_eq!(
            settings.pipeline_config(),
            Err(ConfigError::InvalidFilterLength(4))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml_str("[alert]\nthreshold = 150.0\n").is_err());
    }

    #[test]
    fn load_reports_path() {
        let err = Settings::load(Path::new("/nonexistent/tachy.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/tachy.toml"));
    }
}
