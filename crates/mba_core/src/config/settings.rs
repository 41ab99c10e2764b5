//! Settings struct with TOML-based sections.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Bitrate sampling settings.
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Chart output settings.
    #[serde(default)]
    pub chart: ChartSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            chart: ChartSettings::default(),
        }
    }
}

impl Settings {
    /// Reject values the analysis cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.analysis.interval_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "analysis.interval_secs must be positive, got {}",
                self.analysis.interval_secs
            )));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ConfigError::Invalid(
                "chart dimensions must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bitrate sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Bucket width for bitrate sampling, in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
}

fn default_interval_secs() -> f64 {
    crate::analysis::DEFAULT_INTERVAL_SECS
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

/// Chart output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSettings {
    /// Directory charts are written into.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Chart width in pixels.
    #[serde(default = "default_chart_width")]
    pub width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

fn default_output_folder() -> String {
    ".".to_string()
}

fn default_chart_width() -> u32 {
    1500
}

fn default_chart_height() -> u32 {
    800
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}
