use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InspectorError, Result};
use crate::format::CoordinateFormat;

pub const CONFIG_ENV: &str = "DETECTION_INSPECTOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub notice: NoticeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Share of the viewport height the image may occupy.
    #[serde(default = "default_max_height_fraction")]
    pub max_height_fraction: f32,
    /// Fixed height cap in display units; overrides the fraction.
    #[serde(default)]
    pub max_height: Option<f32>,
    #[serde(default)]
    pub exact_dimensions: bool,
    #[serde(default)]
    pub coordinate_format: CoordinateFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeConfig {
    #[serde(default = "default_notice_duration_ms")]
    pub duration_ms: u64,
}

fn default_max_height_fraction() -> f32 {
    0.7
}

fn default_notice_duration_ms() -> u64 {
    2000
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_height_fraction: default_max_height_fraction(),
            max_height: None,
            exact_dimensions: false,
            coordinate_format: CoordinateFormat::default(),
        }
    }
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_notice_duration_ms(),
        }
    }
}

impl DisplayConfig {
    /// Height cap for a viewport of the given height.
    pub fn max_height_for(&self, viewport_height: f32) -> f32 {
        match self.max_height {
            Some(fixed) => fixed,
            None => (viewport_height * self.max_height_fraction.clamp(0.05, 1.0)).round(),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !self.max_height_fraction.is_finite() || self.max_height_fraction <= 0.0 {
            return Err(format!(
                "display.max_height_fraction must be a positive number, got {}",
                self.max_height_fraction
            ));
        }
        if let Some(fixed) = self.max_height {
            if !fixed.is_finite() || fixed <= 0.0 {
                return Err(format!(
                    "display.max_height must be a positive number, got {fixed}"
                ));
            }
        }
        Ok(())
    }
}

impl NoticeConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl ViewerConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|source| InspectorError::ConfigDecode {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn validate(&self, path: &Path) -> Result<()> {
        self.display
            .validate()
            .map_err(|reason| InspectorError::InvalidConfig {
                path: path.to_path_buf(),
                reason,
            })
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| InspectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Explicit path first, then `DETECTION_INSPECTOR_CONFIG`, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(path) => {
                let config = Self::load_file(&path)?;
                log::info!("loaded config from {}", path.display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}
