use crate::remap::{Axis, AxisRemap};
use level_traits::LevelError;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Level configuration, loadable from TOML.
///
/// ```toml
/// reference_height = 2340.0
/// remap_x = "-z"
/// remap_y = "x"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Height of the track the indicator slides within
    pub reference_height: f32,
    /// Device axis that world X maps onto
    pub remap_x: Axis,
    /// Device axis that world Y maps onto
    pub remap_y: Axis,
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            reference_height: 1000.0,
            remap_x: Axis::MinusZ,
            remap_y: Axis::X,
        }
    }
}

impl LevelConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, LevelError> {
        let config: LevelConfig = toml::from_str(contents)
            .map_err(|e| LevelError::ConfigurationError(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LevelError::ConfigurationError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn remap(&self) -> Result<AxisRemap, LevelError> {
        AxisRemap::new(self.remap_x, self.remap_y)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if !self.reference_height.is_finite() || self.reference_height < 0.0 {
            return Err(LevelError::ConfigurationError(format!(
                "reference_height must be finite and non-negative, got {}",
                self.reference_height
            )));
        }
        self.remap()?;
        Ok(())
    }
}
