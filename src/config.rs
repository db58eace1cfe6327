//! Scene configuration loaded from JSON.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::driver::DriverConfig;
use crate::field::{AmbientFieldConfig, SphereFieldConfig};
use crate::sequencer::WalkCycleConfig;
use crate::typing::TypewriterConfig;

/// Everything needed to build the page animations. Missing fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    /// Seed for entity parameter generation.
    pub seed: u64,
    pub ambient: AmbientFieldConfig,
    pub sphere: SphereFieldConfig,
    pub walk_cycle: WalkCycleConfig,
    pub driver: DriverConfig,
    pub typewriter: TypewriterConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            ambient: AmbientFieldConfig::default(),
            sphere: SphereFieldConfig::default(),
            walk_cycle: WalkCycleConfig::default(),
            driver: DriverConfig::default(),
            typewriter: TypewriterConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SceneConfig = serde_json::from_str(json).context("Failed to parse scene config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.ambient.width > 0.0 && self.ambient.height > 0.0,
            "ambient field size must be positive, got {}x{}",
            self.ambient.width,
            self.ambient.height
        );
        ensure!(
            self.sphere.width > 0.0 && self.sphere.height > 0.0,
            "sphere field size must be positive, got {}x{}",
            self.sphere.width,
            self.sphere.height
        );
        ensure!(self.sphere.radius > 0.0, "sphere radius must be positive");
        ensure!(
            self.ambient.size_range[0] <= self.ambient.size_range[1]
                && self.ambient.opacity_range[0] <= self.ambient.opacity_range[1],
            "ambient size and opacity ranges must be ordered min, max"
        );
        ensure!(
            self.driver.target_fps >= 0.0 && self.driver.target_fps.is_finite(),
            "target fps must be finite and non-negative"
        );
        ensure!(self.typewriter.char_interval_ms >= 0.0, "typewriter interval must be non-negative");
        self.walk_cycle.validate().context("Invalid walk cycle")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SceneConfig::from_json_str(r#"{ "seed": 7, "sphere": { "particleCount": 12 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.sphere.particle_count, 12);
        assert_eq!(config.sphere.radius, 250.0);
        assert_eq!(config.walk_cycle.cycle_secs, 8.0);
        assert_eq!(config.typewriter.text, "AI Engineer");
    }

    #[test]
    fn test_rejects_inconsistent_cycle() {
        let err = SceneConfig::from_json_str(r#"{ "walkCycle": { "cycleSecs": 10.0 } }"#).unwrap_err();
        assert!(format!("{:#}", err).contains("walk cycle"));
    }

    #[test]
    fn test_rejects_zero_size() {
        assert!(SceneConfig::from_json_str(r#"{ "ambient": { "width": 0.0 } }"#).is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_camel_case() {
        let json = SceneConfig::default().to_json_pretty().unwrap();
        assert!(json.contains("\"walkCycle\""));
        assert!(json.contains("\"targetFps\""));
        let parsed = SceneConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.seed, SceneConfig::default().seed);
    }
}
