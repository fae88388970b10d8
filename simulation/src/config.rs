//! Configuration of a wave simulation loaded from TOML.

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wave_warden_core::{CategoryMask, EntityTemplate, Vec3, WaveDefinition};
use wave_warden_system_placement::PlacementConfig;

/// Everything required to run the wave flow against an environment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Waves in the order they are played.
    pub waves: Vec<WaveDefinition>,
    /// Template applied to every spawned entity.
    pub template: EntityTemplate,
    /// Placement sampler tuning.
    pub placement: PlacementConfig,
    /// Categories that block the observer's sight.
    pub blocking: CategoryMask,
    /// Initial observer position.
    pub observer: Vec3,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            waves: Vec::new(),
            template: EntityTemplate::default(),
            placement: PlacementConfig::default(),
            blocking: CategoryMask::ALL,
            observer: Vec3::ZERO,
        }
    }
}

/// Failures raised while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {path}")]
    Read {
        /// Location of the file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The contents are not a valid configuration.
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
}

impl SimulationConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        tracing::debug!(waves = config.waves.len(), "configuration parsed");
        Ok(config)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn parses_waves_in_order() {
        let config = SimulationConfig::from_toml_str(
            r#"
            blocking = 5
            observer = [0.0, 1.5, -4.0]

            [template]
            half_height = 0.9

            [placement]
            max_attempts = 64
            seed = 11

            [[waves]]
            spawn_count = 2
            spawn_period_duration = 2.0

            [[waves]]
            spawn_count = 1
            spawn_period_duration = 0.5
            "#,
        )
        .expect("valid configuration");

        assert_eq!(config.waves.len(), 2);
        assert_eq!(config.waves[0].spawn_count().get(), 2);
        assert_eq!(config.waves[1].spawn_period(), Duration::from_millis(500));
        assert_eq!(config.blocking, CategoryMask::from_bits(5));
        assert_eq!(config.placement.max_attempts.get(), 64);
        assert!((config.template.half_height - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.observer, Vec3::new(0.0, 1.5, -4.0));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::from_toml_str("").expect("valid configuration");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.blocking, CategoryMask::ALL);
    }

    #[test]
    fn zero_count_wave_is_rejected() {
        let result = SimulationConfig::from_toml_str(
            r#"
            [[waves]]
            spawn_count = 0
            spawn_period_duration = 1.0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn oversized_period_is_rejected() {
        let result = SimulationConfig::from_toml_str(
            r#"
            [[waves]]
            spawn_count = 1
            spawn_period_duration = 1e300
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = SimulationConfig::load(Path::new("/nonexistent/waves.toml"))
            .expect_err("file does not exist");
        assert!(error.to_string().contains("/nonexistent/waves.toml"));
    }
}
