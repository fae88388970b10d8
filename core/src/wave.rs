//! Wave definitions as read from configuration.

use std::{num::NonZeroU32, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Count and pacing of a single wave.
///
/// The spawn count is never zero, so every wave produces at least one member
/// and therefore at least one cleared transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WaveRecord", into = "WaveRecord")]
pub struct WaveDefinition {
    spawn_count: NonZeroU32,
    spawn_period: Duration,
}

impl WaveDefinition {
    /// Creates a wave that spawns `spawn_count` entities over `spawn_period`.
    #[must_use]
    pub const fn new(spawn_count: NonZeroU32, spawn_period: Duration) -> Self {
        Self {
            spawn_count,
            spawn_period,
        }
    }

    /// Validates raw configuration values.
    pub fn from_parts(spawn_count: u32, spawn_period_secs: f64) -> Result<Self, WaveConfigError> {
        let spawn_count = NonZeroU32::new(spawn_count).ok_or(WaveConfigError::ZeroSpawnCount)?;
        if !spawn_period_secs.is_finite() {
            return Err(WaveConfigError::NonFiniteDuration);
        }
        if spawn_period_secs < 0.0 {
            return Err(WaveConfigError::NegativeDuration(spawn_period_secs));
        }

        let spawn_period = Duration::try_from_secs_f64(spawn_period_secs)
            .map_err(|_| WaveConfigError::DurationOutOfRange(spawn_period_secs))?;
        Ok(Self::new(spawn_count, spawn_period))
    }

    /// Number of entities the wave spawns.
    #[must_use]
    pub const fn spawn_count(&self) -> NonZeroU32 {
        self.spawn_count
    }

    /// Time span over which the spawns are spread.
    #[must_use]
    pub const fn spawn_period(&self) -> Duration {
        self.spawn_period
    }

    /// Wait between two consecutive spawns.
    #[must_use]
    pub fn spawn_interval(&self) -> Duration {
        self.spawn_period / self.spawn_count.get()
    }
}

/// Reasons a wave record is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WaveConfigError {
    /// The wave would spawn nothing and could never clear.
    #[error("spawn_count must be greater than zero")]
    ZeroSpawnCount,
    /// The spawn period was negative.
    #[error("spawn_period_duration must not be negative (got {0})")]
    NegativeDuration(f64),
    /// The spawn period was NaN or infinite.
    #[error("spawn_period_duration must be finite")]
    NonFiniteDuration,
    /// The spawn period does not fit in a duration.
    #[error("spawn_period_duration is too large (got {0})")]
    DurationOutOfRange(f64),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct WaveRecord {
    spawn_count: u32,
    spawn_period_duration: f64,
}

impl TryFrom<WaveRecord> for WaveDefinition {
    type Error = WaveConfigError;

    fn try_from(record: WaveRecord) -> Result<Self, Self::Error> {
        Self::from_parts(record.spawn_count, record.spawn_period_duration)
    }
}

impl From<WaveDefinition> for WaveRecord {
    fn from(definition: WaveDefinition) -> Self {
        Self {
            spawn_count: definition.spawn_count.get(),
            spawn_period_duration: definition.spawn_period.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Waves {
        waves: Vec<WaveDefinition>,
    }

    #[test]
    fn interval_divides_period_evenly() {
        let wave = WaveDefinition::from_parts(3, 3.0).expect("valid wave");
        assert_eq!(wave.spawn_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_period_spawns_without_delay() {
        let wave = WaveDefinition::from_parts(5, 0.0).expect("valid wave");
        assert_eq!(wave.spawn_interval(), Duration::ZERO);
    }

    #[test]
    fn zero_count_is_rejected() {
        assert_eq!(
            WaveDefinition::from_parts(0, 1.0),
            Err(WaveConfigError::ZeroSpawnCount)
        );
    }

    #[test]
    fn negative_and_non_finite_periods_are_rejected() {
        assert_eq!(
            WaveDefinition::from_parts(1, -0.5),
            Err(WaveConfigError::NegativeDuration(-0.5))
        );
        assert_eq!(
            WaveDefinition::from_parts(1, f64::NAN),
            Err(WaveConfigError::NonFiniteDuration)
        );
    }

    #[test]
    fn oversized_period_is_rejected() {
        assert_eq!(
            WaveDefinition::from_parts(1, 1e300),
            Err(WaveConfigError::DurationOutOfRange(1e300))
        );
    }

    #[test]
    fn toml_with_oversized_period_fails_to_parse() {
        let parsed: Result<Waves, _> = toml::from_str(
            r#"
            [[waves]]
            spawn_count = 1
            spawn_period_duration = 1e300
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_ordered_records_from_toml() {
        let parsed: Waves = toml::from_str(
            r#"
            [[waves]]
            spawn_count = 2
            spawn_period_duration = 2.0

            [[waves]]
            spawn_count = 1
            spawn_period_duration = 0.5
            "#,
        )
        .expect("waves parse");

        assert_eq!(parsed.waves.len(), 2);
        assert_eq!(parsed.waves[0].spawn_count().get(), 2);
        assert_eq!(parsed.waves[1].spawn_period(), Duration::from_millis(500));
    }

    #[test]
    fn toml_with_zero_count_fails_to_parse() {
        let parsed: Result<Waves, _> = toml::from_str(
            r#"
            [[waves]]
            spawn_count = 0
            spawn_period_duration = 1.0
            "#,
        );
        assert!(parsed.is_err());
    }
}
