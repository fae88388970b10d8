//! Configuration file consumed by the headless driver.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use wave_warden_simulation::SimulationConfig;
use wave_warden_world::arena::StaticArena;

/// Wave flow plus the arena it runs in.
#[derive(Debug)]
pub(crate) struct DriverConfig {
    pub(crate) simulation: SimulationConfig,
    pub(crate) arena: StaticArena,
}

#[derive(Debug, Deserialize)]
struct ArenaSection {
    arena: StaticArena,
}

impl DriverConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let simulation = SimulationConfig::from_toml_str(contents)
            .context("failed to parse simulation settings")?;
        let ArenaSection { arena } =
            toml::from_str(contents).context("failed to parse [arena] table")?;
        Ok(Self { simulation, arena })
    }
}
