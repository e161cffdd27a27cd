//! Engine-wide tunables read from `settings.toml`.

use serde::{Deserialize, Serialize};

/// Simulation parameters shared by every agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Seed for the simulation RNG; every run with the same seed is identical.
    pub seed: u64,
    /// Ticks `brain-sim` runs when none are given on the command line.
    pub ticks: u64,
    pub day_length: u64,
    /// Blocks per tick at a walk speed multiplier of 1.
    pub movement_speed: f64,
    pub sensors: SensorSettings,
}

impl EngineSettings {
    pub const DEFAULT_SEED: u64 = 0x5eed;
    pub const DEFAULT_TICKS: u64 = 1_200;
    pub const DEFAULT_MOVEMENT_SPEED: f64 = 1.0;
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            ticks: Self::DEFAULT_TICKS,
            day_length: brain_core::WorldClock::DEFAULT_DAY_LENGTH,
            movement_speed: Self::DEFAULT_MOVEMENT_SPEED,
            sensors: SensorSettings::default(),
        }
    }
}

/// Ranges and refresh intervals of the built-in sensors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorSettings {
    pub visible_range: f64,
    pub visible_interval: u64,
    /// How long `hurt_by` memories last after a hit.
    pub hurt_memory_ticks: u64,
    pub flower_range: f64,
    pub flower_interval: u64,
    pub item_range: f64,
    pub item_interval: u64,
    pub drowsy_interval: u64,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            visible_range: 16.0,
            visible_interval: 1,
            hurt_memory_ticks: 100,
            flower_range: 8.0,
            flower_interval: 20,
            item_range: 8.0,
            item_interval: 5,
            drowsy_interval: 20,
        }
    }
}
