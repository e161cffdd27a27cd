//! Periodic perception contract.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::BlackboardError;
use crate::memory::MemoryKey;
use crate::world::AgentWorld;

/// Sensors a task can ask for. The runtime decides how each is built.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    NearestVisible,
    HurtBy,
    Drowsy,
    NearbyFlower,
    WantedItem,
}

impl SensorKind {
    /// Memories the sensor writes; registered alongside the sensor.
    pub const fn memories(self) -> &'static [MemoryKey] {
        match self {
            SensorKind::NearestVisible => &[MemoryKey::NearestVisibleAgents],
            SensorKind::HurtBy => &[MemoryKey::HurtBy, MemoryKey::HurtByEntity],
            SensorKind::Drowsy => &[MemoryKey::Drowsy],
            SensorKind::NearbyFlower => &[MemoryKey::NearbyFlower],
            SensorKind::WantedItem => &[MemoryKey::WantedItem],
        }
    }
}

/// Writes derived perception values into an agent's blackboard.
///
/// Sensors run before any task of the tick, on ticks that are a multiple
/// of [`Sensor::interval`].
pub trait Sensor: Send + Sync {
    fn kind(&self) -> SensorKind;

    fn interval(&self) -> u64 {
        1
    }

    /// Memories this sensor writes; they are registered on every agent it serves.
    fn memories(&self) -> &'static [MemoryKey] {
        self.kind().memories()
    }

    fn sense(&self, agent: AgentId, world: &mut dyn AgentWorld) -> Result<(), BlackboardError>;
}
