//! Scenario files: who spawns where, and what the world contains.

use std::collections::BTreeMap;

use brain_core::{AgentId, FeatureKind, ItemId, Position, Tick, VariableOverride};
use serde::{Deserialize, Serialize};

/// Initial world state for one simulation run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub terrain: TerrainSpec,
    pub agents: Vec<SpawnSpec>,
    pub features: Vec<FeatureSpec>,
    pub items: Vec<ItemSpec>,
    /// Scripted damage, applied at the start of the given tick.
    pub hits: Vec<HitSpec>,
}

/// Flat ground: every walkable position sits on `ground_level`, within
/// `half_extent` of the origin on both horizontal axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSpec {
    pub ground_level: f64,
    pub half_extent: f64,
}

impl Default for TerrainSpec {
    fn default() -> Self {
        Self {
            ground_level: 64.0,
            half_extent: 64.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnSpec {
    /// Explicit id; assigned in spawn order when omitted.
    #[serde(default)]
    pub id: Option<AgentId>,
    pub template: String,
    #[serde(default = "SpawnSpec::default_level")]
    pub level: u32,
    pub position: Position,
    /// Starting health; the template's maximum when omitted.
    #[serde(default)]
    pub health: Option<f64>,
    /// Per-spawn variable overrides, applied after the template's.
    #[serde(default)]
    pub overrides: BTreeMap<String, VariableOverride>,
}

impl SpawnSpec {
    fn default_level() -> u32 {
        1
    }

    pub fn new(template: impl Into<String>, level: u32, position: Position) -> Self {
        Self {
            id: None,
            template: template.into(),
            level,
            position,
            health: None,
            overrides: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: AgentId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_override(mut self, name: &str, value: impl Into<VariableOverride>) -> Self {
        self.overrides.insert(name.to_owned(), value.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub kind: FeatureKind,
    pub position: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub id: ItemId,
    pub position: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitSpec {
    pub tick: Tick,
    pub attacker: AgentId,
    pub victim: AgentId,
    pub damage: f64,
}
