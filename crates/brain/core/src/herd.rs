//! Herd membership rules carried by each template.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentInfo, Species};

/// A species this agent is willing to follow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToleratedLeader {
    pub species: Species,
    /// Lets a lower-level agent of this species lead.
    #[serde(default)]
    pub allow_lower_level: bool,
}

impl ToleratedLeader {
    pub fn new(species: impl Into<Species>) -> Self {
        Self {
            species: species.into(),
            allow_lower_level: false,
        }
    }
}

/// Who an agent may follow and how many may follow it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HerdProfile {
    #[serde(default)]
    pub tolerated_leaders: Vec<ToleratedLeader>,
    /// Largest number of followers this agent accepts as a leader.
    #[serde(default = "HerdProfile::default_max_size")]
    pub max_size: u32,
}

impl HerdProfile {
    pub const DEFAULT_MAX_SIZE: u32 = 6;

    fn default_max_size() -> u32 {
        Self::DEFAULT_MAX_SIZE
    }

    pub fn new(tolerated_leaders: Vec<ToleratedLeader>, max_size: u32) -> Self {
        Self {
            tolerated_leaders,
            max_size,
        }
    }

    /// The definition under which `follower` would accept `candidate`.
    pub fn match_leader(
        &self,
        follower: &AgentInfo,
        candidate: &AgentInfo,
    ) -> Option<&ToleratedLeader> {
        self.tolerated_leaders.iter().find(|tolerated| {
            tolerated.species == candidate.species
                && (tolerated.allow_lower_level || candidate.level >= follower.level)
        })
    }

    /// Species check alone, used when re-validating an existing leader.
    pub fn tolerates_species(&self, species: &Species) -> bool {
        self.tolerated_leaders.iter().any(|t| &t.species == species)
    }
}

impl Default for HerdProfile {
    fn default() -> Self {
        Self::new(Vec::new(), Self::DEFAULT_MAX_SIZE)
    }
}
