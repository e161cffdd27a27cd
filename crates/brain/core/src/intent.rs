//! Requests a task makes of the agent runtime.
//!
//! Tasks never move bodies or play animations themselves; they issue an
//! [`Intent`] and the runtime applies it after the brain tick.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, ItemId, Position};

/// Where to walk and how.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalkTarget {
    pub position: Position,
    /// Multiplier applied to the agent's base movement speed.
    pub speed: f64,
    /// The target counts as reached within this distance.
    pub completion_range: f64,
}

impl WalkTarget {
    pub fn new(position: Position, speed: f64, completion_range: f64) -> Self {
        Self {
            position,
            speed,
            completion_range,
        }
    }

    pub fn is_reached_from(&self, from: &Position) -> bool {
        from.distance(&self.position) <= self.completion_range.max(0.5)
    }
}

/// Body pose.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Pose {
    #[default]
    Standing,
    Sleeping,
}

/// Something a task wants the runtime to do on the agent's behalf.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Walk(WalkTarget),
    LookAt(Position),
    StopMoving,
    Attack(AgentId),
    PickUp(ItemId),
    SetPose(Pose),
    /// Toggle a cosmetic aspect such as `has_nectar`.
    SetAspect { name: String, enabled: bool },
    PlaySound(String),
}
