//! Contract between compiled behaviors and the agent runtime.

use serde::{Deserialize, Serialize};

use crate::activity::ActivityScheduler;
use crate::agent::{AgentId, AgentInfo, ItemId, Position, Tick};
use crate::blackboard::Blackboard;
use crate::expression::{QueryStruct, Value};
use crate::herd::HerdProfile;
use crate::intent::Intent;

/// Current tick plus the day cycle, exposed to expressions as `q.world.*`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldClock {
    pub now: Tick,
    pub day_length: u64,
}

impl WorldClock {
    pub const DEFAULT_DAY_LENGTH: u64 = 24_000;

    pub fn new(now: Tick, day_length: u64) -> Self {
        Self { now, day_length }
    }

    pub fn time_of_day(&self) -> u64 {
        if self.day_length == 0 {
            0
        } else {
            self.now.value() % self.day_length
        }
    }

    /// Night is the second half of each day.
    pub fn is_night(&self) -> bool {
        self.day_length > 0 && self.time_of_day() >= self.day_length / 2
    }
}

impl QueryStruct for WorldClock {
    fn query(&self, property: &str) -> Option<Value> {
        let value = match property {
            "time" => Value::Number(self.now.value() as f64),
            "time_of_day" => Value::Number(self.time_of_day() as f64),
            "day_length" => Value::Number(self.day_length as f64),
            "is_night" => Value::Bool(self.is_night()),
            "is_day" => Value::Bool(!self.is_night()),
            _ => return None,
        };
        Some(value)
    }
}

/// Static terrain features tasks search for.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    RestSpot,
    Flower,
    Water,
    Lava,
}

/// What the runtime exposes to tasks and sensors.
///
/// Every agent-scoped method returns `None` for an unknown agent rather
/// than failing; agents may despawn between the time an id is remembered
/// and the time it is read.
pub trait AgentWorld {
    fn clock(&self) -> WorldClock;

    fn now(&self) -> Tick {
        self.clock().now
    }

    /// Ids of every live agent in ascending order.
    fn agent_ids(&self) -> Vec<AgentId>;

    fn agent(&self, id: AgentId) -> Option<AgentInfo>;

    fn herd_profile(&self, id: AgentId) -> Option<&HerdProfile>;

    fn blackboard(&self, id: AgentId) -> Option<&Blackboard>;

    fn blackboard_mut(&mut self, id: AgentId) -> Option<&mut Blackboard>;

    fn activities(&self, id: AgentId) -> Option<&ActivityScheduler>;

    fn activities_mut(&mut self, id: AgentId) -> Option<&mut ActivityScheduler>;

    /// Nearest feature of `kind` within the given box around `origin`.
    fn find_feature(
        &self,
        origin: Position,
        kind: FeatureKind,
        horizontal: f64,
        vertical: f64,
    ) -> Option<Position>;

    /// Snaps a candidate position onto walkable ground, or `None` when the
    /// position is outside the world.
    fn walkable(&self, candidate: Position) -> Option<Position>;

    fn item_position(&self, item: ItemId) -> Option<Position>;

    /// Nearest item within `range` of `origin`.
    fn nearest_item(&self, origin: Position, range: f64) -> Option<ItemId>;

    /// Most recent attacker of `id` and the tick of the hit.
    fn last_attacker(&self, id: AgentId) -> Option<(AgentId, Tick)>;

    /// Queues a request for the runtime to apply after the brain tick.
    fn issue(&mut self, agent: AgentId, intent: Intent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_splits_day_and_night() {
        let clock = WorldClock::new(Tick(13_000), 24_000);
        assert!(clock.is_night());
        assert_eq!(clock.query("is_day"), Some(Value::Bool(false)));

        let clock = WorldClock::new(Tick(24_000 + 100), 24_000);
        assert_eq!(clock.time_of_day(), 100);
        assert!(!clock.is_night());
    }
}
