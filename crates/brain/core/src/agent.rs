//! Identifiers, positions and the read-only agent snapshot.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::expression::{QueryStruct, Value};

/// Unique identifier for a simulated agent.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier for an item lying in the world.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Simulation tick counter. Cooldowns and expiries are measured in ticks.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// True on every tick that is a multiple of `interval`.
    ///
    /// An interval of zero never fires.
    #[inline]
    pub const fn is_multiple_of(self, interval: u64) -> bool {
        interval != 0 && self.0 % interval == 0
    }
}

impl Add<u64> for Tick {
    type Output = Tick;

    fn add(self, rhs: u64) -> Tick {
        Tick(self.0.saturating_add(rhs))
    }
}

impl Sub for Tick {
    type Output = u64;

    fn sub(self, rhs: Tick) -> u64 {
        self.0.saturating_sub(rhs.0)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Continuous world position. `y` is height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Distance ignoring height.
    pub fn horizontal_distance(&self, other: &Position) -> f64 {
        let (dx, dz) = (other.x - self.x, other.z - self.z);
        (dx * dx + dz * dz).sqrt()
    }

    #[must_use]
    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Position {
        Position::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Moves at most `max_step` toward `target`, landing on it when close enough.
    #[must_use]
    pub fn step_toward(&self, target: &Position, max_step: f64) -> Position {
        let distance = self.distance(target);
        if distance <= max_step || distance <= f64::EPSILON {
            return *target;
        }
        let t = max_step / distance;
        Position::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
            self.z + (target.z - self.z) * t,
        )
    }

    /// Point `distance` away from `threat`, on the far side of `self`.
    #[must_use]
    pub fn away_from(&self, threat: &Position, distance: f64) -> Position {
        let (dx, dz) = (self.x - threat.x, self.z - threat.z);
        let len = (dx * dx + dz * dz).sqrt();
        if len <= f64::EPSILON {
            return self.offset(distance, 0.0, 0.0);
        }
        self.offset(dx / len * distance, 0.0, dz / len * distance)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Species name, compared case-sensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Species(String);

impl Species {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Species {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Point-in-time view of an agent, cheap to clone.
///
/// Tasks read other agents through this snapshot; they never hold a
/// reference into the world across a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentInfo {
    pub id: AgentId,
    pub species: Species,
    pub level: u32,
    pub health: f64,
    pub max_health: f64,
    pub position: Position,
    pub in_water: bool,
    pub in_lava: bool,
}

impl AgentInfo {
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn health_ratio(&self) -> f64 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    pub fn distance_to(&self, other: &AgentInfo) -> f64 {
        self.position.distance(&other.position)
    }
}

/// Exposed to expressions as `q.entity.<property>`.
impl QueryStruct for AgentInfo {
    fn query(&self, property: &str) -> Option<Value> {
        let value = match property {
            "id" => Value::Number(f64::from(self.id.0)),
            "species" => Value::Text(self.species.as_str().to_owned()),
            "level" => Value::Number(f64::from(self.level)),
            "health" => Value::Number(self.health),
            "max_health" => Value::Number(self.max_health),
            "health_ratio" => Value::Number(self.health_ratio()),
            "is_alive" => Value::Bool(self.is_alive()),
            "is_in_water" => Value::Bool(self.in_water),
            "is_in_lava" => Value::Bool(self.in_lava),
            "x" => Value::Number(self.position.x),
            "y" => Value::Number(self.position.y),
            "z" => Value::Number(self.position.z),
            _ => return None,
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(level: u32) -> AgentInfo {
        AgentInfo {
            id: AgentId(7),
            species: Species::new("mareep"),
            level,
            health: 5.0,
            max_health: 20.0,
            position: Position::new(1.0, 64.0, -3.0),
            in_water: false,
            in_lava: false,
        }
    }

    #[test]
    fn tick_interval_never_fires_on_zero() {
        assert!(Tick(120).is_multiple_of(60));
        assert!(!Tick(121).is_multiple_of(60));
        assert!(!Tick(0).is_multiple_of(0));
    }

    #[test]
    fn step_toward_lands_on_target_when_close() {
        let from = Position::new(0.0, 0.0, 0.0);
        let to = Position::new(3.0, 0.0, 4.0);
        assert_eq!(from.step_toward(&to, 10.0), to);

        let mid = from.step_toward(&to, 2.5);
        assert!((mid.distance(&from) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn snapshot_exposes_query_properties() {
        let agent = info(12);
        assert_eq!(agent.query("level"), Some(Value::Number(12.0)));
        assert_eq!(agent.query("health_ratio"), Some(Value::Number(0.25)));
        assert_eq!(agent.query("species"), Some(Value::Text("mareep".into())));
        assert_eq!(agent.query("is_alive"), Some(Value::Bool(true)));
        assert_eq!(agent.query("wingspan"), None);
    }
}
