//! Blackboard keys and the values they hold.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, ItemId, Position};
use crate::intent::WalkTarget;

/// Shape of a memory value. Every [`MemoryKey`] accepts exactly one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    Flag,
    Count,
    Number,
    Agent,
    Agents,
    Position,
    WalkTarget,
    Item,
}

/// Typed blackboard key.
///
/// Keys are a closed set so that tasks declare their dependencies in code
/// and a mistyped key is a compile error rather than a silent miss.
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
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemoryKey {
    WalkTarget,
    LookTarget,
    /// Back-off after a path search so it is not retried every tick.
    PathCooldown,
    NearestVisibleAgents,
    HerdLeader,
    HerdSize,
    HurtBy,
    HurtByEntity,
    Drowsy,
    RestPosition,
    Sleeping,
    NearbyFlower,
    HasNectar,
    PollinateCooldown,
    AttackTarget,
    AttackCooling,
    WantedItem,
    TimeTryingToReachItem,
    DisableWalkToItem,
}

impl MemoryKey {
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::WalkTarget => ValueKind::WalkTarget,
            Self::LookTarget | Self::RestPosition | Self::NearbyFlower => ValueKind::Position,
            Self::NearestVisibleAgents => ValueKind::Agents,
            Self::HerdLeader | Self::HurtByEntity | Self::AttackTarget => ValueKind::Agent,
            Self::HerdSize | Self::TimeTryingToReachItem => ValueKind::Count,
            Self::HurtBy => ValueKind::Number,
            Self::WantedItem => ValueKind::Item,
            Self::PathCooldown
            | Self::Drowsy
            | Self::Sleeping
            | Self::HasNectar
            | Self::PollinateCooldown
            | Self::AttackCooling
            | Self::DisableWalkToItem => ValueKind::Flag,
        }
    }
}

/// A value stored in a blackboard slot.
#[derive(Clone, Debug, PartialEq)]
pub enum MemoryValue {
    Flag,
    Count(u32),
    Number(f64),
    Agent(AgentId),
    /// Ordered nearest first.
    Agents(Vec<AgentId>),
    Position(Position),
    WalkTarget(WalkTarget),
    Item(ItemId),
}

impl MemoryValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Flag => ValueKind::Flag,
            Self::Count(_) => ValueKind::Count,
            Self::Number(_) => ValueKind::Number,
            Self::Agent(_) => ValueKind::Agent,
            Self::Agents(_) => ValueKind::Agents,
            Self::Position(_) => ValueKind::Position,
            Self::WalkTarget(_) => ValueKind::WalkTarget,
            Self::Item(_) => ValueKind::Item,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_agent(&self) -> Option<AgentId> {
        match self {
            Self::Agent(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_agents(&self) -> Option<&[AgentId]> {
        match self {
            Self::Agents(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<Position> {
        match self {
            Self::Position(pos) => Some(*pos),
            _ => None,
        }
    }

    pub fn as_walk_target(&self) -> Option<WalkTarget> {
        match self {
            Self::WalkTarget(target) => Some(*target),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<ItemId> {
        match self {
            Self::Item(item) => Some(*item),
            _ => None,
        }
    }
}
