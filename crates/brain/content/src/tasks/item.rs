//! `move_to_item`: walks to a wanted item and gives up after a while.

use behavior_tree::BehaviorFault;
use brain_core::{
    CompiledParam, ConfigError, Intent, MemoryKey, MemoryRequirement, MemoryValue, ParamBinding,
    SensorKind, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, malformed_memory, walk_to};

/// Distance at which the item can be picked up.
const PICKUP_RANGE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoveToItemConfig {
    /// Evaluated every tick against the agent.
    pub condition: ParamBinding,
    pub speed: ParamBinding,
    /// Items farther than this are ignored.
    pub max_distance: ParamBinding,
    /// Ticks spent pursuing one item before giving up.
    pub max_attempts: ParamBinding,
    /// How long pursuit stays disabled after giving up.
    pub disable_ticks: ParamBinding,
}

impl Default for MoveToItemConfig {
    fn default() -> Self {
        Self {
            condition: ParamBinding::from(true),
            speed: ParamBinding::from(0.6),
            max_distance: ParamBinding::from(7.0),
            max_attempts: ParamBinding::from(60.0),
            disable_ticks: ParamBinding::from(100.0),
        }
    }
}

impl TaskDefinition for MoveToItemConfig {
    fn tag(&self) -> &'static str {
        "move_to_item"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("condition", &self.condition),
            ("speed", &self.speed),
            ("max_distance", &self.max_distance),
            ("max_attempts", &self.max_attempts),
            ("disable_ticks", &self.disable_ticks),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let max_attempts = ctx.resolve_ticks(&self.max_attempts, "max_attempts")?;
        let task = MoveToItem {
            condition: ctx.simplify(&self.condition, "condition")?,
            speed: ctx.resolve_number(&self.speed, "speed")?,
            max_distance: ctx.resolve_number(&self.max_distance, "max_distance")?,
            max_attempts: u32::try_from(max_attempts).unwrap_or(u32::MAX),
            disable_ticks: ctx.resolve_ticks(&self.disable_ticks, "disable_ticks")?,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

pub struct MoveToItem {
    condition: CompiledParam,
    speed: f64,
    max_distance: f64,
    max_attempts: u32,
    disable_ticks: u64,
}

impl MoveToItem {
    fn give_up(ctx: &mut TaskContext<'_>) {
        ctx.forget(MemoryKey::WantedItem);
        ctx.forget(MemoryKey::WalkTarget);
        ctx.forget(MemoryKey::TimeTryingToReachItem);
    }
}

impl LeafTask for MoveToItem {
    fn name(&self) -> &'static str {
        "move_to_item"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::WantedItem),
            MemoryRequirement::absent(MemoryKey::DisableWalkToItem),
            MemoryRequirement::registered(MemoryKey::WalkTarget),
            MemoryRequirement::registered(MemoryKey::TimeTryingToReachItem),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[
            MemoryKey::WalkTarget,
            MemoryKey::LookTarget,
            MemoryKey::TimeTryingToReachItem,
            MemoryKey::DisableWalkToItem,
        ]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::WantedItem]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        if !ctx.resolve_bool(&self.condition)? {
            return Ok(false);
        }
        let item = ctx
            .memory(MemoryKey::WantedItem)
            .and_then(|value| value.as_item())
            .ok_or_else(|| malformed_memory("move_to_item", MemoryKey::WantedItem))?;
        let Some(position) = ctx.world.item_position(item) else {
            Self::give_up(ctx);
            return Ok(false);
        };

        let me = ctx.me()?;
        let distance = me.position.distance(&position);
        if distance > self.max_distance {
            return Ok(false);
        }
        if distance <= PICKUP_RANGE {
            ctx.issue(Intent::PickUp(item));
            Self::give_up(ctx);
            return Ok(true);
        }

        let attempts = ctx
            .memory(MemoryKey::TimeTryingToReachItem)
            .and_then(|value| value.as_count())
            .unwrap_or(0)
            + 1;
        if attempts > self.max_attempts {
            Self::give_up(ctx);
            ctx.remember_for(
                MemoryKey::DisableWalkToItem,
                MemoryValue::Flag,
                self.disable_ticks,
            )?;
            debug!(target: "brain::tick", agent = %me.id, %item, attempts, "gave up on item");
            return Ok(true);
        }

        ctx.remember(MemoryKey::TimeTryingToReachItem, MemoryValue::Count(attempts))?;
        walk_to(ctx, position, self.speed, PICKUP_RANGE * 0.5)?;
        Ok(true)
    }
}
