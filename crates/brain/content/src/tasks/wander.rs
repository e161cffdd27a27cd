//! `wander`: occasionally picks a random nearby destination.

use behavior_tree::BehaviorFault;
use brain_core::{
    CompiledParam, ConfigError, DeclaredVariable, MemoryKey, MemoryRequirement, MemoryValue,
    ParamBinding, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, random_destination, walk_speed, walk_to};

/// Attempts at finding a standable destination before giving up this tick.
const DESTINATION_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WanderConfig {
    /// Compile-time switch; an agent that does not wander gets no unit.
    pub condition: ParamBinding,
    /// Per-tick probability of starting a walk.
    pub wander_chance: ParamBinding,
    pub horizontal_range: ParamBinding,
    pub vertical_range: ParamBinding,
    pub speed: ParamBinding,
    pub path_cooldown_ticks: ParamBinding,
}

impl Default for WanderConfig {
    fn default() -> Self {
        let number = |name: &str, default: f64| {
            ParamBinding::variable(DeclaredVariable::number("wander", name, default))
        };
        Self {
            condition: ParamBinding::variable(DeclaredVariable::boolean("wander", "wanders", true)),
            wander_chance: number("wander_chance", 1.0 / 120.0),
            horizontal_range: number("horizontal_wander_range", 10.0),
            vertical_range: number("vertical_wander_range", 5.0),
            speed: walk_speed(),
            path_cooldown_ticks: ParamBinding::from(40.0),
        }
    }
}

impl TaskDefinition for WanderConfig {
    fn tag(&self) -> &'static str {
        "wander"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("condition", &self.condition),
            ("wander_chance", &self.wander_chance),
            ("horizontal_range", &self.horizontal_range),
            ("vertical_range", &self.vertical_range),
            ("speed", &self.speed),
            ("path_cooldown_ticks", &self.path_cooldown_ticks),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !ctx.resolve_bool(&self.condition, "condition")? {
            return Ok(Vec::new());
        }
        let task = Wander {
            chance: ctx.simplify(&self.wander_chance, "wander_chance")?,
            horizontal: ctx.simplify(&self.horizontal_range, "horizontal_range")?,
            vertical: ctx.simplify(&self.vertical_range, "vertical_range")?,
            speed: ctx.simplify(&self.speed, "speed")?,
            cooldown: ctx.resolve_ticks(&self.path_cooldown_ticks, "path_cooldown_ticks")?,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

const REQUIREMENTS: &[MemoryRequirement] = &[
    MemoryRequirement::absent(MemoryKey::WalkTarget),
    MemoryRequirement::registered(MemoryKey::LookTarget),
    MemoryRequirement::absent(MemoryKey::PathCooldown),
];

const MEMORIES: &[MemoryKey] = &[
    MemoryKey::WalkTarget,
    MemoryKey::LookTarget,
    MemoryKey::PathCooldown,
];

pub struct Wander {
    chance: CompiledParam,
    horizontal: CompiledParam,
    vertical: CompiledParam,
    speed: CompiledParam,
    cooldown: u64,
}

impl LeafTask for Wander {
    fn name(&self) -> &'static str {
        "wander"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        MEMORIES
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let chance = ctx.resolve_number(&self.chance)?;
        if !ctx.chance(chance) {
            return Ok(false);
        }
        ctx.remember_for(MemoryKey::PathCooldown, MemoryValue::Flag, self.cooldown)?;

        let me = ctx.me()?;
        let horizontal = ctx.resolve_number(&self.horizontal)?;
        let vertical = ctx.resolve_number(&self.vertical)?;
        let Some(destination) =
            random_destination(ctx, me.position, horizontal, vertical, DESTINATION_ATTEMPTS)?
        else {
            return Ok(false);
        };

        let speed = ctx.resolve_number(&self.speed)?;
        walk_to(ctx, destination, speed, 0.0)?;
        trace!(target: "brain::tick", agent = %me.id, %destination, "wandering");
        Ok(true)
    }
}
