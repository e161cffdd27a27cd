//! `move_into_fluid`: heads for water (or lava) when out of it.

use behavior_tree::BehaviorFault;
use brain_core::{
    CompiledParam, ConfigError, FeatureKind, MemoryKey, MemoryRequirement, MemoryValue,
    ParamBinding, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, walk_speed, walk_to};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoveIntoFluidConfig {
    pub condition: ParamBinding,
    /// Either `water` or `lava`.
    pub fluid: FeatureKind,
    pub horizontal_range: ParamBinding,
    pub vertical_range: ParamBinding,
    pub speed: ParamBinding,
    pub cooldown_ticks: ParamBinding,
}

impl Default for MoveIntoFluidConfig {
    fn default() -> Self {
        Self {
            condition: ParamBinding::from(true),
            fluid: FeatureKind::Water,
            horizontal_range: ParamBinding::from(16.0),
            vertical_range: ParamBinding::from(6.0),
            speed: walk_speed(),
            cooldown_ticks: ParamBinding::from(100.0),
        }
    }
}

impl TaskDefinition for MoveIntoFluidConfig {
    fn tag(&self) -> &'static str {
        "move_into_fluid"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("condition", &self.condition),
            ("horizontal_range", &self.horizontal_range),
            ("vertical_range", &self.vertical_range),
            ("speed", &self.speed),
            ("cooldown_ticks", &self.cooldown_ticks),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !matches!(self.fluid, FeatureKind::Water | FeatureKind::Lava) {
            return Err(ConfigError::InvalidParameter {
                path: ctx.path().clone(),
                field: "fluid",
                message: format!("`{}` is not a fluid", self.fluid),
            });
        }
        if !ctx.resolve_bool(&self.condition, "condition")? {
            return Ok(Vec::new());
        }
        let task = MoveIntoFluid {
            fluid: self.fluid,
            horizontal: ctx.resolve_number(&self.horizontal_range, "horizontal_range")?,
            vertical: ctx.resolve_number(&self.vertical_range, "vertical_range")?,
            speed: ctx.simplify(&self.speed, "speed")?,
            cooldown: ctx.resolve_ticks(&self.cooldown_ticks, "cooldown_ticks")?,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

pub struct MoveIntoFluid {
    fluid: FeatureKind,
    horizontal: f64,
    vertical: f64,
    speed: CompiledParam,
    cooldown: u64,
}

impl LeafTask for MoveIntoFluid {
    fn name(&self) -> &'static str {
        "move_into_fluid"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::absent(MemoryKey::WalkTarget),
            MemoryRequirement::absent(MemoryKey::PathCooldown),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[
            MemoryKey::WalkTarget,
            MemoryKey::LookTarget,
            MemoryKey::PathCooldown,
        ]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let me = ctx.me()?;
        let immersed = match self.fluid {
            FeatureKind::Lava => me.in_lava,
            _ => me.in_water,
        };
        if immersed {
            return Ok(false);
        }

        ctx.remember_for(MemoryKey::PathCooldown, MemoryValue::Flag, self.cooldown)?;
        let Some(target) =
            ctx.world
                .find_feature(me.position, self.fluid, self.horizontal, self.vertical)
        else {
            return Ok(false);
        };
        let speed = ctx.resolve_number(&self.speed)?;
        walk_to(ctx, target, speed, 0.0)?;
        Ok(true)
    }
}
