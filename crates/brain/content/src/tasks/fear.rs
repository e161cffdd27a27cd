//! Reactions to being hurt: fleeing, panicking and calming down.

use behavior_tree::BehaviorFault;
use brain_core::{
    Activity, ConfigError, DeclaredVariable, Intent, MemoryKey, MemoryRequirement, ParamBinding,
    SensorKind, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, malformed_memory, walk_to};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleeAttackerConfig {
    pub condition: ParamBinding,
    pub speed: ParamBinding,
    /// Distance from the attacker at which the agent stops fleeing.
    pub desired_distance: ParamBinding,
}

impl Default for FleeAttackerConfig {
    fn default() -> Self {
        Self {
            condition: ParamBinding::variable(DeclaredVariable::boolean(
                "fear",
                "flee_attacker",
                true,
            )),
            speed: ParamBinding::variable(DeclaredVariable::number("fear", "flee_speed", 0.5)),
            desired_distance: ParamBinding::from(9.0),
        }
    }
}

impl TaskDefinition for FleeAttackerConfig {
    fn tag(&self) -> &'static str {
        "flee_attacker"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("condition", &self.condition),
            ("speed", &self.speed),
            ("desired_distance", &self.desired_distance),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !ctx.resolve_bool(&self.condition, "condition")? {
            return Ok(Vec::new());
        }
        let task = FleeAttacker {
            speed: ctx.resolve_number(&self.speed, "speed")?,
            desired_distance: ctx.resolve_number(&self.desired_distance, "desired_distance")?,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

pub struct FleeAttacker {
    speed: f64,
    desired_distance: f64,
}

impl LeafTask for FleeAttacker {
    fn name(&self) -> &'static str {
        "flee_attacker"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::HurtByEntity),
            MemoryRequirement::registered(MemoryKey::WalkTarget),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::WalkTarget, MemoryKey::LookTarget]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::HurtBy]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let attacker = ctx
            .memory(MemoryKey::HurtByEntity)
            .and_then(|value| value.as_agent())
            .ok_or_else(|| malformed_memory("flee_attacker", MemoryKey::HurtByEntity))?;
        let Some(attacker) = ctx.world.agent(attacker) else {
            return Ok(false);
        };

        let me = ctx.me()?;
        if me.distance_to(&attacker) >= self.desired_distance {
            return Ok(false);
        }
        let away = me.position.away_from(&attacker.position, self.desired_distance);
        let Some(destination) = ctx.world.walkable(away) else {
            return Ok(false);
        };
        walk_to(ctx, destination, self.speed, 0.0)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchToPanicWhenHurtConfig {
    pub condition: ParamBinding,
}

impl Default for SwitchToPanicWhenHurtConfig {
    fn default() -> Self {
        Self {
            condition: ParamBinding::variable(DeclaredVariable::boolean(
                "fear",
                "panic_when_hurt",
                true,
            )),
        }
    }
}

impl TaskDefinition for SwitchToPanicWhenHurtConfig {
    fn tag(&self) -> &'static str {
        "switch_to_panic_when_hurt"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("condition", &self.condition)]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !ctx.resolve_bool(&self.condition, "condition")? {
            return Ok(Vec::new());
        }
        Ok(vec![ctx.leaf(SwitchToPanic)?])
    }
}

pub struct SwitchToPanic;

impl LeafTask for SwitchToPanic {
    fn name(&self) -> &'static str {
        "switch_to_panic_when_hurt"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] =
            &[MemoryRequirement::present(MemoryKey::HurtBy)];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::WalkTarget]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::HurtBy]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let agent = ctx.agent;
        let switched = ctx
            .world
            .activities_mut(agent)
            .is_some_and(|activities| {
                !activities.is_active(Activity::Panic) && activities.set_active(Activity::Panic)
            });
        if !switched {
            return Ok(false);
        }

        ctx.forget(MemoryKey::WalkTarget);
        ctx.issue(Intent::StopMoving);
        debug!(target: "brain::tick", %agent, "hurt; switching to panic");
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalmDownConfig {
    /// Activity to return to once no longer hurt.
    pub activity: Activity,
}

impl Default for CalmDownConfig {
    fn default() -> Self {
        Self {
            activity: Activity::Idle,
        }
    }
}

impl TaskDefinition for CalmDownConfig {
    fn tag(&self) -> &'static str {
        "calm_down"
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        Ok(vec![ctx.leaf(CalmDown {
            activity: self.activity,
        })?])
    }
}

pub struct CalmDown {
    activity: Activity,
}

impl LeafTask for CalmDown {
    fn name(&self) -> &'static str {
        "calm_down"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] =
            &[MemoryRequirement::absent(MemoryKey::HurtBy)];
        REQUIREMENTS
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::HurtBy]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let agent = ctx.agent;
        let target = self.activity;
        let calmed = ctx.world.activities_mut(agent).is_some_and(|activities| {
            let agitated =
                activities.is_active(Activity::Panic) || activities.is_active(Activity::Fight);
            agitated && activities.set_active(target)
        });
        if !calmed {
            return Ok(false);
        }

        ctx.forget(MemoryKey::AttackTarget);
        debug!(target: "brain::tick", %agent, activity = %target, "calmed down");
        Ok(true)
    }
}
