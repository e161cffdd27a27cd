//! Retaliation and melee attacks.

use behavior_tree::BehaviorFault;
use brain_core::{
    Activity, ConfigError, DeclaredVariable, Intent, MemoryKey, MemoryRequirement, MemoryValue,
    ParamBinding, SensorKind, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, malformed_memory, walk_to};

/// `retaliate`: turns the last attacker into the attack target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetaliateConfig {
    pub condition: ParamBinding,
}

impl Default for RetaliateConfig {
    fn default() -> Self {
        Self {
            condition: ParamBinding::variable(DeclaredVariable::boolean(
                "combat",
                "retaliates",
                true,
            )),
        }
    }
}

impl TaskDefinition for RetaliateConfig {
    fn tag(&self) -> &'static str {
        "retaliate"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("condition", &self.condition)]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !ctx.resolve_bool(&self.condition, "condition")? {
            return Ok(Vec::new());
        }
        Ok(vec![ctx.leaf(Retaliate)?])
    }
}

pub struct Retaliate;

impl LeafTask for Retaliate {
    fn name(&self) -> &'static str {
        "retaliate"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::HurtByEntity),
            MemoryRequirement::absent(MemoryKey::AttackTarget),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::AttackTarget]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::HurtBy]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let attacker = ctx
            .memory(MemoryKey::HurtByEntity)
            .and_then(|value| value.as_agent())
            .ok_or_else(|| malformed_memory("retaliate", MemoryKey::HurtByEntity))?;
        if !ctx.world.agent(attacker).is_some_and(|info| info.is_alive()) {
            return Ok(false);
        }

        ctx.remember(MemoryKey::AttackTarget, MemoryValue::Agent(attacker))?;
        let agent = ctx.agent;
        if let Some(activities) = ctx.world.activities_mut(agent) {
            activities.set_active(Activity::Fight);
        }
        debug!(target: "brain::tick", %agent, %attacker, "retaliating");
        Ok(true)
    }
}

/// `melee_attack`: closes in on the attack target and strikes on a cooldown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeleeAttackConfig {
    pub range: ParamBinding,
    pub cooldown_ticks: ParamBinding,
    pub chase_speed: ParamBinding,
}

impl Default for MeleeAttackConfig {
    fn default() -> Self {
        Self {
            range: ParamBinding::from(2.0),
            cooldown_ticks: ParamBinding::variable(DeclaredVariable::number(
                "combat",
                "attack_cooldown",
                20.0,
            )),
            chase_speed: ParamBinding::from(0.5),
        }
    }
}

impl TaskDefinition for MeleeAttackConfig {
    fn tag(&self) -> &'static str {
        "melee_attack"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("range", &self.range),
            ("cooldown_ticks", &self.cooldown_ticks),
            ("chase_speed", &self.chase_speed),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let task = MeleeAttack {
            range: ctx.resolve_number(&self.range, "range")?,
            cooldown: ctx.resolve_ticks(&self.cooldown_ticks, "cooldown_ticks")?,
            chase_speed: ctx.resolve_number(&self.chase_speed, "chase_speed")?,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

pub struct MeleeAttack {
    range: f64,
    cooldown: u64,
    chase_speed: f64,
}

impl LeafTask for MeleeAttack {
    fn name(&self) -> &'static str {
        "melee_attack"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::AttackTarget),
            MemoryRequirement::absent(MemoryKey::AttackCooling),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[
            MemoryKey::AttackTarget,
            MemoryKey::AttackCooling,
            MemoryKey::WalkTarget,
            MemoryKey::LookTarget,
        ]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let target = ctx
            .memory(MemoryKey::AttackTarget)
            .and_then(|value| value.as_agent())
            .ok_or_else(|| malformed_memory("melee_attack", MemoryKey::AttackTarget))?;
        let Some(victim) = ctx.world.agent(target).filter(|info| info.is_alive()) else {
            ctx.forget(MemoryKey::AttackTarget);
            return Ok(false);
        };

        let me = ctx.me()?;
        if me.distance_to(&victim) > self.range {
            walk_to(ctx, victim.position, self.chase_speed, self.range * 0.5)?;
            return Ok(true);
        }

        ctx.issue(Intent::LookAt(victim.position));
        ctx.issue(Intent::Attack(target));
        ctx.remember_for(MemoryKey::AttackCooling, MemoryValue::Flag, self.cooldown)?;
        Ok(true)
    }
}
