//! Night-time rest: finding a spot, falling asleep and waking up.

use behavior_tree::BehaviorFault;
use brain_core::{
    Activity, CompiledParam, ConfigError, FeatureKind, Intent, MemoryKey, MemoryRequirement,
    MemoryValue, ParamBinding, Pose, SensorKind, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, walk_speed, walk_to};

/// Distance within which the agent counts as standing on its rest spot.
const AT_REST_SPOT: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FindRestingPlaceConfig {
    pub horizontal_range: ParamBinding,
    pub vertical_range: ParamBinding,
    pub speed: ParamBinding,
    /// Back-off written on every search, successful or not.
    pub cooldown_ticks: ParamBinding,
}

impl Default for FindRestingPlaceConfig {
    fn default() -> Self {
        Self {
            horizontal_range: ParamBinding::from(16.0),
            vertical_range: ParamBinding::from(4.0),
            speed: walk_speed(),
            cooldown_ticks: ParamBinding::from(80.0),
        }
    }
}

impl TaskDefinition for FindRestingPlaceConfig {
    fn tag(&self) -> &'static str {
        "find_resting_place"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("horizontal_range", &self.horizontal_range),
            ("vertical_range", &self.vertical_range),
            ("speed", &self.speed),
            ("cooldown_ticks", &self.cooldown_ticks),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let task = FindRestingPlace {
            horizontal: ctx.resolve_number(&self.horizontal_range, "horizontal_range")?,
            vertical: ctx.resolve_number(&self.vertical_range, "vertical_range")?,
            speed: ctx.simplify(&self.speed, "speed")?,
            cooldown: ctx.resolve_ticks(&self.cooldown_ticks, "cooldown_ticks")?,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

pub struct FindRestingPlace {
    horizontal: f64,
    vertical: f64,
    speed: CompiledParam,
    cooldown: u64,
}

impl LeafTask for FindRestingPlace {
    fn name(&self) -> &'static str {
        "find_resting_place"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::Drowsy),
            MemoryRequirement::absent(MemoryKey::Sleeping),
            MemoryRequirement::absent(MemoryKey::WalkTarget),
            MemoryRequirement::absent(MemoryKey::PathCooldown),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[
            MemoryKey::Sleeping,
            MemoryKey::WalkTarget,
            MemoryKey::LookTarget,
            MemoryKey::PathCooldown,
            MemoryKey::RestPosition,
        ]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::Drowsy]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        ctx.remember_for(MemoryKey::PathCooldown, MemoryValue::Flag, self.cooldown)?;

        let me = ctx.me()?;
        let Some(spot) =
            ctx.world
                .find_feature(me.position, FeatureKind::RestSpot, self.horizontal, self.vertical)
        else {
            return Ok(false);
        };
        ctx.remember(MemoryKey::RestPosition, MemoryValue::Position(spot))?;
        if me.position.distance(&spot) <= AT_REST_SPOT {
            return Ok(false);
        }

        let speed = ctx.resolve_number(&self.speed)?;
        walk_to(ctx, spot, speed, 1.0)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoToSleepConfig {
    /// Activity switched to while asleep, if the agent schedules it.
    pub activity: Activity,
}

impl Default for GoToSleepConfig {
    fn default() -> Self {
        Self {
            activity: Activity::Rest,
        }
    }
}

impl TaskDefinition for GoToSleepConfig {
    fn tag(&self) -> &'static str {
        "go_to_sleep"
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        Ok(vec![ctx.leaf(GoToSleep {
            activity: self.activity,
        })?])
    }
}

pub struct GoToSleep {
    activity: Activity,
}

impl LeafTask for GoToSleep {
    fn name(&self) -> &'static str {
        "go_to_sleep"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::Drowsy),
            MemoryRequirement::absent(MemoryKey::Sleeping),
            MemoryRequirement::absent(MemoryKey::WalkTarget),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[
            MemoryKey::Sleeping,
            MemoryKey::WalkTarget,
            MemoryKey::RestPosition,
        ]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::Drowsy]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let me = ctx.me()?;
        if let Some(spot) = ctx.memory(MemoryKey::RestPosition).and_then(|v| v.as_position())
            && me.position.distance(&spot) > AT_REST_SPOT
        {
            return Ok(false);
        }

        ctx.issue(Intent::SetPose(Pose::Sleeping));
        ctx.remember(MemoryKey::Sleeping, MemoryValue::Flag)?;
        let agent = ctx.agent;
        if let Some(activities) = ctx.world.activities_mut(agent) {
            activities.set_active(self.activity);
        }
        debug!(target: "brain::tick", %agent, "fell asleep");
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WakeUpConfig {
    /// Activity resumed on waking.
    pub activity: Activity,
}

impl Default for WakeUpConfig {
    fn default() -> Self {
        Self {
            activity: Activity::Idle,
        }
    }
}

impl TaskDefinition for WakeUpConfig {
    fn tag(&self) -> &'static str {
        "wake_up"
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        Ok(vec![ctx.leaf(WakeUp {
            activity: self.activity,
        })?])
    }
}

/// Wakes when no longer drowsy, or immediately when hurt.
pub struct WakeUp {
    activity: Activity,
}

impl LeafTask for WakeUp {
    fn name(&self) -> &'static str {
        "wake_up"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] =
            &[MemoryRequirement::present(MemoryKey::Sleeping)];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::Sleeping, MemoryKey::RestPosition]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::Drowsy]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let drowsy = ctx.memory(MemoryKey::Drowsy).is_some();
        let hurt = ctx.memory(MemoryKey::HurtBy).is_some();
        if drowsy && !hurt {
            return Ok(false);
        }

        ctx.issue(Intent::SetPose(Pose::Standing));
        ctx.forget(MemoryKey::Sleeping);
        ctx.forget(MemoryKey::RestPosition);
        let agent = ctx.agent;
        if let Some(activities) = ctx.world.activities_mut(agent) {
            activities.set_active(self.activity);
        }
        debug!(target: "brain::tick", %agent, hurt, "woke up");
        Ok(true)
    }
}
