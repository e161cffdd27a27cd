//! Flower visits: walking to a flower and pollinating it over many ticks.

use behavior_tree::BehaviorFault;
use brain_core::{
    CompiledParam, ConfigError, Intent, MemoryKey, MemoryRequirement, MemoryValue, ParamBinding,
    Position, SensorKind, TaskContext, TaskUnit,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::{LeafTask, malformed_memory, walk_speed, walk_to};

/// Aspect toggled on while the agent carries nectar.
pub const NECTAR_ASPECT: &str = "has_nectar";

/// Distance within which a flower can be pollinated.
const POLLINATE_RANGE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathToFlowerConfig {
    pub speed: ParamBinding,
}

impl Default for PathToFlowerConfig {
    fn default() -> Self {
        Self { speed: walk_speed() }
    }
}

impl TaskDefinition for PathToFlowerConfig {
    fn tag(&self) -> &'static str {
        "path_to_flower"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("speed", &self.speed)]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let speed = ctx.simplify(&self.speed, "speed")?;
        Ok(vec![ctx.leaf(PathToFlower { speed })?])
    }
}

pub struct PathToFlower {
    speed: CompiledParam,
}

impl LeafTask for PathToFlower {
    fn name(&self) -> &'static str {
        "path_to_flower"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::NearbyFlower),
            MemoryRequirement::absent(MemoryKey::HasNectar),
            MemoryRequirement::absent(MemoryKey::PollinateCooldown),
            MemoryRequirement::absent(MemoryKey::WalkTarget),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[
            MemoryKey::HasNectar,
            MemoryKey::PollinateCooldown,
            MemoryKey::WalkTarget,
            MemoryKey::LookTarget,
        ]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::NearbyFlower]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let flower = flower(ctx, "path_to_flower")?;
        let me = ctx.me()?;
        if me.position.distance(&flower) <= POLLINATE_RANGE {
            return Ok(false);
        }
        let speed = ctx.resolve_number(&self.speed)?;
        walk_to(ctx, flower, speed, POLLINATE_RANGE * 0.5)?;
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollinateFlowerConfig {
    /// Consecutive ticks spent at the flower before nectar is collected.
    pub required_ticks: ParamBinding,
    pub cooldown_ticks: ParamBinding,
}

impl Default for PollinateFlowerConfig {
    fn default() -> Self {
        Self {
            required_ticks: ParamBinding::from(400.0),
            cooldown_ticks: ParamBinding::from(200.0),
        }
    }
}

impl TaskDefinition for PollinateFlowerConfig {
    fn tag(&self) -> &'static str {
        "pollinate_flower"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![
            ("required_ticks", &self.required_ticks),
            ("cooldown_ticks", &self.cooldown_ticks),
        ]
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        let task = PollinateFlower {
            required: ctx.resolve_interval(&self.required_ticks, "required_ticks")?,
            cooldown: ctx.resolve_ticks(&self.cooldown_ticks, "cooldown_ticks")?,
            elapsed: 0,
            flower: None,
        };
        Ok(vec![ctx.leaf(task)?])
    }
}

/// Accumulates ticks spent next to one flower; moving away or switching
/// flowers starts over.
pub struct PollinateFlower {
    required: u64,
    cooldown: u64,
    elapsed: u64,
    flower: Option<Position>,
}

impl LeafTask for PollinateFlower {
    fn name(&self) -> &'static str {
        "pollinate_flower"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        const REQUIREMENTS: &[MemoryRequirement] = &[
            MemoryRequirement::present(MemoryKey::NearbyFlower),
            MemoryRequirement::absent(MemoryKey::HasNectar),
            MemoryRequirement::absent(MemoryKey::PollinateCooldown),
        ];
        REQUIREMENTS
    }

    fn memories(&self) -> &[MemoryKey] {
        &[MemoryKey::HasNectar, MemoryKey::PollinateCooldown]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[SensorKind::NearbyFlower]
    }

    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        let flower = flower(ctx, "pollinate_flower")?;
        let me = ctx.me()?;
        if me.position.distance(&flower) > POLLINATE_RANGE {
            self.elapsed = 0;
            self.flower = None;
            return Ok(false);
        }
        if self.flower != Some(flower) {
            self.flower = Some(flower);
            self.elapsed = 0;
            ctx.issue(Intent::LookAt(flower));
        }

        self.elapsed += 1;
        if self.elapsed < self.required {
            return Ok(true);
        }

        self.elapsed = 0;
        self.flower = None;
        ctx.remember(MemoryKey::HasNectar, MemoryValue::Flag)?;
        ctx.remember_for(MemoryKey::PollinateCooldown, MemoryValue::Flag, self.cooldown)?;
        ctx.issue(Intent::SetAspect {
            name: NECTAR_ASPECT.to_owned(),
            enabled: true,
        });
        debug!(target: "brain::tick", agent = %me.id, %flower, "collected nectar");
        Ok(true)
    }
}

fn flower(ctx: &TaskContext<'_>, node: &'static str) -> Result<Position, BehaviorFault> {
    ctx.memory(MemoryKey::NearbyFlower)
        .and_then(|value| value.as_position())
        .ok_or_else(|| malformed_memory(node, MemoryKey::NearbyFlower))
}
