//! Per-tick execution context handed to every task unit.

use behavior_tree::{Behavior, BehaviorFault, RandomSource};
use rand::Rng;
use rand::rngs::SmallRng;

use crate::agent::{AgentId, AgentInfo, Tick};
use crate::binding::CompiledParam;
use crate::blackboard::{Blackboard, MemoryRequirement};
use crate::error::EvalError;
use crate::expression::{EvalContext, Evaluator};
use crate::intent::Intent;
use crate::memory::{MemoryKey, MemoryValue};
use crate::variable::VariableTable;
use crate::world::AgentWorld;

/// Compiled, per-agent executable behavior.
pub type TaskUnit = Box<dyn for<'w> Behavior<TaskContext<'w>>>;

/// Explicit context for one agent's tick.
///
/// Expressions are evaluated against a fresh [`EvalContext`] built from
/// this struct on each call; nothing survives between calls.
pub struct TaskContext<'w> {
    pub agent: AgentId,
    pub world: &'w mut dyn AgentWorld,
    pub evaluator: &'w dyn Evaluator,
    pub variables: &'w VariableTable,
    pub rng: &'w mut SmallRng,
}

const NODE: &str = "task_context";

impl<'w> TaskContext<'w> {
    pub fn new(
        agent: AgentId,
        world: &'w mut dyn AgentWorld,
        evaluator: &'w dyn Evaluator,
        variables: &'w VariableTable,
        rng: &'w mut SmallRng,
    ) -> Self {
        Self {
            agent,
            world,
            evaluator,
            variables,
            rng,
        }
    }

    pub fn now(&self) -> Tick {
        self.world.now()
    }

    /// Snapshot of the ticking agent.
    pub fn me(&self) -> Result<AgentInfo, BehaviorFault> {
        self.world
            .agent(self.agent)
            .ok_or_else(|| BehaviorFault::new(NODE, format!("agent {} is gone", self.agent)))
    }

    pub fn blackboard(&self) -> Result<&Blackboard, BehaviorFault> {
        self.world
            .blackboard(self.agent)
            .ok_or_else(|| BehaviorFault::new(NODE, format!("agent {} has no blackboard", self.agent)))
    }

    pub fn blackboard_mut(&mut self) -> Result<&mut Blackboard, BehaviorFault> {
        let agent = self.agent;
        self.world
            .blackboard_mut(agent)
            .ok_or_else(|| BehaviorFault::new(NODE, format!("agent {agent} has no blackboard")))
    }

    pub fn satisfies(&self, requirements: &[MemoryRequirement]) -> bool {
        self.world
            .blackboard(self.agent)
            .is_some_and(|board| board.satisfies_all(requirements))
    }

    pub fn memory(&self, key: MemoryKey) -> Option<&MemoryValue> {
        self.world.blackboard(self.agent)?.get(key)
    }

    pub fn remember(&mut self, key: MemoryKey, value: MemoryValue) -> Result<(), BehaviorFault> {
        self.blackboard_mut()?
            .set(key, value)
            .map_err(|e| BehaviorFault::new(NODE, e.to_string()))
    }

    pub fn remember_for(
        &mut self,
        key: MemoryKey,
        value: MemoryValue,
        ttl: u64,
    ) -> Result<(), BehaviorFault> {
        self.blackboard_mut()?
            .set_with_expiry(key, value, ttl)
            .map_err(|e| BehaviorFault::new(NODE, e.to_string()))
    }

    pub fn forget(&mut self, key: MemoryKey) -> bool {
        let agent = self.agent;
        self.world
            .blackboard_mut(agent)
            .is_some_and(|board| board.erase(key))
    }

    pub fn issue(&mut self, intent: Intent) {
        self.world.issue(self.agent, intent);
    }

    /// Uniform roll; true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.rng.r#gen::<f64>() < p
    }

    /// Uniform sample in `[-range, range]`; zero for a non-positive range.
    pub fn spread(&mut self, range: f64) -> Result<f64, BehaviorFault> {
        if !range.is_finite() {
            return Err(BehaviorFault::new(
                NODE,
                format!("sample range must be finite, got {range}"),
            ));
        }
        if range <= 0.0 {
            Ok(0.0)
        } else {
            Ok(self.rng.gen_range(-range..=range))
        }
    }

    pub fn resolve_bool(&self, param: &CompiledParam) -> Result<bool, BehaviorFault> {
        self.with_eval(|evaluator, ctx| param.resolve_bool(evaluator, ctx))
    }

    pub fn resolve_number(&self, param: &CompiledParam) -> Result<f64, BehaviorFault> {
        self.with_eval(|evaluator, ctx| param.resolve_number(evaluator, ctx))
    }

    pub fn resolve_int(&self, param: &CompiledParam) -> Result<i64, BehaviorFault> {
        self.with_eval(|evaluator, ctx| param.resolve_int(evaluator, ctx))
    }

    fn with_eval<T>(
        &self,
        f: impl FnOnce(&dyn Evaluator, &EvalContext<'_>) -> Result<T, EvalError>,
    ) -> Result<T, BehaviorFault> {
        let me = self.me()?;
        let clock = self.world.clock();
        let ctx = EvalContext::new()
            .with_entity(&me)
            .with_world(&clock)
            .with_config(self.variables);
        f(self.evaluator, &ctx).map_err(|e| BehaviorFault::new(NODE, e.to_string()))
    }
}

impl RandomSource for TaskContext<'_> {
    fn next_unit(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }
}
