//! Compile-time context threaded through [`TaskDefinition::create_tasks`].
//!
//! [`TaskDefinition::create_tasks`]: crate::TaskDefinition::create_tasks

use std::collections::BTreeSet;

use brain_core::{
    AgentInfo, CompiledParam, ConfigError, ConfigPath, EvalContext, EvalError, Evaluator,
    MemoryKey, ParamBinding, SensorKind, TaskUnit, Value, VariableTable, WorldClock,
};
use rand::Rng;
use rand::rngs::SmallRng;
use tracing::trace;

use crate::tasks::{Leaf, LeafTask};

/// Everything a task config may consult while turning itself into units
/// for one agent.
///
/// Compile-time guards and parameters are resolved against the agent being
/// instantiated. The context also accumulates the memories and sensors the
/// produced units depend on, so the runtime can register them afterwards.
pub struct CompileContext<'a> {
    path: ConfigPath,
    entity: &'a AgentInfo,
    variables: &'a VariableTable,
    evaluator: &'a dyn Evaluator,
    clock: WorldClock,
    rng: &'a mut SmallRng,
    memories: BTreeSet<MemoryKey>,
    sensors: BTreeSet<SensorKind>,
}

impl<'a> CompileContext<'a> {
    pub fn new(
        path: ConfigPath,
        entity: &'a AgentInfo,
        variables: &'a VariableTable,
        evaluator: &'a dyn Evaluator,
        clock: WorldClock,
        rng: &'a mut SmallRng,
    ) -> Self {
        Self {
            path,
            entity,
            variables,
            evaluator,
            clock,
            rng,
            memories: BTreeSet::new(),
            sensors: BTreeSet::new(),
        }
    }

    /// Path of the node currently being compiled.
    pub fn path(&self) -> &ConfigPath {
        &self.path
    }

    pub fn entity(&self) -> &AgentInfo {
        self.entity
    }

    pub fn variables(&self) -> &VariableTable {
        self.variables
    }

    /// Runs `f` with the current path replaced by `path`.
    pub fn within<T>(&mut self, path: ConfigPath, f: impl FnOnce(&mut Self) -> T) -> T {
        let parent = std::mem::replace(&mut self.path, path);
        let out = f(self);
        self.path = parent;
        out
    }

    /// Simplifies `binding` against the variable table.
    ///
    /// A constant number that is not finite is refused here; dynamic
    /// values are only checked where a task consumes them.
    pub fn simplify(
        &self,
        binding: &ParamBinding,
        field: &'static str,
    ) -> Result<CompiledParam, ConfigError> {
        let param = binding.simplify(self.variables, &self.path.field(field))?;
        if let CompiledParam::Constant(Value::Number(n)) = &param {
            self.finite(*n, field)?;
        }
        Ok(param)
    }

    pub fn resolve_bool(
        &self,
        binding: &ParamBinding,
        field: &'static str,
    ) -> Result<bool, ConfigError> {
        self.resolve_with(binding, field, |param, evaluator, ctx| {
            param.resolve_bool(evaluator, ctx)
        })
    }

    /// Resolves a number, which must be finite.
    pub fn resolve_number(
        &self,
        binding: &ParamBinding,
        field: &'static str,
    ) -> Result<f64, ConfigError> {
        let n = self.resolve_with(binding, field, |param, evaluator, ctx| {
            param.resolve_number(evaluator, ctx)
        })?;
        self.finite(n, field)
    }

    pub fn resolve_int(
        &self,
        binding: &ParamBinding,
        field: &'static str,
    ) -> Result<i64, ConfigError> {
        self.resolve_with(binding, field, |param, evaluator, ctx| {
            param.resolve_int(evaluator, ctx)
        })
    }

    /// Resolves a tick count that must be at least one.
    pub fn resolve_interval(
        &self,
        binding: &ParamBinding,
        field: &'static str,
    ) -> Result<u64, ConfigError> {
        let ticks = self.resolve_int(binding, field)?;
        u64::try_from(ticks)
            .ok()
            .filter(|&ticks| ticks >= 1)
            .ok_or_else(|| ConfigError::InvalidParameter {
                path: self.path.clone(),
                field,
                message: format!("must be at least 1, got {ticks}"),
            })
    }

    /// Resolves a non-negative tick duration.
    pub fn resolve_ticks(
        &self,
        binding: &ParamBinding,
        field: &'static str,
    ) -> Result<u64, ConfigError> {
        let ticks = self.resolve_int(binding, field)?;
        u64::try_from(ticks).map_err(|_| ConfigError::InvalidParameter {
            path: self.path.clone(),
            field,
            message: format!("must not be negative, got {ticks}"),
        })
    }

    /// Uniform draw in `[0, 1)` from the instantiation RNG.
    pub fn draw(&mut self) -> f64 {
        self.rng.r#gen::<f64>()
    }

    pub fn register_memories(&mut self, keys: &[MemoryKey]) {
        self.memories.extend(keys.iter().copied());
    }

    /// Registers sensors together with the memories they write.
    pub fn register_sensors(&mut self, kinds: &[SensorKind]) {
        for kind in kinds {
            self.sensors.insert(*kind);
            self.memories.extend(kind.memories().iter().copied());
        }
    }

    /// Wraps a leaf task into a unit after registering what it needs.
    ///
    /// Every key in the task's precondition table must be registered by the
    /// task itself, one of its sensors, or an earlier unit of this agent.
    pub fn leaf<T: LeafTask>(&mut self, task: T) -> Result<TaskUnit, ConfigError> {
        self.register_memories(task.memories());
        self.register_sensors(task.sensors());
        if let Some(missing) = task
            .requirements()
            .iter()
            .find(|req| !self.memories.contains(&req.key))
        {
            return Err(ConfigError::UnregisteredMemory {
                path: self.path.clone(),
                key: missing.key,
            });
        }
        trace!(
            target: "brain::compile",
            path = %self.path,
            task = task.name(),
            "compiled leaf task"
        );
        Ok(Box::new(Leaf::new(task)))
    }

    pub fn memories(&self) -> &BTreeSet<MemoryKey> {
        &self.memories
    }

    pub fn sensors(&self) -> &BTreeSet<SensorKind> {
        &self.sensors
    }

    /// Consumes the context, returning the collected memories and sensors.
    pub fn into_requirements(self) -> (BTreeSet<MemoryKey>, BTreeSet<SensorKind>) {
        (self.memories, self.sensors)
    }

    fn finite(&self, n: f64, field: &'static str) -> Result<f64, ConfigError> {
        if n.is_finite() {
            Ok(n)
        } else {
            Err(ConfigError::InvalidParameter {
                path: self.path.clone(),
                field,
                message: format!("must be a finite number, got {n}"),
            })
        }
    }

    fn resolve_with<T>(
        &self,
        binding: &ParamBinding,
        field: &'static str,
        f: impl FnOnce(&CompiledParam, &dyn Evaluator, &EvalContext<'_>) -> Result<T, EvalError>,
    ) -> Result<T, ConfigError> {
        let param = self.simplify(binding, field)?;
        let ctx = EvalContext::new()
            .with_entity(self.entity)
            .with_world(&self.clock)
            .with_config(self.variables);
        f(&param, self.evaluator, &ctx)
            .map_err(|e| ConfigError::expression(&self.path.field(field), e))
    }
}


#[cfg(test)]
mod tests {
    use behavior_tree::BehaviorFault;
    use brain_core::{
        DeclaredVariable, ExpressionEvaluator, MemoryRequirement, TaskContext, VariableOverride,
    };

    use super::test_support::*;
    use super::*;

    struct NeedsLeader;

    const NEEDS_LEADER: &[MemoryRequirement] = &[MemoryRequirement::present(MemoryKey::HerdLeader)];

    impl LeafTask for NeedsLeader {
        fn name(&self) -> &'static str {
            "needs_leader"
        }

        fn requirements(&self) -> &[MemoryRequirement] {
            NEEDS_LEADER
        }

        fn run(&mut self, _ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
            Ok(true)
        }
    }

    #[test]
    fn leaf_requires_registered_preconditions() {
        let entity = agent(5);
        let table = VariableTable::new();
        let evaluator = ExpressionEvaluator::new();
        let mut rng = rng();
        let mut ctx = CompileContext::new(
            ConfigPath::root("mareep"),
            &entity,
            &table,
            &evaluator,
            clock(),
            &mut rng,
        );

        let err = ctx.leaf(NeedsLeader).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::UnregisteredMemory { key: MemoryKey::HerdLeader, .. }
        ));

        ctx.register_memories(&[MemoryKey::HerdLeader]);
        assert!(ctx.leaf(NeedsLeader).is_ok());
    }

    #[test]
    fn sensors_bring_their_memories() {
        let entity = agent(5);
        let table = VariableTable::new();
        let evaluator = ExpressionEvaluator::new();
        let mut rng = rng();
        let mut ctx = CompileContext::new(
            ConfigPath::default(),
            &entity,
            &table,
            &evaluator,
            clock(),
            &mut rng,
        );
        ctx.register_sensors(&[SensorKind::HurtBy]);
        let (memories, sensors) = ctx.into_requirements();
        assert!(memories.contains(&MemoryKey::HurtByEntity));
        assert!(sensors.contains(&SensorKind::HurtBy));
    }

    #[test]
    fn compile_time_resolution_sees_the_entity() {
        let entity = agent(30);
        let path = ConfigPath::root("mareep");
        let mut table = VariableTable::new();
        table
            .declare(DeclaredVariable::boolean("herd", "leads", false), &path)
            .unwrap();
        table
            .apply_override(
                "leads",
                VariableOverride::Expression {
                    expression: brain_core::Expression::parse("q.entity.level >= 25").unwrap(),
                },
                &path,
            )
            .unwrap();
        let evaluator = ExpressionEvaluator::new();
        let mut rng = rng();
        let ctx = CompileContext::new(path, &entity, &table, &evaluator, clock(), &mut rng);

        assert!(ctx.resolve_bool(&ParamBinding::reference("leads"), "condition").unwrap());
    }

    #[test]
    fn interval_must_be_positive() {
        let entity = agent(5);
        let table = VariableTable::new();
        let evaluator = ExpressionEvaluator::new();
        let mut rng = rng();
        let ctx = CompileContext::new(
            ConfigPath::root("mareep"),
            &entity,
            &table,
            &evaluator,
            clock(),
            &mut rng,
        );

        assert_eq!(ctx.resolve_interval(&ParamBinding::from(60.0), "check_ticks"), Ok(60));
        let err = ctx
            .resolve_interval(&ParamBinding::from(0.0), "check_ticks")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter { field: "check_ticks", .. }
        ));
    }

    #[test]
    fn numbers_must_be_finite() {
        let entity = agent(5);
        let table = VariableTable::new();
        let evaluator = ExpressionEvaluator::new();
        let mut rng = rng();
        let ctx = CompileContext::new(
            ConfigPath::root("mareep"),
            &entity,
            &table,
            &evaluator,
            clock(),
            &mut rng,
        );
        let huge = format!("{}.0", "9".repeat(400));

        let literal = ParamBinding::literal(brain_core::Expression::parse(&huge).unwrap());
        assert!(matches!(
            ctx.simplify(&literal, "horizontal_range"),
            Err(ConfigError::InvalidParameter { field: "horizontal_range", .. })
        ));
        assert!(matches!(
            ctx.resolve_number(&ParamBinding::from(f64::NAN), "close_enough"),
            Err(ConfigError::InvalidParameter { field: "close_enough", .. })
        ));

        // Only known per tick, so it compiles.
        let scaled = brain_core::Expression::parse(&format!("q.entity.level * {huge}")).unwrap();
        assert!(ctx.simplify(&ParamBinding::literal(scaled), "horizontal_range").is_ok());
        assert_eq!(ctx.resolve_number(&ParamBinding::from(8.0), "close_enough"), Ok(8.0));
    }
}
