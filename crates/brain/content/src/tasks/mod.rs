//! Leaf tasks and the adapter that runs them as task units.
//!
//! Every leaf follows the same shape: check a precondition table against the
//! blackboard, resolve parameters, perform one effect, and report whether it
//! ran. A unit whose preconditions do not hold is skipped without touching
//! the world.

pub mod combat;
pub mod fear;
pub mod fluid;
pub mod herd;
pub mod idle;
pub mod item;
pub mod pollinate;
pub mod rest;
pub mod wander;

use behavior_tree::{Behavior, BehaviorFault, Status};
use brain_core::{
    DeclaredVariable, Intent, MemoryKey, MemoryRequirement, MemoryValue, ParamBinding, Position,
    SensorKind, TaskContext, WalkTarget,
};

/// One leaf behavior and its precondition table.
pub trait LeafTask: Send + 'static {
    fn name(&self) -> &'static str;

    /// Memory conditions that must all hold before [`LeafTask::run`] is called.
    fn requirements(&self) -> &[MemoryRequirement];

    /// Memories read or written by the task, registered on the agent.
    fn memories(&self) -> &[MemoryKey] {
        &[]
    }

    fn sensors(&self) -> &[SensorKind] {
        &[]
    }

    /// Performs the effect. Returns `true` when the task ran and should
    /// consume its priority slot for this tick.
    fn run(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault>;
}

/// Adapts a [`LeafTask`] to the [`Behavior`] interface.
#[derive(Debug)]
pub struct Leaf<T> {
    task: T,
}

impl<T: LeafTask> Leaf<T> {
    pub fn new(task: T) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &T {
        &self.task
    }
}

impl<T: LeafTask> Behavior<TaskContext<'_>> for Leaf<T> {
    fn tick(&mut self, ctx: &mut TaskContext<'_>) -> Result<Status, BehaviorFault> {
        if !ctx.satisfies(self.task.requirements()) {
            return Ok(Status::Failure);
        }
        self.task.run(ctx).map(Status::from)
    }

    fn name(&self) -> &'static str {
        self.task.name()
    }
}

/// Default binding for walking speed, shared by every task that paths.
pub(crate) fn walk_speed() -> ParamBinding {
    ParamBinding::variable(DeclaredVariable::number("movement", "walk_speed", 0.35))
}

/// Sets the walk and look targets and tells the runtime to start moving.
pub(crate) fn walk_to(
    ctx: &mut TaskContext<'_>,
    position: Position,
    speed: f64,
    completion_range: f64,
) -> Result<(), BehaviorFault> {
    let target = WalkTarget::new(position, speed, completion_range);
    ctx.remember(MemoryKey::WalkTarget, MemoryValue::WalkTarget(target))?;
    ctx.remember(MemoryKey::LookTarget, MemoryValue::Position(position))?;
    ctx.issue(Intent::Walk(target));
    Ok(())
}

/// Picks a standable position within the given box around `origin`.
///
/// Gives up after `attempts` rejected samples. Faults on a non-finite range.
pub(crate) fn random_destination(
    ctx: &mut TaskContext<'_>,
    origin: Position,
    horizontal: f64,
    vertical: f64,
    attempts: u32,
) -> Result<Option<Position>, BehaviorFault> {
    for _ in 0..attempts {
        let candidate = origin.offset(
            ctx.spread(horizontal)?,
            ctx.spread(vertical)?,
            ctx.spread(horizontal)?,
        );
        if let Some(position) = ctx.world.walkable(candidate) {
            return Ok(Some(position));
        }
    }
    Ok(None)
}

/// Faults when a memory holds a value of the wrong shape.
pub(crate) fn malformed_memory(node: &'static str, key: MemoryKey) -> BehaviorFault {
    BehaviorFault::new(node, format!("memory `{key}` holds an unexpected value"))
}
