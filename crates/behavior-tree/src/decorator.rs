//! Decorator behavior nodes.
//!
//! Decorators wrap a single child behavior and modify its execution.
//! [`Gate`] only ticks its child while a [`Condition`] holds.

use crate::{Behavior, BehaviorFault, Status};

/// A side-effect free predicate over a context.
pub trait Condition<C>: Send {
    /// Returns whether the gated child may run this tick.
    fn check(&mut self, ctx: &mut C) -> Result<bool, BehaviorFault>;
}

/// Runs its child only while the condition holds.
///
/// # Semantics
///
/// - If the condition is false, returns `Failure` without ticking the child
/// - If the condition is true, returns whatever the child returns
/// - A fault from the condition is returned before the child runs
pub struct Gate<P, B> {
    condition: P,
    child: B,
}

impl<P, B> Gate<P, B> {
    /// Creates a gate around `child`.
    pub fn new(condition: P, child: B) -> Self {
        Self { condition, child }
    }

    /// Returns the wrapped child.
    pub fn child(&self) -> &B {
        &self.child
    }
}

impl<C, P, B> Behavior<C> for Gate<P, B>
where
    P: Condition<C>,
    B: Behavior<C>,
{
    fn tick(&mut self, ctx: &mut C) -> Result<Status, BehaviorFault> {
        if !self.condition.check(ctx)? {
            return Ok(Status::Failure);
        }
        self.child.tick(ctx)
    }

    fn name(&self) -> &'static str {
        self.child.name()
    }
}
