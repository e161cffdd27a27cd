//! Core behavior trait.
//!
//! This module defines the [`Behavior`] trait, which is the fundamental
//! abstraction for all executable nodes. The trait is generic over a
//! context type `C`, allowing nodes to read and mutate agent state.

use crate::{BehaviorFault, Status};

/// A behavior node that can be ticked against a context.
///
/// Nodes take `&mut self` so that timed behaviors can keep small
/// per-instance counters between ticks.
pub trait Behavior<C>: Send {
    /// Evaluate this behavior node against the given context.
    ///
    /// # Returns
    ///
    /// - `Ok(Status::Success)` if the node consumed this tick's slot
    /// - `Ok(Status::Failure)` if nothing applied and a sibling may try
    /// - `Err(fault)` if the node broke while running
    fn tick(&mut self, ctx: &mut C) -> Result<Status, BehaviorFault>;

    /// Short diagnostic name used in logs and fault reports.
    fn name(&self) -> &'static str {
        "behavior"
    }
}

/// Blanket implementation for boxed behaviors.
///
/// This allows `Box<dyn Behavior<C>>` to also implement `Behavior<C>`,
/// enabling dynamic dispatch and heterogeneous collections of nodes.
impl<C, B> Behavior<C> for Box<B>
where
    B: Behavior<C> + ?Sized,
{
    #[inline]
    fn tick(&mut self, ctx: &mut C) -> Result<Status, BehaviorFault> {
        (**self).tick(ctx)
    }

    #[inline]
    fn name(&self) -> &'static str {
        (**self).name()
    }
}
