//! Composite behavior nodes.
//!
//! Composite nodes control the execution flow of multiple child behaviors.
//! [`Selector`] is the priority fallback used for every scheduling bucket:
//! children are tried in order and the first one that applies wins the tick.

use crate::{Behavior, BehaviorFault, Status};

/// Executes child behaviors in order until one succeeds.
///
/// # Semantics
///
/// A `Selector` node evaluates its children from left to right:
/// - If a child returns `Success`, the selector **stops immediately** and returns `Success`
/// - If a child returns `Failure`, the selector **continues** to the next child
/// - If all children return `Failure`, the selector returns `Failure`
/// - A fault from a child is returned as-is; wrap children that must not
///   poison their siblings before handing them to the selector
///
/// This is analogous to a short-circuited logical OR (||) operation.
/// An empty selector always fails.
pub struct Selector<B> {
    children: Vec<B>,
}

impl<B> Selector<B> {
    /// Creates a new selector with the given child behaviors.
    pub fn new(children: Vec<B>) -> Self {
        Self { children }
    }

    /// Appends a child with the lowest priority so far.
    pub fn push(&mut self, child: B) {
        self.children.push(child);
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the selector has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Iterates over the children in priority order.
    pub fn children(&self) -> impl Iterator<Item = &B> {
        self.children.iter()
    }
}

impl<B> Default for Selector<B> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<C, B> Behavior<C> for Selector<B>
where
    B: Behavior<C>,
{
    fn tick(&mut self, ctx: &mut C) -> Result<Status, BehaviorFault> {
        // Try children in order until one succeeds
        for child in &mut self.children {
            match child.tick(ctx)? {
                Status::Success => return Ok(Status::Success), // Short-circuit
                Status::Failure => continue,                   // Try next child
            }
        }
        // All children failed
        Ok(Status::Failure)
    }

    fn name(&self) -> &'static str {
        "selector"
    }
}
