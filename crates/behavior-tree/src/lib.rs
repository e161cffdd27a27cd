//! Lightweight behavior primitives for data-driven agent brains.
//!
//! This library provides a minimal, deterministic execution model for
//! behaviors compiled from content files and ticked once per simulation step.
//!
//! - **No delta time**: Every tick completes immediately
//! - **No Running state**: A node either consumes its slot or declines it
//! - **Faults are values**: A node that breaks returns a [`BehaviorFault`]
//!   instead of unwinding, so the caller decides how far the damage spreads
//! - **Zero dependencies**: Pure Rust with no external crates
//!
//! # Architecture
//!
//! - [`Behavior`]: Core trait for all nodes
//! - [`Status`]: Success or Failure (no Running state)
//! - Composite nodes: [`Selector`], [`WeightedChoice`]
//! - Decorator nodes: [`Gate`]
//! - Weighted selection: [`pick_weighted`] over a [`RandomSource`]

pub mod behavior;
pub mod choice;
pub mod composite;
pub mod decorator;
pub mod fault;
pub mod status;

// Re-export core types for ergonomic API
pub use behavior::Behavior;
pub use choice::{RandomSource, WeightedChoice, pick_weighted};
pub use composite::Selector;
pub use decorator::{Condition, Gate};
pub use fault::BehaviorFault;
pub use status::Status;
