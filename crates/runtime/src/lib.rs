//! Runtime for data-driven agent brains.
//!
//! This crate turns loaded content into running agents. An [`Engine`] holds
//! the templates, sensors and expression evaluator; spawning an agent
//! compiles its template into a [`Brain`], and a [`Simulation`] ticks every
//! brain against a [`SimWorld`].
//!
//! Modules are organized by responsibility:
//! - [`engine`] owns content and compiles templates for concrete agents
//! - [`brain`] holds compiled units and isolates their faults
//! - [`sensors`] provides the built-in perception
//! - [`world`] is the in-memory world behind [`brain_core::AgentWorld`]
//! - [`simulation`] drives the fixed-step loop
pub mod brain;
pub mod engine;
pub mod error;
pub mod sensors;
pub mod simulation;
pub mod world;

pub use brain::{Brain, Bucket, Isolated};
pub use engine::{Engine, EngineBuilder};
pub use error::{Result, RuntimeError};
pub use sensors::SensorRegistry;
pub use simulation::{AgentReport, FailedSpawn, Simulation, SimulationReport};
pub use world::{Body, SimWorld, WorldStats};
