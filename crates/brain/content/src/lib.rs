//! Behavior content: task configurations, the tag registry that parses them,
//! compilation into per-agent task units, and file loaders.
//!
//! Content flows through three stages:
//! - JSON nodes are parsed into [`TaskConfig`] values by the
//!   [`TaskConfigRegistry`], dispatching on each node's `"type"` tag
//! - an [`AgentTemplate`] groups configs into prioritised activities and
//!   declares the variables they may reference
//! - at spawn time every config is compiled against a [`CompileContext`]
//!   into zero or more [`brain_core::TaskUnit`]s
//!
//! Loaders (behind the `loaders` feature) read templates, engine settings and
//! scenarios from a data directory.

pub mod compile;
pub mod config;
pub mod registry;
pub mod scenario;
pub mod settings;
pub mod tasks;
pub mod template;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use compile::CompileContext;
pub use config::{TaskConfig, TaskDefinition};
pub use registry::{DEFAULT_NAMESPACE, TaskConfigRegistry, TaskParser};
pub use scenario::{FeatureSpec, HitSpec, ItemSpec, Scenario, SpawnSpec, TerrainSpec};
pub use settings::{EngineSettings, SensorSettings};
pub use tasks::{Leaf, LeafTask};
pub use template::{ActivityDefinition, AgentTemplate, PrioritizedTask};

#[cfg(feature = "loaders")]
pub use loaders::{
    ContentFactory, ContentSet, DisabledTemplate, ScenarioLoader, SettingsLoader, TemplateLoader,
};
