//! Agent data model and the contracts shared by the behavior compiler and
//! the simulation runtime.
//!
//! `brain-core` defines what a compiled behavior may observe and touch:
//! agent snapshots, the per-agent [`Blackboard`], declared configuration
//! variables, [`ParamBinding`]s and the small expression language they
//! resolve through, activity labels, sensors and the [`AgentWorld`] the
//! runtime implements. Task units are ticked against a [`TaskContext`],
//! which threads every collaborator explicitly; there is no ambient state.
pub mod activity;
pub mod agent;
pub mod binding;
pub mod blackboard;
pub mod context;
pub mod error;
pub mod expression;
pub mod herd;
pub mod intent;
pub mod memory;
pub mod sensor;
pub mod variable;
pub mod world;

pub use activity::{Activity, ActivityScheduler};
pub use agent::{AgentId, AgentInfo, ItemId, Position, Species, Tick};
pub use binding::{CompiledParam, ParamBinding, VariableRef};
pub use blackboard::{Blackboard, MemoryCondition, MemoryRequirement, MemoryState};
pub use context::{TaskContext, TaskUnit};
pub use error::{BlackboardError, ConfigError, ConfigPath, EvalError};
pub use expression::{
    EvalContext, Evaluator, Expression, ExpressionEvaluator, QueryStruct, Value,
};
pub use herd::{HerdProfile, ToleratedLeader};
pub use intent::{Intent, Pose, WalkTarget};
pub use memory::{MemoryKey, MemoryValue, ValueKind};
pub use sensor::{Sensor, SensorKind};
pub use variable::{DeclaredVariable, VariableOverride, VariableTable, VariableType, VariableValue};
pub use world::{AgentWorld, FeatureKind, WorldClock};
