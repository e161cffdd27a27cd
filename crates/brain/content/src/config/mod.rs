//! Parsed task configurations.
//!
//! A [`TaskConfig`] is an immutable description of behavior. It never runs by
//! itself: [`TaskDefinition::create_tasks`] turns it into task units for one
//! agent, and templates share configs across every agent they spawn.

pub mod combinators;

use std::fmt;

use brain_core::{ConfigError, ConfigPath, DeclaredVariable, ParamBinding, TaskUnit};

use crate::compile::CompileContext;
use crate::tasks::combat::{MeleeAttackConfig, RetaliateConfig};
use crate::tasks::fear::{CalmDownConfig, FleeAttackerConfig, SwitchToPanicWhenHurtConfig};
use crate::tasks::fluid::MoveIntoFluidConfig;
use crate::tasks::herd::{
    CountFollowersConfig, FindHerdLeaderConfig, FollowHerdLeaderConfig, MaintainHerdLeaderConfig,
    SwitchFromHerdConfig, SwitchToHerdConfig,
};
use crate::tasks::idle::DoNothingConfig;
use crate::tasks::item::MoveToItemConfig;
use crate::tasks::pollinate::{PathToFlowerConfig, PollinateFlowerConfig};
use crate::tasks::rest::{FindRestingPlaceConfig, GoToSleepConfig, WakeUpConfig};
use crate::tasks::wander::WanderConfig;

pub use combinators::{AllOfConfig, OneOfConfig, RandomConfig, WeightedOption};

/// Behavior shared by every task configuration variant.
pub trait TaskDefinition: fmt::Debug + Send + Sync {
    /// Registry tag of this variant, without namespace.
    fn tag(&self) -> &'static str;

    /// Parameter bindings by field name.
    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        Vec::new()
    }

    /// Nested configs with their paths relative to `path`.
    fn children(&self, _path: &ConfigPath) -> Vec<(ConfigPath, &TaskConfig)> {
        Vec::new()
    }

    /// Declared variables contributed by this node and its children.
    fn variables(&self) -> Vec<DeclaredVariable> {
        let mut declared: Vec<DeclaredVariable> = self
            .bindings()
            .into_iter()
            .filter_map(|(_, binding)| binding.declaration())
            .collect();
        for (_, child) in self.children(&ConfigPath::default()) {
            declared.extend(child.variables());
        }
        declared
    }

    /// Compiles this config into units for the agent described by `ctx`.
    ///
    /// Zero units is a normal outcome, e.g. when a compile-time guard is false.
    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError>;
}

macro_rules! task_configs {
    ($($variant:ident($config:ty)),+ $(,)?) => {
        /// Every task configuration the engine understands.
        #[derive(Debug, Clone, PartialEq)]
        pub enum TaskConfig {
            $($variant($config),)+
        }

        impl TaskConfig {
            pub fn definition(&self) -> &dyn TaskDefinition {
                match self {
                    $(TaskConfig::$variant(config) => config as &dyn TaskDefinition,)+
                }
            }
        }

        $(
            impl From<$config> for TaskConfig {
                fn from(config: $config) -> Self {
                    TaskConfig::$variant(config)
                }
            }
        )+
    };
}

task_configs! {
    AllOf(AllOfConfig),
    OneOf(OneOfConfig),
    Random(RandomConfig),
    DoNothing(DoNothingConfig),
    Wander(WanderConfig),
    FleeAttacker(FleeAttackerConfig),
    SwitchToPanicWhenHurt(SwitchToPanicWhenHurtConfig),
    CalmDown(CalmDownConfig),
    Retaliate(RetaliateConfig),
    MeleeAttack(MeleeAttackConfig),
    FindRestingPlace(FindRestingPlaceConfig),
    GoToSleep(GoToSleepConfig),
    WakeUp(WakeUpConfig),
    MoveIntoFluid(MoveIntoFluidConfig),
    MoveToItem(MoveToItemConfig),
    PathToFlower(PathToFlowerConfig),
    PollinateFlower(PollinateFlowerConfig),
    FindHerdLeader(FindHerdLeaderConfig),
    MaintainHerdLeader(MaintainHerdLeaderConfig),
    CountFollowers(CountFollowersConfig),
    FollowHerdLeader(FollowHerdLeaderConfig),
    SwitchToHerd(SwitchToHerdConfig),
    SwitchFromHerd(SwitchFromHerdConfig),
}

impl TaskConfig {
    pub fn tag(&self) -> &'static str {
        self.definition().tag()
    }

    pub fn variables(&self) -> Vec<DeclaredVariable> {
        self.definition().variables()
    }

    pub fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        self.definition().create_tasks(ctx)
    }

    /// Checks that every binding in this subtree resolves against `table`.
    ///
    /// Runs at load time so that a template with a dangling variable
    /// reference is disabled before any agent is spawned from it.
    pub fn validate(
        &self,
        table: &brain_core::VariableTable,
        path: &ConfigPath,
    ) -> Result<(), ConfigError> {
        let definition = self.definition();
        for (field, binding) in definition.bindings() {
            binding.simplify(table, &path.field(field))?;
        }
        for (child_path, child) in definition.children(path) {
            child.validate(table, &child_path)?;
        }
        Ok(())
    }
}
