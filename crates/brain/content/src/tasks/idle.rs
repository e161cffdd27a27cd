//! `do_nothing`: claims its priority slot without acting.

use behavior_tree::BehaviorFault;
use brain_core::{ConfigError, MemoryRequirement, TaskContext, TaskUnit};
use serde::{Deserialize, Serialize};

use crate::compile::CompileContext;
use crate::config::TaskDefinition;
use crate::tasks::LeafTask;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DoNothingConfig {}

impl TaskDefinition for DoNothingConfig {
    fn tag(&self) -> &'static str {
        "do_nothing"
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        Ok(vec![ctx.leaf(DoNothing)?])
    }
}

pub struct DoNothing;

impl LeafTask for DoNothing {
    fn name(&self) -> &'static str {
        "do_nothing"
    }

    fn requirements(&self) -> &[MemoryRequirement] {
        &[]
    }

    fn run(&mut self, _ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        Ok(true)
    }
}
