//! Composite configs: compile-time gate, per-tick weighted choice and
//! spawn-time weighted choice.

use behavior_tree::{Behavior, BehaviorFault, Condition, Gate, Status, WeightedChoice, pick_weighted};
use brain_core::{
    CompiledParam, ConfigError, ConfigPath, ParamBinding, TaskContext, TaskUnit,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::compile::CompileContext;
use crate::config::{TaskConfig, TaskDefinition};
use crate::registry::TaskConfigRegistry;

/// `all_of`: a compile-time guard over an ordered list of children.
#[derive(Debug, Clone, PartialEq)]
pub struct AllOfConfig {
    pub condition: ParamBinding,
    pub tasks: Vec<TaskConfig>,
}

/// `one_of`: re-rolls among its options on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOfConfig {
    pub condition: ParamBinding,
    pub options: Vec<WeightedOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedOption {
    pub weight: u32,
    pub task: TaskConfig,
}

/// `random`: rolls once per agent at spawn and keeps only the winner.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomConfig {
    pub condition: ParamBinding,
    pub choices: Vec<RandomChoice>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomChoice {
    pub weight: f64,
    pub task: TaskConfig,
}

impl TaskDefinition for AllOfConfig {
    fn tag(&self) -> &'static str {
        "all_of"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("condition", &self.condition)]
    }

    fn children(&self, path: &ConfigPath) -> Vec<(ConfigPath, &TaskConfig)> {
        let tasks = path.field("tasks");
        self.tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (tasks.index(i), task))
            .collect()
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !ctx.resolve_bool(&self.condition, "condition")? {
            debug!(target: "brain::compile", path = %ctx.path(), "all_of guard is false");
            return Ok(Vec::new());
        }

        let mut units = Vec::new();
        for (path, task) in self.children(ctx.path()) {
            units.extend(ctx.within(path, |ctx| task.create_tasks(ctx))?);
        }
        Ok(units)
    }
}

impl TaskDefinition for OneOfConfig {
    fn tag(&self) -> &'static str {
        "one_of"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("condition", &self.condition)]
    }

    fn children(&self, path: &ConfigPath) -> Vec<(ConfigPath, &TaskConfig)> {
        let options = path.field("options");
        self.options
            .iter()
            .enumerate()
            .map(|(i, option)| (options.index(i).field("task"), &option.task))
            .collect()
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !ctx.resolve_bool(&self.condition, "condition")? {
            return Ok(Vec::new());
        }
        let guard = ctx.simplify(&self.condition, "condition")?;

        let mut options = Vec::with_capacity(self.options.len());
        for ((path, task), option) in self.children(ctx.path()).into_iter().zip(&self.options) {
            let units = ctx.within(path, |ctx| task.create_tasks(ctx))?;
            let unit: TaskUnit = match units.into_iter().next() {
                Some(unit) => unit,
                None => Box::new(EmptySlot),
            };
            options.push((option.weight, unit));
        }

        Ok(vec![Box::new(Gate::new(
            LiveGuard { guard },
            WeightedChoice::new(options),
        ))])
    }
}

impl TaskDefinition for RandomConfig {
    fn tag(&self) -> &'static str {
        "random"
    }

    fn bindings(&self) -> Vec<(&'static str, &ParamBinding)> {
        vec![("condition", &self.condition)]
    }

    fn children(&self, path: &ConfigPath) -> Vec<(ConfigPath, &TaskConfig)> {
        let choices = path.field("choices");
        self.choices
            .iter()
            .enumerate()
            .map(|(i, choice)| (choices.index(i).field("task"), &choice.task))
            .collect()
    }

    fn create_tasks(&self, ctx: &mut CompileContext<'_>) -> Result<Vec<TaskUnit>, ConfigError> {
        if !ctx.resolve_bool(&self.condition, "condition")? {
            return Ok(Vec::new());
        }

        let weights: Vec<f64> = self.choices.iter().map(|choice| choice.weight).collect();
        let draw = ctx.draw();
        let index = pick_weighted(&weights, draw).ok_or_else(|| ConfigError::EmptyChoice {
            path: ctx.path().field("choices"),
        })?;
        debug!(
            target: "brain::compile",
            path = %ctx.path(),
            agent = %ctx.entity().id,
            index,
            "spawn-time choice"
        );

        let (path, task) = self
            .children(ctx.path())
            .into_iter()
            .nth(index)
            .ok_or_else(|| ConfigError::EmptyChoice {
                path: ctx.path().field("choices"),
            })?;
        ctx.within(path, |ctx| task.create_tasks(ctx))
    }
}

/// Re-evaluates a compiled guard against the agent every tick.
struct LiveGuard {
    guard: CompiledParam,
}

impl Condition<TaskContext<'_>> for LiveGuard {
    fn check(&mut self, ctx: &mut TaskContext<'_>) -> Result<bool, BehaviorFault> {
        ctx.resolve_bool(&self.guard)
    }
}

/// Stands in for an option that compiled to nothing.
struct EmptySlot;

impl Behavior<TaskContext<'_>> for EmptySlot {
    fn tick(&mut self, _ctx: &mut TaskContext<'_>) -> Result<Status, BehaviorFault> {
        Ok(Status::Failure)
    }

    fn name(&self) -> &'static str {
        "empty_slot"
    }
}

pub(crate) fn parse_all_of(
    registry: &TaskConfigRegistry,
    path: &ConfigPath,
    mut fields: Map<String, Value>,
) -> Result<TaskConfig, ConfigError> {
    let condition = take_condition(&mut fields, path)?;
    let tasks_path = path.field("tasks");
    let tasks = take_list(&mut fields, path, "tasks")?
        .iter()
        .enumerate()
        .map(|(i, node)| registry.parse(node, &tasks_path.index(i)))
        .collect::<Result<Vec<_>, _>>()?;
    reject_unknown(&fields, path)?;
    Ok(AllOfConfig { condition, tasks }.into())
}

pub(crate) fn parse_one_of(
    registry: &TaskConfigRegistry,
    path: &ConfigPath,
    mut fields: Map<String, Value>,
) -> Result<TaskConfig, ConfigError> {
    let condition = take_condition(&mut fields, path)?;
    let options_path = path.field("options");
    let mut options = Vec::new();
    for (i, node) in take_list(&mut fields, path, "options")?.into_iter().enumerate() {
        let option_path = options_path.index(i);
        let (weight, task) = split_weighted(registry, &option_path, node)?;
        let weight = match weight {
            None => 1,
            Some(raw) => raw
                .as_u64()
                .and_then(|w| u32::try_from(w).ok())
                .ok_or_else(|| ConfigError::InvalidParameter {
                    path: option_path.clone(),
                    field: "weight",
                    message: format!("expected a non-negative integer, found {raw}"),
                })?,
        };
        options.push(WeightedOption { weight, task });
    }
    reject_unknown(&fields, path)?;
    Ok(OneOfConfig { condition, options }.into())
}

pub(crate) fn parse_random(
    registry: &TaskConfigRegistry,
    path: &ConfigPath,
    mut fields: Map<String, Value>,
) -> Result<TaskConfig, ConfigError> {
    let condition = take_condition(&mut fields, path)?;
    let choices_path = path.field("choices");
    let mut choices = Vec::new();
    for (i, node) in take_list(&mut fields, path, "choices")?.into_iter().enumerate() {
        let choice_path = choices_path.index(i);
        let (weight, task) = split_weighted(registry, &choice_path, node)?;
        let weight = match weight {
            None => 1.0,
            Some(raw) => raw
                .as_f64()
                .filter(|w| w.is_finite() && *w >= 0.0)
                .ok_or_else(|| ConfigError::InvalidParameter {
                    path: choice_path.clone(),
                    field: "weight",
                    message: format!("expected a non-negative number, found {raw}"),
                })?,
        };
        choices.push(RandomChoice { weight, task });
    }
    reject_unknown(&fields, path)?;

    if choices.iter().map(|choice| choice.weight).sum::<f64>() <= 0.0 {
        return Err(ConfigError::EmptyChoice { path: choices_path });
    }
    Ok(RandomConfig { condition, choices }.into())
}

/// Splits `{ "weight": w, "task": {...} }` into its parts.
fn split_weighted(
    registry: &TaskConfigRegistry,
    path: &ConfigPath,
    node: Value,
) -> Result<(Option<Value>, TaskConfig), ConfigError> {
    let Value::Object(mut entry) = node else {
        return Err(ConfigError::malformed(path, "expected `{ weight, task }`"));
    };
    let weight = entry.remove("weight");
    let task = entry.remove("task").ok_or_else(|| ConfigError::MissingField {
        path: path.clone(),
        field: "task",
    })?;
    reject_unknown(&entry, path)?;
    let task = registry.parse(&task, &path.field("task"))?;
    Ok((weight, task))
}

fn take_condition(
    fields: &mut Map<String, Value>,
    path: &ConfigPath,
) -> Result<ParamBinding, ConfigError> {
    match fields.remove("condition") {
        None => Ok(ParamBinding::from(true)),
        Some(raw) => serde_json::from_value(raw)
            .map_err(|e| ConfigError::malformed(&path.field("condition"), e.to_string())),
    }
}

fn take_list(
    fields: &mut Map<String, Value>,
    path: &ConfigPath,
    field: &'static str,
) -> Result<Vec<Value>, ConfigError> {
    match fields.remove(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ConfigError::malformed(&path.field(field), "expected a list")),
        None => Err(ConfigError::MissingField {
            path: path.clone(),
            field,
        }),
    }
}

fn reject_unknown(fields: &Map<String, Value>, path: &ConfigPath) -> Result<(), ConfigError> {
    match fields.keys().next() {
        Some(name) => Err(ConfigError::malformed(path, format!("unknown field `{name}`"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use brain_core::MemoryKey;
    use serde_json::json;

    use super::*;
    use crate::compile::test_support::compile;

    fn parse(node: Value) -> Result<TaskConfig, ConfigError> {
        TaskConfigRegistry::with_builtin().parse(&node, &ConfigPath::root("test"))
    }

    #[test]
    fn all_of_with_false_guard_compiles_nothing() {
        // The child references an undeclared variable, so compiling it would fail.
        let config = parse(json!({
            "type": "all_of",
            "condition": false,
            "tasks": [{ "type": "wander", "speed": { "variable": "not_declared" } }],
        }))
        .unwrap();

        let (units, memories) = compile(&config, 5).unwrap();
        assert!(units.is_empty());
        assert!(memories.is_empty());
    }

    #[test]
    fn all_of_concatenates_children_in_order() {
        let config = parse(json!({
            "type": "all_of",
            "condition": "q.entity.level >= 5",
            "tasks": [
                { "type": "do_nothing" },
                { "type": "all_of", "tasks": [{ "type": "do_nothing" }, { "type": "do_nothing" }] },
            ],
        }))
        .unwrap();

        assert_eq!(compile(&config, 5).unwrap().0.len(), 3);
        assert!(compile(&config, 4).unwrap().0.is_empty());
    }

    #[test]
    fn one_of_compiles_to_a_single_unit() {
        let config = parse(json!({
            "type": "one_of",
            "options": [
                { "weight": 3, "task": { "type": "do_nothing" } },
                { "weight": 0, "task": { "type": "wander", "condition": false } },
            ],
        }))
        .unwrap();

        let (units, memories) = compile(&config, 1).unwrap();
        assert_eq!(units.len(), 1);
        // The wander option compiled to nothing and registered nothing.
        assert!(!memories.contains(&MemoryKey::WalkTarget));
    }

    #[test]
    fn one_of_rejects_fractional_weights() {
        let err = parse(json!({
            "type": "one_of",
            "options": [{ "weight": 1.5, "task": { "type": "do_nothing" } }],
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { field: "weight", .. }));
    }

    #[test]
    fn random_requires_a_selectable_choice() {
        let empty = parse(json!({ "type": "random", "choices": [] })).unwrap_err();
        assert!(matches!(empty, ConfigError::EmptyChoice { .. }));

        let zero = parse(json!({
            "type": "random",
            "choices": [{ "weight": 0.0, "task": { "type": "do_nothing" } }],
        }))
        .unwrap_err();
        assert_eq!(zero.to_string(), "test.choices: choice list has no selectable entry");
    }

    #[test]
    fn random_compiles_only_the_chosen_child() {
        let config = parse(json!({
            "type": "random",
            "choices": [
                { "weight": 0.0, "task": { "type": "find_herd_leader" } },
                { "weight": 2.0, "task": { "type": "wander" } },
            ],
        }))
        .unwrap();

        let (units, memories) = compile(&config, 1).unwrap();
        assert_eq!(units.len(), 1);
        assert!(memories.contains(&MemoryKey::WalkTarget));
        assert!(!memories.contains(&MemoryKey::HerdLeader));
    }

    #[test]
    fn child_paths_point_into_the_tree() {
        let err = parse(json!({
            "type": "all_of",
            "tasks": [{ "type": "one_of", "options": [{ "weight": 1, "task": { "type": "dance" } }] }],
        }))
        .unwrap_err();
        assert_eq!(
            err.path().map(ConfigPath::as_str),
            Some("test.tasks[0].options[0].task")
        );
    }
}
