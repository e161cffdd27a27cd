//! Agent templates: prioritised activities plus the variables they declare.

use std::collections::BTreeMap;
use std::sync::Arc;

use brain_core::{
    Activity, ConfigError, ConfigPath, DeclaredVariable, HerdProfile, Species, VariableOverride,
    VariableTable,
};
use serde::Deserialize;
use serde_json::Value;

use crate::config::TaskConfig;
use crate::registry::TaskConfigRegistry;

const DEFAULT_MAX_HEALTH: f64 = 20.0;

/// One task slot inside an activity. Lower priorities run first.
#[derive(Clone, Debug, PartialEq)]
pub struct PrioritizedTask {
    pub priority: u32,
    pub task: Arc<TaskConfig>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActivityDefinition {
    pub activity: Activity,
    pub tasks: Vec<PrioritizedTask>,
}

/// Parsed, validated description every agent of a kind is spawned from.
///
/// Task configs are shared behind [`Arc`]; spawning compiles them per agent
/// and never mutates the template.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentTemplate {
    pub name: String,
    pub species: Species,
    pub enabled: bool,
    pub max_health: f64,
    pub default_activity: Activity,
    /// Template-level overrides applied on top of declared defaults.
    pub variables: BTreeMap<String, VariableOverride>,
    /// Variables declared by content rather than by built-in task defaults.
    pub declarations: Vec<DeclaredVariable>,
    pub herd: HerdProfile,
    pub activities: Vec<ActivityDefinition>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplate {
    name: String,
    #[serde(default)]
    species: Option<Species>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    max_health: Option<f64>,
    #[serde(default = "idle")]
    default_activity: Activity,
    #[serde(default)]
    variables: BTreeMap<String, VariableOverride>,
    #[serde(default)]
    declarations: Vec<DeclaredVariable>,
    #[serde(default)]
    herd: HerdProfile,
    #[serde(default)]
    activities: Vec<RawActivity>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawActivity {
    activity: Activity,
    #[serde(default)]
    tasks: Vec<RawTask>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTask {
    #[serde(default)]
    priority: u32,
    task: Value,
}

fn enabled_by_default() -> bool {
    true
}

fn idle() -> Activity {
    Activity::Idle
}

impl AgentTemplate {
    /// Parses a template document.
    ///
    /// `origin` names the document in errors raised before its `name` field
    /// is known, typically the file stem.
    pub fn from_json(
        registry: &TaskConfigRegistry,
        document: &Value,
        origin: &str,
    ) -> Result<Self, ConfigError> {
        let raw = RawTemplate::deserialize(document)
            .map_err(|e| ConfigError::malformed(&ConfigPath::root(origin), e.to_string()))?;
        let root = ConfigPath::root(raw.name.as_str());

        let mut activities: Vec<ActivityDefinition> = Vec::with_capacity(raw.activities.len());
        for (a, raw_activity) in raw.activities.into_iter().enumerate() {
            let activity_path = root.field("activities").index(a);
            if activities.iter().any(|d| d.activity == raw_activity.activity) {
                return Err(ConfigError::malformed(
                    &activity_path,
                    format!("activity `{}` is listed twice", raw_activity.activity),
                ));
            }

            let mut tasks = Vec::with_capacity(raw_activity.tasks.len());
            for (t, raw_task) in raw_activity.tasks.into_iter().enumerate() {
                let task_path = activity_path.field("tasks").index(t).field("task");
                let task = registry.parse(&raw_task.task, &task_path)?;
                tasks.push(PrioritizedTask {
                    priority: raw_task.priority,
                    task: Arc::new(task),
                });
            }
            activities.push(ActivityDefinition {
                activity: raw_activity.activity,
                tasks,
            });
        }

        let max_health = raw.max_health.unwrap_or(DEFAULT_MAX_HEALTH);
        if !(max_health.is_finite() && max_health > 0.0) {
            return Err(ConfigError::InvalidParameter {
                path: root,
                field: "max_health",
                message: format!("must be positive, got {max_health}"),
            });
        }

        Ok(Self {
            species: raw.species.unwrap_or_else(|| Species::new(raw.name.as_str())),
            name: raw.name,
            enabled: raw.enabled,
            max_health,
            default_activity: raw.default_activity,
            variables: raw.variables,
            declarations: raw.declarations,
            herd: raw.herd,
            activities,
        })
    }

    pub fn path(&self) -> ConfigPath {
        ConfigPath::root(self.name.as_str())
    }

    /// Path of the `index`-th task in the `activity`-th activity.
    pub fn task_path(&self, activity: usize, index: usize) -> ConfigPath {
        self.path()
            .field("activities")
            .index(activity)
            .field("tasks")
            .index(index)
            .field("task")
    }

    /// Every task with its location, in file order.
    pub fn tasks(&self) -> impl Iterator<Item = (ConfigPath, Activity, &PrioritizedTask)> + '_ {
        self.activities
            .iter()
            .enumerate()
            .flat_map(move |(a, definition)| {
                definition
                    .tasks
                    .iter()
                    .enumerate()
                    .map(move |(t, task)| (self.task_path(a, t), definition.activity, task))
            })
    }

    /// Activities other than [`Activity::Core`], in file order.
    pub fn scheduled_activities(&self) -> impl Iterator<Item = Activity> + '_ {
        self.activities
            .iter()
            .map(|definition| definition.activity)
            .filter(|activity| *activity != Activity::Core)
    }

    /// Builds the template's variable table.
    ///
    /// Content declarations come first, then the declarations each task's
    /// bindings carry, then the template overrides.
    pub fn variable_table(&self) -> Result<VariableTable, ConfigError> {
        let root = self.path();
        let mut table = VariableTable::new();

        let declarations_path = root.field("declarations");
        for (i, declaration) in self.declarations.iter().enumerate() {
            table.declare(declaration.clone(), &declarations_path.index(i))?;
        }
        for (path, _, task) in self.tasks() {
            for declaration in task.task.variables() {
                table.declare(declaration, &path)?;
            }
        }

        let overrides_path = root.field("variables");
        for (name, value) in &self.variables {
            table.apply_override(name, value.clone(), &overrides_path.field(name))?;
        }
        Ok(table)
    }

    /// Checks everything that can be checked without an agent: variables,
    /// every binding, and the default activity.
    pub fn validate(&self) -> Result<VariableTable, ConfigError> {
        let table = self.variable_table()?;
        for (path, _, task) in self.tasks() {
            task.task.validate(&table, &path)?;
        }

        let has_default = self.default_activity == Activity::Core
            || self.scheduled_activities().next().is_none()
            || self.scheduled_activities().any(|a| a == self.default_activity);
        if !has_default {
            return Err(ConfigError::InvalidParameter {
                path: self.path(),
                field: "default_activity",
                message: format!("`{}` has no activity entry", self.default_activity),
            });
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use brain_core::{Value as ExprValue, VariableValue};
    use serde_json::json;

    use super::*;

    fn parse(document: Value) -> Result<AgentTemplate, ConfigError> {
        AgentTemplate::from_json(&TaskConfigRegistry::with_builtin(), &document, "file")
    }

    fn mareep() -> Value {
        json!({
            "name": "mareep",
            "herd": { "tolerated_leaders": [{ "species": "mareep" }], "max_size": 4 },
            "variables": { "wanders": false },
            "activities": [
                { "activity": "core", "tasks": [
                    { "priority": 0, "task": { "type": "switch_to_panic_when_hurt" } }
                ]},
                { "activity": "idle", "tasks": [
                    { "priority": 0, "task": { "type": "find_herd_leader" } },
                    { "priority": 1, "task": { "type": "wander" } }
                ]}
            ]
        })
    }

    #[test]
    fn parses_activities_and_defaults() {
        let template = parse(mareep()).unwrap();
        assert_eq!(template.species, Species::new("mareep"));
        assert!(template.enabled);
        assert_eq!(template.max_health, DEFAULT_MAX_HEALTH);
        assert_eq!(template.default_activity, Activity::Idle);
        assert_eq!(template.herd.max_size, 4);
        assert_eq!(template.activities.len(), 2);
        assert_eq!(template.activities[1].tasks[1].task.tag(), "wander");
        assert_eq!(
            template.scheduled_activities().collect::<Vec<_>>(),
            vec![Activity::Idle]
        );
    }

    #[test]
    fn task_errors_carry_their_location() {
        let mut document = mareep();
        document["activities"][1]["tasks"][1]["task"] = json!({ "type": "teleport" });
        let err = parse(document).unwrap_err();
        assert_eq!(
            err.to_string(),
            "mareep.activities[1].tasks[1].task: unknown task type `teleport`"
        );
    }

    #[test]
    fn overrides_apply_over_task_defaults() {
        let template = parse(mareep()).unwrap();
        let table = template.validate().unwrap();
        assert_eq!(
            table.get("wanders"),
            Some(&VariableValue::Constant(ExprValue::Bool(false)))
        );
        // Declared by `wander` itself, untouched.
        assert!(table.get("walk_speed").is_some());
    }

    #[test]
    fn override_of_unknown_variable_is_rejected() {
        let mut document = mareep();
        document["variables"] = json!({ "flies": true });
        let err = parse(document).unwrap().validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedVariable { ref name, .. } if name == "flies"));
    }

    #[test]
    fn dangling_reference_fails_validation() {
        let mut document = mareep();
        document["activities"][1]["tasks"][1]["task"] =
            json!({ "type": "wander", "speed": { "variable": "sprint_speed" } });
        let err = parse(document).unwrap().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "mareep.activities[1].tasks[1].task.speed: variable `sprint_speed` is not declared"
        );
    }

    #[test]
    fn content_declarations_satisfy_references() {
        let mut document = mareep();
        document["declarations"] = json!([
            { "category": "movement", "name": "sprint_speed", "type": "number", "default": "0.8" }
        ]);
        document["activities"][1]["tasks"][1]["task"] =
            json!({ "type": "wander", "speed": { "variable": "sprint_speed" } });
        assert!(parse(document).unwrap().validate().is_ok());
    }

    #[test]
    fn default_activity_must_be_scheduled() {
        let mut document = mareep();
        document["default_activity"] = json!("rest");
        let err = parse(document).unwrap().validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter { field: "default_activity", .. }
        ));
    }

    #[test]
    fn duplicate_activity_is_malformed() {
        let mut document = mareep();
        document["activities"][0]["activity"] = json!("idle");
        assert!(matches!(parse(document), Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn unnamed_document_reports_origin() {
        let err = parse(json!({ "activities": [] })).unwrap_err();
        assert!(err.to_string().starts_with("file: "));
    }
}
