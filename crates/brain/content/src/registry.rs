//! Tag-dispatched parsing of task configuration nodes.
//!
//! Every JSON node carries a `"type"` tag. The registry maps tags to parser
//! functions; combinator parsers call back into the registry for their
//! children, so new leaf tags become usable inside every combinator as soon
//! as they are registered.

use std::collections::BTreeMap;

use brain_core::{ConfigError, ConfigPath};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::{TaskConfig, combinators};
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

/// Namespace stripped from tags before lookup: `"brain:wander"` is `"wander"`.
pub const DEFAULT_NAMESPACE: &str = "brain";

/// Parses the fields of one node (its `"type"` already removed).
pub type TaskParser =
    fn(&TaskConfigRegistry, &ConfigPath, Map<String, Value>) -> Result<TaskConfig, ConfigError>;

/// Tag to parser table.
#[derive(Clone, Debug, Default)]
pub struct TaskConfigRegistry {
    parsers: BTreeMap<String, TaskParser>,
}

impl TaskConfigRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in tag.
    pub fn with_builtin() -> Self {
        let builtin: [(&str, TaskParser); 23] = [
            ("all_of", combinators::parse_all_of),
            ("one_of", combinators::parse_one_of),
            ("random", combinators::parse_random),
            ("do_nothing", parse_fields::<DoNothingConfig>),
            ("wander", parse_fields::<WanderConfig>),
            ("flee_attacker", parse_fields::<FleeAttackerConfig>),
            ("switch_to_panic_when_hurt", parse_fields::<SwitchToPanicWhenHurtConfig>),
            ("calm_down", parse_fields::<CalmDownConfig>),
            ("retaliate", parse_fields::<RetaliateConfig>),
            ("melee_attack", parse_fields::<MeleeAttackConfig>),
            ("find_resting_place", parse_fields::<FindRestingPlaceConfig>),
            ("go_to_sleep", parse_fields::<GoToSleepConfig>),
            ("wake_up", parse_fields::<WakeUpConfig>),
            ("move_into_fluid", parse_fields::<MoveIntoFluidConfig>),
            ("move_to_item", parse_fields::<MoveToItemConfig>),
            ("path_to_flower", parse_fields::<PathToFlowerConfig>),
            ("pollinate_flower", parse_fields::<PollinateFlowerConfig>),
            ("find_herd_leader", parse_fields::<FindHerdLeaderConfig>),
            ("maintain_herd_leader", parse_fields::<MaintainHerdLeaderConfig>),
            ("count_followers", parse_fields::<CountFollowersConfig>),
            ("follow_herd_leader", parse_fields::<FollowHerdLeaderConfig>),
            ("switch_to_herd", parse_fields::<SwitchToHerdConfig>),
            ("switch_from_herd", parse_fields::<SwitchFromHerdConfig>),
        ];

        let mut registry = Self::new();
        for (tag, parser) in builtin {
            registry.parsers.insert(tag.to_owned(), parser);
        }
        registry
    }

    /// Registers `parser` under `tag`.
    ///
    /// Fails if the tag is taken; an existing parser is never replaced.
    pub fn register(&mut self, tag: &str, parser: TaskParser) -> Result<(), ConfigError> {
        let tag = normalize(tag);
        if self.parsers.contains_key(tag) {
            return Err(ConfigError::DuplicateTag {
                tag: tag.to_owned(),
            });
        }
        self.parsers.insert(tag.to_owned(), parser);
        Ok(())
    }

    pub fn resolve(&self, tag: &str) -> Option<TaskParser> {
        self.parsers.get(normalize(tag)).copied()
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Parses one task node by dispatching on its `"type"` field.
    pub fn parse(&self, node: &Value, path: &ConfigPath) -> Result<TaskConfig, ConfigError> {
        let Value::Object(fields) = node else {
            return Err(ConfigError::malformed(path, "task must be an object"));
        };
        let mut fields = fields.clone();
        let tag = match fields.remove("type") {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(ConfigError::malformed(
                    &path.field("type"),
                    format!("expected a string, found {other}"),
                ));
            }
            None => {
                return Err(ConfigError::MissingField {
                    path: path.clone(),
                    field: "type",
                });
            }
        };

        let parser = self.resolve(&tag).ok_or_else(|| ConfigError::UnknownTag {
            path: path.clone(),
            tag: tag.clone(),
        })?;
        parser(self, path, fields)
    }
}

/// Parser for variants whose fields map directly onto a serde struct.
pub fn parse_fields<T>(
    _registry: &TaskConfigRegistry,
    path: &ConfigPath,
    fields: Map<String, Value>,
) -> Result<TaskConfig, ConfigError>
where
    T: DeserializeOwned + Into<TaskConfig>,
{
    serde_json::from_value::<T>(Value::Object(fields))
        .map(Into::into)
        .map_err(|e| ConfigError::malformed(path, e.to_string()))
}

fn normalize(tag: &str) -> &str {
    match tag.split_once(':') {
        Some((namespace, name)) if namespace == DEFAULT_NAMESPACE => name,
        _ => tag,
    }
}
