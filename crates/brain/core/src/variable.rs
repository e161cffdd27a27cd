//! Declared per-template configuration variables.
//!
//! Task configs declare the variables they read (`wanders`, `walk_speed`,
//! ...) with a category, type and default. A template collects those
//! declarations into one [`VariableTable`], then templates and individual
//! spawns may override values. A value is either a constant or an
//! expression re-evaluated every time it is read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigPath};
use crate::expression::{Expression, Value};

/// Declared type of a variable.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    Boolean,
    Number,
    Text,
}

impl VariableType {
    /// Parses a raw default string. Booleans accept `true`/`1`/`false`/`0`.
    pub fn parse_value(self, raw: &str) -> Option<Value> {
        let raw = raw.trim();
        match self {
            VariableType::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            VariableType::Number => raw.parse::<f64>().ok().map(Value::Number),
            VariableType::Text => Some(Value::Text(raw.to_owned())),
        }
    }

    /// Type a constant value would be declared with.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => VariableType::Boolean,
            Value::Number(_) => VariableType::Number,
            Value::Text(_) => VariableType::Text,
        }
    }
}

/// A variable a task config reads, with its default and display metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclaredVariable {
    pub category: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    /// Default in string form, parsed according to `kind`.
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DeclaredVariable {
    pub fn new(
        category: impl Into<String>,
        name: impl Into<String>,
        kind: VariableType,
        default: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            kind,
            default: default.into(),
            display_name: None,
            description: None,
        }
    }

    pub fn boolean(category: &str, name: &str, default: bool) -> Self {
        Self::new(category, name, VariableType::Boolean, default.to_string())
    }

    pub fn number(category: &str, name: &str, default: f64) -> Self {
        Self::new(category, name, VariableType::Number, default.to_string())
    }

    pub fn text(category: &str, name: &str, default: &str) -> Self {
        Self::new(category, name, VariableType::Text, default)
    }

    #[must_use]
    pub fn with_display(mut self, display_name: &str, description: &str) -> Self {
        self.display_name = Some(display_name.to_owned());
        self.description = Some(description.to_owned());
        self
    }

    pub fn default_value(&self) -> Option<Value> {
        self.kind.parse_value(&self.default)
    }
}

/// Current value of a declared variable.
#[derive(Clone, Debug, PartialEq)]
pub enum VariableValue {
    Constant(Value),
    /// Re-evaluated on every read, e.g. `q.entity.level / 100`.
    Dynamic(Expression),
}

/// Override as written in content: a scalar, or `{ "expression": "..." }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableOverride {
    Bool(bool),
    Number(f64),
    Expression { expression: Expression },
    Text(String),
}

impl VariableOverride {
    /// Converts the override into a value for a variable of `kind`.
    ///
    /// Text overrides of boolean or number variables are parsed the same
    /// way defaults are, so `"1"` works for a boolean.
    pub fn into_value(self, kind: VariableType) -> Option<VariableValue> {
        let value = match self {
            VariableOverride::Bool(b) => Value::Bool(b),
            VariableOverride::Number(n) => Value::Number(n),
            VariableOverride::Text(raw) => kind.parse_value(&raw)?,
            VariableOverride::Expression { expression } => {
                return Some(match expression.as_constant() {
                    Some(value) => VariableValue::Constant(value.clone()),
                    None => VariableValue::Dynamic(expression),
                });
            }
        };
        Some(VariableValue::Constant(value))
    }
}

impl From<bool> for VariableOverride {
    fn from(value: bool) -> Self {
        VariableOverride::Bool(value)
    }
}

impl From<f64> for VariableOverride {
    fn from(value: f64) -> Self {
        VariableOverride::Number(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    declaration: DeclaredVariable,
    value: VariableValue,
}

/// Variables declared for one template, shared by all of its task configs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableTable {
    entries: BTreeMap<String, Entry>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration with its default value.
    ///
    /// Declaring the same name twice is fine as long as the types agree;
    /// the first declaration wins.
    pub fn declare(
        &mut self,
        declaration: DeclaredVariable,
        path: &ConfigPath,
    ) -> Result<(), ConfigError> {
        if let Some(existing) = self.entries.get(&declaration.name) {
            if existing.declaration.kind != declaration.kind {
                return Err(ConfigError::VariableTypeMismatch {
                    path: path.clone(),
                    name: declaration.name,
                    declared: existing.declaration.kind,
                    expected: declaration.kind,
                });
            }
            return Ok(());
        }

        let default = declaration
            .default_value()
            .ok_or_else(|| ConfigError::InvalidParameter {
                path: path.clone(),
                field: "default",
                message: format!(
                    "`{}` is not a valid {} for `{}`",
                    declaration.default, declaration.kind, declaration.name
                ),
            })?;
        self.entries.insert(
            declaration.name.clone(),
            Entry {
                declaration,
                value: VariableValue::Constant(default),
            },
        );
        Ok(())
    }

    /// Replaces the value of a declared variable.
    pub fn set(
        &mut self,
        name: &str,
        value: VariableValue,
        path: &ConfigPath,
    ) -> Result<(), ConfigError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnresolvedVariable {
                path: path.clone(),
                name: name.to_owned(),
            })?;

        if let VariableValue::Constant(constant) = &value {
            let found = VariableType::of(constant);
            if found != entry.declaration.kind {
                return Err(ConfigError::VariableTypeMismatch {
                    path: path.clone(),
                    name: name.to_owned(),
                    declared: entry.declaration.kind,
                    expected: found,
                });
            }
        }
        entry.value = value;
        Ok(())
    }

    /// Applies a content override to a declared variable.
    pub fn apply_override(
        &mut self,
        name: &str,
        value: VariableOverride,
        path: &ConfigPath,
    ) -> Result<(), ConfigError> {
        let kind = self
            .declaration(name)
            .map(|decl| decl.kind)
            .ok_or_else(|| ConfigError::UnresolvedVariable {
                path: path.clone(),
                name: name.to_owned(),
            })?;
        let value = value
            .into_value(kind)
            .ok_or_else(|| ConfigError::InvalidParameter {
                path: path.clone(),
                field: "variables",
                message: format!("override for `{name}` is not a valid {kind}"),
            })?;
        self.set(name, value, path)
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    pub fn declaration(&self, name: &str) -> Option<&DeclaredVariable> {
        self.entries.get(name).map(|entry| &entry.declaration)
    }

    /// Declarations in name order.
    pub fn declarations(&self) -> impl Iterator<Item = &DeclaredVariable> {
        self.entries.values().map(|entry| &entry.declaration)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> ConfigPath {
        ConfigPath::root("test")
    }

    #[test]
    fn boolean_defaults_accept_one_and_true() {
        assert_eq!(VariableType::Boolean.parse_value("1"), Some(Value::Bool(true)));
        assert_eq!(VariableType::Boolean.parse_value("TRUE"), Some(Value::Bool(true)));
        assert_eq!(VariableType::Boolean.parse_value("0"), Some(Value::Bool(false)));
        assert_eq!(VariableType::Boolean.parse_value("maybe"), None);
    }

    #[test]
    fn declare_uses_default_and_rejects_conflicting_types() {
        let mut table = VariableTable::new();
        table
            .declare(DeclaredVariable::boolean("wander", "wanders", true), &path())
            .unwrap();
        assert_eq!(
            table.get("wanders"),
            Some(&VariableValue::Constant(Value::Bool(true)))
        );

        // Same type again keeps the first declaration.
        table
            .declare(DeclaredVariable::boolean("other", "wanders", false), &path())
            .unwrap();
        assert_eq!(table.declaration("wanders").map(|d| d.category.as_str()), Some("wander"));

        let err = table
            .declare(DeclaredVariable::number("wander", "wanders", 1.0), &path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::VariableTypeMismatch { .. }));
    }

    #[test]
    fn bad_default_is_rejected() {
        let mut table = VariableTable::new();
        let err = table
            .declare(
                DeclaredVariable::new("movement", "walk_speed", VariableType::Number, "fast"),
                &path(),
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { field: "default", .. }));
    }

    #[test]
    fn overrides_are_typed() {
        let mut table = VariableTable::new();
        table
            .declare(DeclaredVariable::boolean("wander", "wanders", true), &path())
            .unwrap();

        table
            .apply_override("wanders", VariableOverride::Text("0".into()), &path())
            .unwrap();
        assert_eq!(
            table.get("wanders"),
            Some(&VariableValue::Constant(Value::Bool(false)))
        );

        let err = table
            .apply_override("wanders", VariableOverride::Number(3.0), &path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::VariableTypeMismatch { .. }));

        let err = table
            .apply_override("flies", VariableOverride::Bool(true), &path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedVariable { .. }));
    }

    #[test]
    fn expression_override_becomes_dynamic() {
        let mut table = VariableTable::new();
        table
            .declare(DeclaredVariable::number("wander", "wander_chance", 0.1), &path())
            .unwrap();
        let expression = Expression::parse("q.entity.level / 100").unwrap();
        table
            .apply_override(
                "wander_chance",
                VariableOverride::Expression {
                    expression: expression.clone(),
                },
                &path(),
            )
            .unwrap();
        assert_eq!(
            table.get("wander_chance"),
            Some(&VariableValue::Dynamic(expression))
        );
    }
}
