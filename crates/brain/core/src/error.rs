//! Error types for content compilation, expression evaluation and memory access.
//!
//! Every configuration failure carries the [`ConfigPath`] of the node that
//! caused it so a disabled template can be traced back to the exact field.

use std::fmt;

use thiserror::Error;

use crate::memory::{MemoryKey, ValueKind};
use crate::variable::VariableType;

/// Dotted location of a node inside a content file.
///
/// Rendered as `mareep.activities[1].tasks[0].task`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath(String);

impl ConfigPath {
    /// Creates a path rooted at a template or file name.
    pub fn root(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Extends the path with a named field.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_owned())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    /// Extends the path with a list index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{}]", self.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Failure while parsing or compiling behavior content.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{path}: unknown task type `{tag}`")]
    UnknownTag { path: ConfigPath, tag: String },

    #[error("task type `{tag}` is already registered")]
    DuplicateTag { tag: String },

    #[error("{path}: missing field `{field}`")]
    MissingField { path: ConfigPath, field: &'static str },

    #[error("{path}: {message}")]
    Malformed { path: ConfigPath, message: String },

    #[error("{path}: variable `{name}` is not declared")]
    UnresolvedVariable { path: ConfigPath, name: String },

    #[error("{path}: variable `{name}` is declared as {declared} but used as {expected}")]
    VariableTypeMismatch {
        path: ConfigPath,
        name: String,
        declared: VariableType,
        expected: VariableType,
    },

    #[error("{path}: choice list has no selectable entry")]
    EmptyChoice { path: ConfigPath },

    #[error("{path}: invalid `{field}`: {message}")]
    InvalidParameter {
        path: ConfigPath,
        field: &'static str,
        message: String,
    },

    #[error("{path}: memory `{key}` is required but not registered")]
    UnregisteredMemory { path: ConfigPath, key: MemoryKey },

    #[error("{path}: expression failed")]
    Expression {
        path: ConfigPath,
        #[source]
        source: EvalError,
    },
}

impl ConfigError {
    /// Wraps an evaluation failure that happened while compiling `path`.
    pub fn expression(path: &ConfigPath, source: EvalError) -> Self {
        Self::Expression {
            path: path.clone(),
            source,
        }
    }

    pub fn malformed(path: &ConfigPath, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Path of the offending node, if the error is tied to one.
    pub fn path(&self) -> Option<&ConfigPath> {
        match self {
            Self::DuplicateTag { .. } => None,
            Self::UnknownTag { path, .. }
            | Self::MissingField { path, .. }
            | Self::Malformed { path, .. }
            | Self::UnresolvedVariable { path, .. }
            | Self::VariableTypeMismatch { path, .. }
            | Self::EmptyChoice { path }
            | Self::InvalidParameter { path, .. }
            | Self::UnregisteredMemory { path, .. }
            | Self::Expression { path, .. } => Some(path),
        }
    }
}

/// Failure while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("unknown path `{0}`")]
    UnknownPath(String),

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("config variable `{0}` nests too deeply")]
    RecursionLimit(String),

    #[error("`{0}` needs an entity but none is bound")]
    NoEntity(String),
}

/// Failure while reading or writing an agent's blackboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("memory `{0}` is not registered for this agent")]
    Unregistered(MemoryKey),

    #[error("memory `{key}` holds {expected} values, got {found}")]
    KindMismatch {
        key: MemoryKey,
        expected: ValueKind,
        found: ValueKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_renders_fields_and_indices() {
        let path = ConfigPath::root("mareep")
            .field("activities")
            .index(1)
            .field("tasks")
            .index(0)
            .field("task");
        assert_eq!(path.as_str(), "mareep.activities[1].tasks[0].task");
    }

    #[test]
    fn unknown_tag_names_the_path() {
        let err = ConfigError::UnknownTag {
            path: ConfigPath::root("wooloo").field("tasks").index(2),
            tag: "teleport".into(),
        };
        assert_eq!(err.to_string(), "wooloo.tasks[2]: unknown task type `teleport`");
    }
}
