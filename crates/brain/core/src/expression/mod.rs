//! Small embedded expression language used by content files.
//!
//! Expressions are parsed once at load time and evaluated against an
//! explicit [`EvalContext`]; nothing about the current agent is stored in
//! the evaluator between calls.
//!
//! ```text
//! q.entity.level > 10 && !q.entity.is_in_water
//! q.entity.config.wander_chance * 2
//! q.world.is_night ? 0.01 : 0.2
//! ```

mod eval;
mod parser;

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EvalError;

pub use eval::{EvalContext, Evaluator, ExpressionEvaluator};

/// A value produced by evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
        }
    }

    /// Numbers coerce to booleans (non-zero is true); text never does.
    pub fn as_bool(&self) -> Result<bool, EvalError> {
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => Ok(*n != 0.0),
            Value::Text(_) => Err(self.mismatch("boolean")),
        }
    }

    /// Booleans coerce to `1.0`/`0.0`; text never does.
    pub fn as_number(&self) -> Result<f64, EvalError> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) => Err(self.mismatch("number")),
        }
    }

    pub fn as_text(&self) -> Result<&str, EvalError> {
        match self {
            Value::Text(s) => Ok(s),
            _ => Err(self.mismatch("text")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> EvalError {
        EvalError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    /// Renders the value as expression source that parses back to itself.
    fn to_source(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Named properties an expression can read, e.g. `q.entity.level`.
pub trait QueryStruct {
    fn query(&self, property: &str) -> Option<Value>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Path(Vec<String>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// A parsed expression together with its source text.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        let root = parser::parse(source)?;
        Ok(Self {
            source: source.trim().to_owned(),
            root,
        })
    }

    /// An expression that always evaluates to `value`.
    pub fn constant(value: Value) -> Self {
        Self {
            source: value.to_source(),
            root: Expr::Literal(value),
        }
    }

    /// Expression reading a template variable live: `q.entity.config.<name>`.
    pub fn config_lookup(name: &str) -> Self {
        Self {
            source: format!("q.entity.config.{name}"),
            root: Expr::Path(vec![
                "q".to_owned(),
                "entity".to_owned(),
                "config".to_owned(),
                name.to_owned(),
            ]),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The literal value, when the whole expression is a single literal.
    pub fn as_constant(&self) -> Option<&Value> {
        match &self.root {
            Expr::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn root(&self) -> &Expr {
        &self.root
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<bool> for Expression {
    fn from(value: bool) -> Self {
        Self::constant(Value::Bool(value))
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::constant(Value::Number(value))
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Accepts expression source strings as well as bare numbers and booleans.
impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ExpressionVisitor;

        impl Visitor<'_> for ExpressionVisitor {
            type Value = Expression;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an expression string, number or boolean")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Expression, E> {
                Ok(Expression::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Expression, E> {
                Ok(Expression::from(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Expression, E> {
                Ok(Expression::from(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Expression, E> {
                Ok(Expression::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Expression, E> {
                Expression::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ExpressionVisitor)
    }
}
