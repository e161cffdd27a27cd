//! Literal-or-reference parameter bindings.
//!
//! A [`ParamBinding`] is how content supplies a tunable value: either an
//! inline expression (`0.35`, `"q.entity.level > 5"`) or a reference to a
//! declared template variable (`{ "variable": "walk_speed" }`). Bindings are
//! simplified once per agent into a [`CompiledParam`]; constant variables
//! are inlined so hot paths never re-read the variable table.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigPath, EvalError};
use crate::expression::{EvalContext, Evaluator, Expression, Value};
use crate::variable::{DeclaredVariable, VariableTable, VariableType, VariableValue};

/// Reference to a template variable, optionally carrying its declaration.
///
/// Built-in task defaults always carry the full declaration so the variable
/// is declared even when content never mentions it. References written in
/// content usually only name the variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableRef {
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<VariableType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl VariableRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            variable: name.into(),
            category: None,
            kind: None,
            default: None,
        }
    }

    pub fn declared(declaration: DeclaredVariable) -> Self {
        Self {
            variable: declaration.name,
            category: Some(declaration.category),
            kind: Some(declaration.kind),
            default: Some(declaration.default),
        }
    }

    /// Full declaration, when type and default are both known.
    pub fn declaration(&self) -> Option<DeclaredVariable> {
        let kind = self.kind?;
        let default = self.default.clone()?;
        Some(DeclaredVariable::new(
            self.category.clone().unwrap_or_else(|| "misc".to_owned()),
            self.variable.clone(),
            kind,
            default,
        ))
    }
}

/// `Literal(expression) | Reference(variable)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamBinding {
    Reference(VariableRef),
    Literal(Expression),
}

impl ParamBinding {
    pub fn literal(expression: Expression) -> Self {
        ParamBinding::Literal(expression)
    }

    pub fn constant(value: Value) -> Self {
        ParamBinding::Literal(Expression::constant(value))
    }

    /// Reference that also declares the variable with its default.
    pub fn variable(declaration: DeclaredVariable) -> Self {
        ParamBinding::Reference(VariableRef::declared(declaration))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        ParamBinding::Reference(VariableRef::named(name))
    }

    /// Declaration this binding contributes to its template, if any.
    pub fn declaration(&self) -> Option<DeclaredVariable> {
        match self {
            ParamBinding::Reference(reference) => reference.declaration(),
            ParamBinding::Literal(_) => None,
        }
    }

    /// Resolves the binding against one template's variable table.
    ///
    /// - literals stay expressions, folded to constants when they are one
    /// - references to constant variables are inlined
    /// - references to dynamic variables become `q.entity.config.<name>`
    pub fn simplify(
        &self,
        table: &VariableTable,
        path: &ConfigPath,
    ) -> Result<CompiledParam, ConfigError> {
        match self {
            ParamBinding::Literal(expression) => Ok(match expression.as_constant() {
                Some(value) => CompiledParam::Constant(value.clone()),
                None => CompiledParam::Expression(expression.clone()),
            }),
            ParamBinding::Reference(reference) => {
                let name = reference.variable.as_str();
                let declared =
                    table
                        .declaration(name)
                        .ok_or_else(|| ConfigError::UnresolvedVariable {
                            path: path.clone(),
                            name: name.to_owned(),
                        })?;
                if let Some(expected) = reference.kind
                    && expected != declared.kind
                {
                    return Err(ConfigError::VariableTypeMismatch {
                        path: path.clone(),
                        name: name.to_owned(),
                        declared: declared.kind,
                        expected,
                    });
                }
                match table.get(name) {
                    Some(VariableValue::Constant(value)) => Ok(CompiledParam::Constant(value.clone())),
                    Some(VariableValue::Dynamic(_)) => {
                        Ok(CompiledParam::Expression(Expression::config_lookup(name)))
                    }
                    None => Err(ConfigError::UnresolvedVariable {
                        path: path.clone(),
                        name: name.to_owned(),
                    }),
                }
            }
        }
    }
}

impl From<bool> for ParamBinding {
    fn from(value: bool) -> Self {
        ParamBinding::constant(Value::Bool(value))
    }
}

impl From<f64> for ParamBinding {
    fn from(value: f64) -> Self {
        ParamBinding::constant(Value::Number(value))
    }
}

/// A binding after simplification for one agent.
#[derive(Clone, Debug, PartialEq)]
pub enum CompiledParam {
    Constant(Value),
    Expression(Expression),
}

impl CompiledParam {
    pub fn is_constant(&self) -> bool {
        matches!(self, CompiledParam::Constant(_))
    }

    pub fn resolve(
        &self,
        evaluator: &dyn Evaluator,
        ctx: &EvalContext<'_>,
    ) -> Result<Value, EvalError> {
        match self {
            CompiledParam::Constant(value) => Ok(value.clone()),
            CompiledParam::Expression(expression) => evaluator.evaluate(expression, ctx),
        }
    }

    pub fn resolve_bool(
        &self,
        evaluator: &dyn Evaluator,
        ctx: &EvalContext<'_>,
    ) -> Result<bool, EvalError> {
        match self {
            CompiledParam::Constant(value) => value.as_bool(),
            CompiledParam::Expression(expression) => evaluator.resolve_bool(expression, ctx),
        }
    }

    pub fn resolve_number(
        &self,
        evaluator: &dyn Evaluator,
        ctx: &EvalContext<'_>,
    ) -> Result<f64, EvalError> {
        match self {
            CompiledParam::Constant(value) => value.as_number(),
            CompiledParam::Expression(expression) => evaluator.resolve_number(expression, ctx),
        }
    }

    /// Number truncated toward zero.
    pub fn resolve_int(
        &self,
        evaluator: &dyn Evaluator,
        ctx: &EvalContext<'_>,
    ) -> Result<i64, EvalError> {
        self.resolve_number(evaluator, ctx).map(|n| n.trunc() as i64)
    }

    pub fn resolve_text(
        &self,
        evaluator: &dyn Evaluator,
        ctx: &EvalContext<'_>,
    ) -> Result<String, EvalError> {
        match self {
            CompiledParam::Constant(value) => value.as_text().map(str::to_owned),
            CompiledParam::Expression(expression) => evaluator.resolve_text(expression, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ExpressionEvaluator;
    use crate::variable::VariableOverride;

    fn path() -> ConfigPath {
        ConfigPath::root("test")
    }

    fn table_with_wanders() -> VariableTable {
        let mut table = VariableTable::new();
        table
            .declare(DeclaredVariable::boolean("wander", "wanders", true), &path())
            .unwrap();
        table
            .declare(DeclaredVariable::number("wander", "wander_chance", 0.25), &path())
            .unwrap();
        table
    }

    #[test]
    fn parses_both_forms_from_json_shapes() {
        let literal: ParamBinding = serde::Deserialize::deserialize(
            serde::de::value::StrDeserializer::<serde::de::value::Error>::new("q.entity.level > 3"),
        )
        .unwrap();
        assert!(matches!(literal, ParamBinding::Literal(_)));

        let number: ParamBinding = serde::Deserialize::deserialize(
            serde::de::value::F64Deserializer::<serde::de::value::Error>::new(0.5),
        )
        .unwrap();
        assert_eq!(number, ParamBinding::from(0.5));
    }

    #[test]
    fn constant_reference_is_inlined() {
        let table = table_with_wanders();
        let compiled = ParamBinding::reference("wander_chance")
            .simplify(&table, &path())
            .unwrap();
        assert_eq!(compiled, CompiledParam::Constant(Value::Number(0.25)));
    }

    #[test]
    fn dynamic_reference_becomes_lookup() {
        let mut table = table_with_wanders();
        table
            .apply_override(
                "wander_chance",
                VariableOverride::Expression {
                    expression: Expression::parse("q.entity.level / 100").unwrap(),
                },
                &path(),
            )
            .unwrap();

        let compiled = ParamBinding::reference("wander_chance")
            .simplify(&table, &path())
            .unwrap();
        let CompiledParam::Expression(expression) = &compiled else {
            panic!("expected a lookup expression, got {compiled:?}");
        };
        assert_eq!(expression.source(), "q.entity.config.wander_chance");

        struct Level;
        impl crate::expression::QueryStruct for Level {
            fn query(&self, property: &str) -> Option<Value> {
                (property == "level").then_some(Value::Number(20.0))
            }
        }
        let ctx = EvalContext::new().with_entity(&Level).with_config(&table);
        let chance = compiled
            .resolve_number(&ExpressionEvaluator::new(), &ctx)
            .unwrap();
        assert!((chance - 0.2).abs() < 1e-12);
    }

    #[test]
    fn unresolved_and_mistyped_references_fail() {
        let table = table_with_wanders();
        let err = ParamBinding::reference("flies")
            .simplify(&table, &path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnresolvedVariable { ref name, .. } if name == "flies"));

        let mistyped = ParamBinding::Reference(VariableRef {
            variable: "wanders".into(),
            category: None,
            kind: Some(VariableType::Number),
            default: None,
        });
        let err = mistyped.simplify(&table, &path()).unwrap_err();
        assert!(matches!(err, ConfigError::VariableTypeMismatch { .. }));
    }

    #[test]
    fn wrong_accessor_is_a_defined_error() {
        let compiled = CompiledParam::Constant(Value::Text("mareep".into()));
        let ctx = EvalContext::new();
        let evaluator = ExpressionEvaluator::new();
        assert!(matches!(
            compiled.resolve_number(&evaluator, &ctx),
            Err(EvalError::TypeMismatch { expected: "number", found: "text" })
        ));
        assert_eq!(compiled.resolve_text(&evaluator, &ctx).as_deref(), Ok("mareep"));
    }
}
