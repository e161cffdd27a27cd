//! Tree-walking evaluator and the explicit evaluation context.

use super::{BinaryOp, Expr, Expression, QueryStruct, UnaryOp, Value};
use crate::error::EvalError;
use crate::variable::{VariableTable, VariableValue};

/// Everything an expression may read, passed explicitly on every call.
///
/// Paths resolve as follows:
/// - `q.entity.<prop>` / `query.entity.<prop>`: the bound entity
/// - `q.entity.config.<name>`: the template's variable table
/// - `q.world.<prop>`: the world clock
/// - `v.<name>` / `variable.<name>`: caller-supplied locals
#[derive(Clone, Copy, Default)]
pub struct EvalContext<'a> {
    entity: Option<&'a dyn QueryStruct>,
    world: Option<&'a dyn QueryStruct>,
    config: Option<&'a VariableTable>,
    locals: &'a [(&'a str, Value)],
}

impl<'a> EvalContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity(mut self, entity: &'a dyn QueryStruct) -> Self {
        self.entity = Some(entity);
        self
    }

    #[must_use]
    pub fn with_world(mut self, world: &'a dyn QueryStruct) -> Self {
        self.world = Some(world);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: &'a VariableTable) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn with_locals(mut self, locals: &'a [(&'a str, Value)]) -> Self {
        self.locals = locals;
        self
    }
}

/// Resolves expressions to typed values.
///
/// Implementations must be deterministic for a fixed expression and context.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, expr: &Expression, ctx: &EvalContext<'_>) -> Result<Value, EvalError>;

    fn resolve_bool(&self, expr: &Expression, ctx: &EvalContext<'_>) -> Result<bool, EvalError> {
        self.evaluate(expr, ctx)?.as_bool()
    }

    fn resolve_number(&self, expr: &Expression, ctx: &EvalContext<'_>) -> Result<f64, EvalError> {
        self.evaluate(expr, ctx)?.as_number()
    }

    fn resolve_text(&self, expr: &Expression, ctx: &EvalContext<'_>) -> Result<String, EvalError> {
        self.evaluate(expr, ctx)?.as_text().map(str::to_owned)
    }
}

/// Default evaluator for [`Expression`] trees.
#[derive(Clone, Copy, Debug)]
pub struct ExpressionEvaluator {
    max_depth: usize,
}

impl ExpressionEvaluator {
    /// How many dynamic config variables may reference each other in a chain.
    pub const DEFAULT_MAX_DEPTH: usize = 8;

    pub fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    fn eval(&self, expr: &Expr, ctx: &EvalContext<'_>, depth: usize) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(segments) => self.lookup(segments, ctx, depth),
            Expr::Unary(UnaryOp::Not, operand) => {
                Ok(Value::Bool(!self.eval(operand, ctx, depth)?.as_bool()?))
            }
            Expr::Unary(UnaryOp::Neg, operand) => {
                Ok(Value::Number(-self.eval(operand, ctx, depth)?.as_number()?))
            }
            Expr::Ternary(cond, then, otherwise) => {
                if self.eval(cond, ctx, depth)?.as_bool()? {
                    self.eval(then, ctx, depth)
                } else {
                    self.eval(otherwise, ctx, depth)
                }
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let result = self.eval(lhs, ctx, depth)?.as_bool()?
                    && self.eval(rhs, ctx, depth)?.as_bool()?;
                Ok(Value::Bool(result))
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let result = self.eval(lhs, ctx, depth)?.as_bool()?
                    || self.eval(rhs, ctx, depth)?.as_bool()?;
                Ok(Value::Bool(result))
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs, ctx, depth)?;
                let rhs = self.eval(rhs, ctx, depth)?;
                binary(*op, &lhs, &rhs)
            }
        }
    }

    fn lookup(
        &self,
        segments: &[String],
        ctx: &EvalContext<'_>,
        depth: usize,
    ) -> Result<Value, EvalError> {
        let unknown = || EvalError::UnknownPath(segments.join("."));
        let parts: Vec<&str> = segments.iter().map(String::as_str).collect();

        match parts.as_slice() {
            ["q" | "query", "entity", "config", name] => {
                let table = ctx.config.ok_or_else(unknown)?;
                match table.get(name).ok_or_else(unknown)? {
                    VariableValue::Constant(value) => Ok(value.clone()),
                    VariableValue::Dynamic(expr) => {
                        if depth >= self.max_depth {
                            return Err(EvalError::RecursionLimit((*name).to_owned()));
                        }
                        self.eval(expr.root(), ctx, depth + 1)
                    }
                }
            }
            ["q" | "query", "entity", property] => {
                let entity = ctx
                    .entity
                    .ok_or_else(|| EvalError::NoEntity(segments.join(".")))?;
                entity.query(property).ok_or_else(unknown)
            }
            ["q" | "query", "world", property] => ctx
                .world
                .and_then(|world| world.query(property))
                .ok_or_else(unknown),
            ["v" | "variable", name] => ctx
                .locals
                .iter()
                .find(|(local, _)| local == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(unknown),
            _ => Err(unknown()),
        }
    }
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for ExpressionEvaluator {
    fn evaluate(&self, expr: &Expression, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        self.eval(expr.root(), ctx, 0)
    }
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    let value = match op {
        BinaryOp::Eq => Value::Bool(loose_eq(lhs, rhs)),
        BinaryOp::Ne => Value::Bool(!loose_eq(lhs, rhs)),
        BinaryOp::Add => Value::Number(lhs.as_number()? + rhs.as_number()?),
        BinaryOp::Sub => Value::Number(lhs.as_number()? - rhs.as_number()?),
        BinaryOp::Mul => Value::Number(lhs.as_number()? * rhs.as_number()?),
        BinaryOp::Div | BinaryOp::Rem => {
            let (a, b) = (lhs.as_number()?, rhs.as_number()?);
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::Number(if op == BinaryOp::Div { a / b } else { a % b })
        }
        BinaryOp::Lt => Value::Bool(lhs.as_number()? < rhs.as_number()?),
        BinaryOp::Le => Value::Bool(lhs.as_number()? <= rhs.as_number()?),
        BinaryOp::Gt => Value::Bool(lhs.as_number()? > rhs.as_number()?),
        BinaryOp::Ge => Value::Bool(lhs.as_number()? >= rhs.as_number()?),
        BinaryOp::And | BinaryOp::Or => {
            let (a, b) = (lhs.as_bool()?, rhs.as_bool()?);
            Value::Bool(if op == BinaryOp::And { a && b } else { a || b })
        }
    };
    Ok(value)
}

/// Text compares only with text; booleans and numbers compare numerically.
fn loose_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::Text(_), _) | (_, Value::Text(_)) => false,
        (a, b) => match (a.as_number(), b.as_number()) {
            (Ok(x), Ok(y)) => x == y,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{DeclaredVariable, VariableType};
    use crate::ConfigPath;

    struct Entity {
        level: f64,
    }

    impl QueryStruct for Entity {
        fn query(&self, property: &str) -> Option<Value> {
            match property {
                "level" => Some(Value::Number(self.level)),
                "species" => Some(Value::Text("wooloo".into())),
                _ => None,
            }
        }
    }

    fn eval(src: &str, ctx: &EvalContext<'_>) -> Result<Value, EvalError> {
        ExpressionEvaluator::new().evaluate(&Expression::parse(src).unwrap(), ctx)
    }

    #[test]
    fn arithmetic_and_logic() {
        let ctx = EvalContext::new();
        assert_eq!(eval("1 + 2 * 3", &ctx), Ok(Value::Number(7.0)));
        assert_eq!(eval("(1 + 2) * 3", &ctx), Ok(Value::Number(9.0)));
        assert_eq!(eval("7 % 4 == 3", &ctx), Ok(Value::Bool(true)));
        assert_eq!(eval("!false && 1", &ctx), Ok(Value::Bool(true)));
        assert_eq!(eval("0 || false", &ctx), Ok(Value::Bool(false)));
        assert_eq!(eval("-2 < 1 ? 'yes' : 'no'", &ctx), Ok(Value::Text("yes".into())));
        assert_eq!(eval("1 / 0", &ctx), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn short_circuit_skips_right_side() {
        let ctx = EvalContext::new();
        assert_eq!(eval("false && q.entity.level", &ctx), Ok(Value::Bool(false)));
        assert_eq!(eval("true || 1 / 0", &ctx), Ok(Value::Bool(true)));
    }

    #[test]
    fn entity_and_locals_resolve() {
        let entity = Entity { level: 12.0 };
        let locals = [("distance", Value::Number(3.5))];
        let ctx = EvalContext::new().with_entity(&entity).with_locals(&locals);

        assert_eq!(eval("q.entity.level >= 10", &ctx), Ok(Value::Bool(true)));
        assert_eq!(eval("query.entity.species == 'wooloo'", &ctx), Ok(Value::Bool(true)));
        assert_eq!(eval("v.distance * 2", &ctx), Ok(Value::Number(7.0)));
        assert_eq!(
            eval("q.entity.wingspan", &ctx),
            Err(EvalError::UnknownPath("q.entity.wingspan".into()))
        );
    }

    #[test]
    fn missing_entity_is_reported() {
        assert_eq!(
            eval("q.entity.level", &EvalContext::new()),
            Err(EvalError::NoEntity("q.entity.level".into()))
        );
    }

    #[test]
    fn text_never_coerces() {
        let ctx = EvalContext::new();
        assert_eq!(
            eval("'abc' + 1", &ctx),
            Err(EvalError::TypeMismatch {
                expected: "number",
                found: "text"
            })
        );
        assert_eq!(eval("'1' == 1", &ctx), Ok(Value::Bool(false)));
    }

    #[test]
    fn config_variables_resolve_constant_and_dynamic() {
        let path = ConfigPath::root("test");
        let mut table = VariableTable::new();
        table
            .declare(
                DeclaredVariable::new("wander", "wander_chance", VariableType::Number, "0.5"),
                &path,
            )
            .unwrap();
        table
            .declare(
                DeclaredVariable::new("wander", "doubled", VariableType::Number, "0"),
                &path,
            )
            .unwrap();
        table
            .set(
                "doubled",
                VariableValue::Dynamic(
                    Expression::parse("q.entity.config.wander_chance * q.entity.level").unwrap(),
                ),
                &path,
            )
            .unwrap();

        let entity = Entity { level: 4.0 };
        let ctx = EvalContext::new().with_entity(&entity).with_config(&table);
        assert_eq!(eval("q.entity.config.wander_chance", &ctx), Ok(Value::Number(0.5)));
        assert_eq!(eval("q.entity.config.doubled", &ctx), Ok(Value::Number(2.0)));
    }

    #[test]
    fn self_referencing_variable_hits_depth_limit() {
        let path = ConfigPath::root("test");
        let mut table = VariableTable::new();
        table
            .declare(
                DeclaredVariable::new("misc", "loop", VariableType::Number, "0"),
                &path,
            )
            .unwrap();
        table
            .set(
                "loop",
                VariableValue::Dynamic(Expression::parse("q.entity.config.loop + 1").unwrap()),
                &path,
            )
            .unwrap();

        let ctx = EvalContext::new().with_config(&table);
        assert_eq!(
            eval("q.entity.config.loop", &ctx),
            Err(EvalError::RecursionLimit("loop".into()))
        );
    }
}
