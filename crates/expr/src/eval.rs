//! Evaluates a parsed [`Expr`] against a set of read-only bindings.
//!
//! The evaluator never touches process state, the filesystem, or the
//! network — it only walks the [`Value`] tree reachable from `bindings`,
//! which is exactly what makes it sandboxed. There is no function-call
//! syntax in the grammar, so there is nothing to reach out with even if a
//! caller wanted to.

use std::collections::HashMap;

use serde_json::Value;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::EvalError;

/// Evaluate `expr` against `bindings` (top-level names available to
/// `Expr::Path`) and return the resulting JSON value.
pub fn evaluate(expr: &Expr, bindings: &HashMap<String, Value>) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Path(segments) => resolve_path(segments, bindings),
        Expr::Unary(op, inner) => {
            let v = evaluate(inner, bindings)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!truthy(&v))),
                UnaryOp::Neg => match v.as_f64() {
                    Some(n) => Ok(Value::from(-n)),
                    None => Err(EvalError::Type(format!("cannot negate {v}"))),
                },
            }
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, bindings),
    }
}

/// Convenience for condition evaluation: any evaluation error or a
/// non-truthy result means the edge is not taken.
pub fn evaluate_truthy(expr: &Expr, bindings: &HashMap<String, Value>) -> bool {
    evaluate(expr, bindings).map(|v| truthy(&v)).unwrap_or(false)
}

fn resolve_path(segments: &[String], bindings: &HashMap<String, Value>) -> Result<Value, EvalError> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(EvalError::Type("empty path".into()));
    };
    let mut current = bindings
        .get(first)
        .cloned()
        .ok_or_else(|| EvalError::UnknownIdentifier(first.clone()))?;

    for segment in rest {
        current = match &current {
            Value::Object(map) => map.get(segment).cloned().unwrap_or(Value::Null),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null),
            Value::Null => Value::Null,
            other => return Err(EvalError::Type(format!("cannot index into {other}"))),
        };
    }
    Ok(current)
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    bindings: &HashMap<String, Value>,
) -> Result<Value, EvalError> {
    // Short-circuit boolean connectives.
    if matches!(op, BinaryOp::And | BinaryOp::Or) {
        let l = truthy(&evaluate(lhs, bindings)?);
        return match op {
            BinaryOp::And if !l => Ok(Value::Bool(false)),
            BinaryOp::Or if l => Ok(Value::Bool(true)),
            _ => Ok(Value::Bool(truthy(&evaluate(rhs, bindings)?))),
        };
    }

    let l = evaluate(lhs, bindings)?;
    let r = evaluate(rhs, bindings)?;

    let result = match op {
        BinaryOp::Eq => loose_eq(&l, &r),
        BinaryOp::NotEq => !loose_eq(&l, &r),
        BinaryOp::StrictEq => l == r,
        BinaryOp::StrictNotEq => l != r,
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => return compare(op, &l, &r),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    };
    Ok(Value::Bool(result))
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    if l == r {
        return true;
    }
    match (as_number(l), as_number(r)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn compare(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let ordering = match (l, r) {
        (Value::String(a), Value::String(b)) => a.partial_cmp(b),
        _ => match (as_number(l), as_number(r)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(EvalError::Type(format!(
                    "cannot compare {l} and {r}"
                )))
            }
        },
    };
    let Some(ordering) = ordering else {
        return Err(EvalError::Type(format!("cannot compare {l} and {r}")));
    };
    let result = match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// JS-like truthiness: `false`, `null`, `0`, `""`, and empty arrays/objects
/// are falsy; everything else is truthy.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use serde_json::json;

    fn bindings() -> HashMap<String, Value> {
        HashMap::from([
            ("result".to_string(), json!({"action": "yes", "status": {"code": 200}})),
            ("x".to_string(), json!(10)),
        ])
    }

    fn eval_str(src: &str) -> Value {
        evaluate(&parse(src).unwrap(), &bindings()).unwrap()
    }

    #[test]
    fn path_access_into_nested_object() {
        assert_eq!(eval_str("result.status.code"), json!(200));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval_str("x > 5"), json!(true));
        assert_eq!(eval_str("x > 50"), json!(false));
        assert_eq!(eval_str("x == 10"), json!(true));
        assert_eq!(eval_str("x === 10"), json!(true));
        assert_eq!(eval_str("result.action == \"yes\""), json!(true));
    }

    #[test]
    fn boolean_connectives_short_circuit() {
        assert_eq!(eval_str("x > 5 && result.action == \"yes\""), json!(true));
        assert_eq!(eval_str("x > 50 || result.action == \"yes\""), json!(true));
        assert_eq!(eval_str("!(x > 50)"), json!(true));
    }

    #[test]
    fn unknown_identifier_is_an_error_not_a_panic() {
        let expr = parse("nope.field").unwrap();
        assert!(evaluate(&expr, &bindings()).is_err());
        assert!(!evaluate_truthy(&expr, &bindings()));
    }

    #[test]
    fn missing_nested_field_resolves_to_null_not_error() {
        assert_eq!(eval_str("result.missing"), Value::Null);
    }

    #[test]
    fn loose_vs_strict_equality() {
        let mut b = bindings();
        b.insert("s".into(), json!("10"));
        let ten_str_eq_num = evaluate(&parse("s == x").unwrap(), &b).unwrap();
        let ten_str_strict_eq_num = evaluate(&parse("s === x").unwrap(), &b).unwrap();
        assert_eq!(ten_str_eq_num, json!(true));
        assert_eq!(ten_str_strict_eq_num, json!(false));
    }
}
