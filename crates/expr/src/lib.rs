//! `flowcraft-expr` — the sandboxed expression evaluator used for edge
//! `condition`s and `transform`s.
//!
//! This is not a general-purpose expression language: no function calls, no
//! global/process/filesystem/network access, just path access into the
//! bindings the caller supplies, comparisons, boolean connectives, and
//! literals. A richer, vetted expression library could replace the
//! hand-rolled parser behind this same interface as long as the sandboxing
//! contract holds.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::collections::HashMap;

use serde_json::Value;

pub use ast::Expr;
pub use error::EvalError;

/// A parsed, reusable expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, EvalError> {
        Ok(Self {
            source: source.to_string(),
            ast: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate as a condition: evaluation errors and falsy results both
    /// mean "edge not taken" — this never propagates an error.
    pub fn evaluate_condition(&self, bindings: &HashMap<String, Value>) -> bool {
        eval::evaluate_truthy(&self.ast, bindings)
    }

    /// Evaluate as a transform: any error here is the caller's
    /// `TransformFailed`.
    pub fn evaluate_transform(&self, bindings: &HashMap<String, Value>) -> Result<Value, EvalError> {
        eval::evaluate(&self.ast, bindings)
    }
}

/// One-shot condition evaluation without retaining the parsed AST.
pub fn evaluate_condition(source: &str, bindings: &HashMap<String, Value>) -> bool {
    match Expression::parse(source) {
        Ok(expr) => expr.evaluate_condition(bindings),
        Err(_) => false,
    }
}

/// One-shot transform evaluation without retaining the parsed AST.
pub fn evaluate_transform(source: &str, bindings: &HashMap<String, Value>) -> Result<Value, EvalError> {
    Expression::parse(source)?.evaluate_transform(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bad_syntax_condition_is_falsy_not_panicking() {
        assert!(!evaluate_condition("(((", &HashMap::new()));
    }

    #[test]
    fn transform_returns_input_reshaped() {
        let bindings = HashMap::from([("input".to_string(), json!({"n": 4}))]);
        let v = evaluate_transform("input.n", &bindings).unwrap();
        assert_eq!(v, json!(4));
    }
}
