//! Embedded expression evaluation
//!
//! Only strings shaped like `prefix$(expression)suffix` are evaluated; any
//! other string passes through unchanged. The vocabulary is closed:
//!
//! - runtime properties from [`RUNTIME_PROPERTIES`], e.g. `runtime.cores`
//! - `inputs.<id>[.<field>...]` lookups of scalar values in the value tree
//!
//! Anything else fails with [`CwilError::UnsupportedExpression`].

use crate::config::RuntimeConfig;
use crate::error::{CwilError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

type RuntimeProperty = fn(&RuntimeConfig) -> Value;

/// Recognized runtime property names and how each is resolved.
pub static RUNTIME_PROPERTIES: Lazy<HashMap<&'static str, RuntimeProperty>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, RuntimeProperty> = HashMap::new();
    table.insert("runtime.cores", |runtime| Value::from(runtime.cores));
    table
});

static EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^(.*?)\$\((.*)\)(.*)$").expect("expression pattern"));

static INPUT_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^inputs(\.\w+)+$").expect("input path pattern"));

/// Result of evaluating a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluated {
    Text(String),
    /// A whole-string expression that resolved to a boolean
    Bool(bool),
}

impl Evaluated {
    pub fn into_text(self) -> String {
        match self {
            Evaluated::Text(text) => text,
            Evaluated::Bool(flag) => flag.to_string(),
        }
    }
}

/// Evaluates expressions against a runtime configuration and a value tree.
pub struct ExpressionEvaluator<'a> {
    runtime: &'a RuntimeConfig,
    inputs: &'a Value,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(runtime: &'a RuntimeConfig, inputs: &'a Value) -> Self {
        Self { runtime, inputs }
    }

    /// Evaluate `text`, keeping a boolean result when the expression spans
    /// the whole string.
    pub fn evaluate(&self, text: &str) -> Result<Evaluated> {
        let Some(captures) = EXPRESSION.captures(text) else {
            return Ok(Evaluated::Text(text.to_string()));
        };
        let prefix = &captures[1];
        let suffix = &captures[3];
        let value = self.evaluate_expression(captures[2].trim())?;

        if prefix.is_empty() && suffix.is_empty() {
            if let Value::Bool(flag) = value {
                return Ok(Evaluated::Bool(flag));
            }
        }
        Ok(Evaluated::Text(format!(
            "{}{}{}",
            prefix,
            scalar_text(&value),
            suffix
        )))
    }

    /// Evaluate `text` into a string.
    pub fn interpolate(&self, text: &str) -> Result<String> {
        self.evaluate(text).map(Evaluated::into_text)
    }

    fn evaluate_expression(&self, expression: &str) -> Result<Value> {
        if let Some(property) = RUNTIME_PROPERTIES.get(expression) {
            return Ok(property(self.runtime));
        }
        if INPUT_PATH.is_match(expression) {
            return self.lookup_input(expression);
        }
        Err(CwilError::UnsupportedExpression {
            expression: expression.to_string(),
        })
    }

    fn lookup_input(&self, expression: &str) -> Result<Value> {
        let mut current = self.inputs;
        for field in expression.split('.').skip(1) {
            current = current
                .get(field)
                .ok_or_else(|| CwilError::MissingRequiredInput {
                    name: expression.to_string(),
                })?;
        }
        match current {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(current.clone()),
            _ => Err(CwilError::UnsupportedExpression {
                expression: expression.to_string(),
            }),
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
