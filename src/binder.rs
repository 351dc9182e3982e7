//! Command-line construction
//!
//! Binds a [`ToolDescriptor`] against a concrete value tree. Inputs and
//! arguments ("bindables") are put in one total order by a composite sort
//! key, each is rendered according to its type and binding metadata, and the
//! base command is prepended to the result.
//!
//! Ordering: position first (unset after every explicit position), then
//! inputs before arguments, then inputs by identifier. Arguments sharing a
//! position keep their declaration order.

use crate::config::RuntimeConfig;
use crate::descriptor::{ArgumentBinding, InputBinding, ToolDescriptor};
use crate::error::{CwilError, Result};
use crate::expr::{Evaluated, ExpressionEvaluator};
use crate::types::{ScalarType, TypeSpec};
use serde::Serialize;
use serde_json::Value;

/// The bound command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundCommand {
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Position {
    At(i64),
    Unset,
}

impl From<Option<i64>> for Position {
    fn from(position: Option<i64>) -> Self {
        position.map_or(Position::Unset, Position::At)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BindableKind {
    Input,
    Argument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey<'a> {
    position: Position,
    kind: BindableKind,
    id: &'a str,
}

#[derive(Debug, Clone, Copy)]
enum Bindable<'a> {
    Input(&'a InputBinding),
    Argument(&'a ArgumentBinding),
}

impl<'a> Bindable<'a> {
    fn sort_key(&self) -> SortKey<'a> {
        match self {
            Bindable::Input(input) => SortKey {
                position: input.position().into(),
                kind: BindableKind::Input,
                id: &input.id,
            },
            Bindable::Argument(argument) => SortKey {
                position: argument.position().into(),
                kind: BindableKind::Argument,
                id: "",
            },
        }
    }
}

/// A formatted value before prefix handling.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Formatted {
    Text(String),
    Flag(bool),
}

impl Formatted {
    fn into_text(self) -> String {
        match self {
            Formatted::Text(text) => text,
            Formatted::Flag(flag) => flag.to_string(),
        }
    }
}

impl From<Evaluated> for Formatted {
    fn from(evaluated: Evaluated) -> Self {
        match evaluated {
            Evaluated::Text(text) => Formatted::Text(text),
            Evaluated::Bool(flag) => Formatted::Flag(flag),
        }
    }
}

/// Builds command lines from descriptors. Holds no per-call state.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    runtime: RuntimeConfig,
}

impl Binder {
    pub fn new(runtime: RuntimeConfig) -> Self {
        Self { runtime }
    }

    /// Bind `tool` against `values`, producing the argument vector, the
    /// evaluated stdin and the stdout name as written.
    pub fn bind(&self, tool: &ToolDescriptor, values: &Value) -> Result<BoundCommand> {
        let evaluator = ExpressionEvaluator::new(&self.runtime, values);

        let mut bindables: Vec<Bindable> = tool
            .inputs
            .iter()
            .map(Bindable::Input)
            .chain(tool.arguments.iter().map(Bindable::Argument))
            .collect();
        bindables.sort_by_key(Bindable::sort_key);

        let mut args = tool.base_command.clone();
        for bindable in bindables {
            match bindable {
                Bindable::Input(input) => args.extend(bind_input(input, values)?),
                Bindable::Argument(argument) => args.extend(bind_argument(argument, &evaluator)?),
            }
        }
        tracing::debug!(tool = %tool.id, ?args, "bound command line");

        let stdin = tool
            .stdin
            .as_deref()
            .map(|text| evaluator.interpolate(text))
            .transpose()?;
        let stdout = tool.stdout.clone();

        Ok(BoundCommand {
            args,
            stdin,
            stdout,
        })
    }
}

fn bind_input(input: &InputBinding, values: &Value) -> Result<Vec<String>> {
    let value = match values.get(&input.id) {
        Some(value) if !value.is_null() => value,
        _ if input.type_spec.is_optional() => return Ok(Vec::new()),
        _ => {
            return Err(CwilError::MissingRequiredInput {
                name: input.id.clone(),
            })
        }
    };

    let mut formatted = format_value(&input.id, &input.type_spec, value)?;
    let Some(binding) = &input.binding else {
        return Ok(Vec::new());
    };

    if let Some(separator) = &binding.item_separator {
        if !formatted.is_empty() && !matches!(formatted.as_slice(), [Formatted::Flag(_)]) {
            let joined = formatted
                .into_iter()
                .map(Formatted::into_text)
                .collect::<Vec<_>>()
                .join(separator);
            formatted = vec![Formatted::Text(joined)];
        }
    }
    Ok(apply_prefix(binding.prefix.as_deref(), formatted))
}

fn bind_argument(argument: &ArgumentBinding, evaluator: &ExpressionEvaluator) -> Result<Vec<String>> {
    match argument {
        ArgumentBinding::Literal(literal) => Ok(vec![literal.clone()]),
        ArgumentBinding::Expression {
            value_from, prefix, ..
        } => {
            let value = evaluator.evaluate(value_from)?;
            Ok(apply_prefix(prefix.as_deref(), vec![value.into()]))
        }
    }
}

/// Apply the prefix-as-flag rule: a boolean emits the prefix alone when true
/// and nothing when false; anything else follows the prefix.
fn apply_prefix(prefix: Option<&str>, formatted: Vec<Formatted>) -> Vec<String> {
    if let Some(Formatted::Flag(flag)) = formatted.first() {
        return match prefix {
            Some(prefix) if *flag => vec![prefix.to_string()],
            _ => Vec::new(),
        };
    }
    if formatted.is_empty() {
        return Vec::new();
    }

    let mut tokens = Vec::with_capacity(formatted.len() + 1);
    if let Some(prefix) = prefix {
        tokens.push(prefix.to_string());
    }
    tokens.extend(formatted.into_iter().map(Formatted::into_text));
    tokens
}

fn format_value(name: &str, type_spec: &TypeSpec, value: &Value) -> Result<Vec<Formatted>> {
    match type_spec {
        TypeSpec::Scalar(ScalarType::File) => value
            .get("path")
            .and_then(Value::as_str)
            .map(|path| vec![Formatted::Text(path.to_string())])
            .ok_or_else(|| invalid_value(name, type_spec)),
        TypeSpec::Scalar(ScalarType::Int) => format_int(value)
            .map(|text| vec![Formatted::Text(text)])
            .ok_or_else(|| invalid_value(name, type_spec)),
        TypeSpec::Scalar(ScalarType::Boolean) => value
            .as_bool()
            .map(|flag| vec![Formatted::Flag(flag)])
            .ok_or_else(|| invalid_value(name, type_spec)),
        TypeSpec::Union(members) => {
            let mut non_null = members.iter().filter(|m| **m != TypeSpec::Null);
            match (non_null.next(), non_null.next()) {
                (Some(member), None) => format_value(name, member, value),
                (None, _) => Err(CwilError::UnsupportedType {
                    name: name.to_string(),
                    message: "union without a non-null member".to_string(),
                }),
                (Some(_), Some(_)) => Err(CwilError::UnsupportedType {
                    name: name.to_string(),
                    message: format!("union {} has more than one non-null member", type_spec),
                }),
            }
        }
        TypeSpec::Array { items, prefix } => {
            let elements = value.as_array().ok_or_else(|| invalid_value(name, type_spec))?;
            let mut formatted = Vec::new();
            for element in elements {
                let item = format_value(name, items, element)?;
                // per-item prefix follows the flag rule for boolean elements
                if let [Formatted::Flag(flag)] = item.as_slice() {
                    if let (true, Some(prefix)) = (*flag, prefix) {
                        formatted.push(Formatted::Text(prefix.clone()));
                    }
                    continue;
                }
                if let Some(prefix) = prefix {
                    formatted.push(Formatted::Text(prefix.clone()));
                }
                formatted.extend(item);
            }
            Ok(formatted)
        }
        TypeSpec::Null => Err(CwilError::UnsupportedType {
            name: name.to_string(),
            message: "null is only valid as a union member".to_string(),
        }),
    }
}

/// Integers of either sign, or floats with no fractional part.
fn format_int(value: &Value) -> Option<String> {
    if let Some(n) = value.as_i64() {
        return Some(n.to_string());
    }
    if let Some(n) = value.as_u64() {
        return Some(n.to_string());
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| format!("{:.0}", f))
}

fn invalid_value(name: &str, type_spec: &TypeSpec) -> CwilError {
    CwilError::InvalidValue {
        name: name.to_string(),
        expected: type_spec.to_string(),
    }
}
