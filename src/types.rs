//! CWIL data types
//!
//! Input types are resolved once, during lowering or when a descriptor tree is
//! read, into the closed [`TypeSpec`] sum type. Every later formatting step
//! matches on it instead of re-inspecting the raw interchange shape.
//!
//! Interchange forms:
//! - `"File"`, `"int"`, `"boolean"`, `"null"` for scalars
//! - `"int?"` as shorthand for `["null", "int"]`
//! - a list for a union, e.g. `["null", "File"]`
//! - `{type: "array", items: <type>, inputBinding?: {prefix}}` for arrays

use crate::error::{CwilError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Scalar types understood by the binder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    File,
    Int,
    Boolean,
}

impl ScalarType {
    /// Name used in the descriptor interchange shape
    pub fn interchange_name(&self) -> &'static str {
        match self {
            ScalarType::File => "File",
            ScalarType::Int => "int",
            ScalarType::Boolean => "boolean",
        }
    }

    fn from_interchange_name(name: &str) -> Option<Self> {
        match name {
            "File" => Some(ScalarType::File),
            "int" => Some(ScalarType::Int),
            "boolean" => Some(ScalarType::Boolean),
            _ => None,
        }
    }
}

/// The type of an input binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSpec {
    /// The null-like member of an optional union
    Null,
    Scalar(ScalarType),
    Union(Vec<TypeSpec>),
    /// Array of `items`; `prefix` repeats before every element
    Array {
        items: Box<TypeSpec>,
        prefix: Option<String>,
    },
}

impl TypeSpec {
    pub fn file() -> Self {
        TypeSpec::Scalar(ScalarType::File)
    }

    pub fn int() -> Self {
        TypeSpec::Scalar(ScalarType::Int)
    }

    pub fn boolean() -> Self {
        TypeSpec::Scalar(ScalarType::Boolean)
    }

    /// `T?`, represented as `Union[null, T]`.
    pub fn optional(inner: TypeSpec) -> Self {
        match inner {
            TypeSpec::Union(mut members) => {
                if !members.contains(&TypeSpec::Null) {
                    members.insert(0, TypeSpec::Null);
                }
                TypeSpec::Union(members)
            }
            TypeSpec::Null => TypeSpec::Null,
            other => TypeSpec::Union(vec![TypeSpec::Null, other]),
        }
    }

    pub fn array(items: TypeSpec) -> Self {
        TypeSpec::Array {
            items: Box::new(items),
            prefix: None,
        }
    }

    /// Whether a missing value is acceptable for this type.
    pub fn is_optional(&self) -> bool {
        match self {
            TypeSpec::Null => true,
            TypeSpec::Union(members) => members.iter().any(|m| *m == TypeSpec::Null),
            _ => false,
        }
    }

    /// Resolve a type from its interchange shape.
    ///
    /// `name` identifies the input for error reporting.
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(type_name) => {
                if let Some(inner) = type_name.strip_suffix('?') {
                    let inner = Self::from_value(name, &Value::String(inner.to_string()))?;
                    return Ok(TypeSpec::optional(inner));
                }
                if type_name == "null" {
                    return Ok(TypeSpec::Null);
                }
                ScalarType::from_interchange_name(type_name)
                    .map(TypeSpec::Scalar)
                    .ok_or_else(|| CwilError::UnsupportedType {
                        name: name.to_string(),
                        message: format!("unknown type {}", type_name),
                    })
            }
            Value::Array(members) => {
                let members = members
                    .iter()
                    .map(|member| Self::from_value(name, member))
                    .collect::<Result<Vec<_>>>()?;
                Ok(TypeSpec::Union(members))
            }
            Value::Object(fields) => match fields.get("type").and_then(Value::as_str) {
                Some("array") => {
                    let items = fields.get("items").ok_or_else(|| CwilError::UnsupportedType {
                        name: name.to_string(),
                        message: "array type without items".to_string(),
                    })?;
                    let prefix = fields
                        .get("inputBinding")
                        .and_then(|binding| binding.get("prefix"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    Ok(TypeSpec::Array {
                        items: Box::new(Self::from_value(name, items)?),
                        prefix,
                    })
                }
                Some(other) => Err(CwilError::UnsupportedType {
                    name: name.to_string(),
                    message: format!("unknown type {}", other),
                }),
                None => Err(CwilError::UnsupportedType {
                    name: name.to_string(),
                    message: "type object without a type field".to_string(),
                }),
            },
            other => Err(CwilError::UnsupportedType {
                name: name.to_string(),
                message: format!("unrecognized type shape {}", other),
            }),
        }
    }

    /// Render the interchange shape of this type.
    pub fn to_value(&self) -> Value {
        match self {
            TypeSpec::Null => json!("null"),
            TypeSpec::Scalar(scalar) => json!(scalar.interchange_name()),
            TypeSpec::Union(members) => {
                Value::Array(members.iter().map(TypeSpec::to_value).collect())
            }
            TypeSpec::Array { items, prefix } => {
                let mut fields = Map::new();
                fields.insert("type".to_string(), json!("array"));
                fields.insert("items".to_string(), items.to_value());
                if let Some(prefix) = prefix {
                    fields.insert("inputBinding".to_string(), json!({ "prefix": prefix }));
                }
                Value::Object(fields)
            }
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Null => f.write_str("None"),
            TypeSpec::Scalar(ScalarType::File) => f.write_str("File"),
            TypeSpec::Scalar(ScalarType::Int) => f.write_str("Int"),
            TypeSpec::Scalar(ScalarType::Boolean) => f.write_str("Boolean"),
            TypeSpec::Union(members) => {
                let non_null: Vec<&TypeSpec> =
                    members.iter().filter(|m| **m != TypeSpec::Null).collect();
                if non_null.len() == 1 && self.is_optional() {
                    write!(f, "{}?", non_null[0])
                } else {
                    let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                    write!(f, "Union[{}]", parts.join(","))
                }
            }
            TypeSpec::Array { items, .. } => write!(f, "Array[{}]", items),
        }
    }
}
