//! Normalized tool and workflow descriptors
//!
//! A [`ToolDescriptor`] is what lowering produces for each task and what the
//! binder consumes. It is built once and never mutated afterwards; binding
//! only borrows it.
//!
//! Descriptors are exchanged with the outside world as in-memory
//! `serde_json::Value` trees of the CommandLineTool shape:
//!
//! ```text
//! { class: "CommandLineTool" | "Workflow", id, baseCommand: [..],
//!   inputs: [{id, type, inputBinding?: {position?, prefix?, itemSeparator?}}],
//!   arguments?: [...], outputs: [...], stdin?, stdout?, steps?: [...] }
//! ```

use crate::error::{CwilError, Result};
use crate::types::TypeSpec;
use serde_json::{json, Map, Value};

/// Position, prefix and item-separator metadata of an input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLineBinding {
    pub position: Option<i64>,
    pub prefix: Option<String>,
    pub item_separator: Option<String>,
}

impl CommandLineBinding {
    pub fn at(position: i64) -> Self {
        Self {
            position: Some(position),
            ..Default::default()
        }
    }

    fn from_value(id: &str, value: &Value) -> Result<Self> {
        let fields = value.as_object().ok_or_else(|| {
            CwilError::invalid_descriptor(format!("inputBinding of {} is not a mapping", id))
        })?;
        Ok(Self {
            position: optional_int(fields, "position", id)?,
            prefix: optional_str(fields, "prefix", id)?,
            item_separator: optional_str(fields, "itemSeparator", id)?,
        })
    }

    fn to_value(&self) -> Value {
        let mut fields = Map::new();
        if let Some(position) = self.position {
            fields.insert("position".to_string(), json!(position));
        }
        if let Some(prefix) = &self.prefix {
            fields.insert("prefix".to_string(), json!(prefix));
        }
        if let Some(separator) = &self.item_separator {
            fields.insert("itemSeparator".to_string(), json!(separator));
        }
        Value::Object(fields)
    }
}

/// A typed tool input.
///
/// An input without a `binding` is accepted and validated but never rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    pub id: String,
    pub type_spec: TypeSpec,
    pub binding: Option<CommandLineBinding>,
}

impl InputBinding {
    pub fn new(id: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self {
            id: id.into(),
            type_spec,
            binding: None,
        }
    }

    pub fn with_binding(mut self, binding: CommandLineBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn position(&self) -> Option<i64> {
        self.binding.as_ref().and_then(|b| b.position)
    }

    fn from_value(value: &Value) -> Result<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| CwilError::invalid_descriptor("input is not a mapping"))?;
        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| CwilError::invalid_descriptor("input without an id"))?
            .to_string();
        let type_value = fields
            .get("type")
            .ok_or_else(|| CwilError::invalid_descriptor(format!("input {} has no type", id)))?;
        let type_spec = TypeSpec::from_value(&id, type_value)?;
        let binding = fields
            .get("inputBinding")
            .map(|b| CommandLineBinding::from_value(&id, b))
            .transpose()?;
        Ok(Self {
            id,
            type_spec,
            binding,
        })
    }

    fn to_value(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(self.id));
        fields.insert("type".to_string(), self.type_spec.to_value());
        if let Some(binding) = &self.binding {
            fields.insert("inputBinding".to_string(), binding.to_value());
        }
        Value::Object(fields)
    }
}

/// A fixed command-line argument not tied to an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentBinding {
    /// Emitted verbatim; sorts with an unset position
    Literal(String),
    /// `valueFrom` expression evaluated at bind time
    Expression {
        value_from: String,
        position: Option<i64>,
        prefix: Option<String>,
    },
}

impl ArgumentBinding {
    pub fn position(&self) -> Option<i64> {
        match self {
            ArgumentBinding::Literal(_) => None,
            ArgumentBinding::Expression { position, .. } => *position,
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(literal) => Ok(ArgumentBinding::Literal(literal.clone())),
            Value::Object(fields) => {
                let value_from = fields
                    .get("valueFrom")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CwilError::invalid_descriptor("argument without valueFrom"))?
                    .to_string();
                Ok(ArgumentBinding::Expression {
                    value_from,
                    position: optional_int(fields, "position", "argument")?,
                    prefix: optional_str(fields, "prefix", "argument")?,
                })
            }
            other => Err(CwilError::invalid_descriptor(format!(
                "unrecognized argument {}",
                other
            ))),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            ArgumentBinding::Literal(literal) => json!(literal),
            ArgumentBinding::Expression {
                value_from,
                position,
                prefix,
            } => {
                let mut fields = Map::new();
                fields.insert("valueFrom".to_string(), json!(value_from));
                if let Some(position) = position {
                    fields.insert("position".to_string(), json!(position));
                }
                if let Some(prefix) = prefix {
                    fields.insert("prefix".to_string(), json!(prefix));
                }
                Value::Object(fields)
            }
        }
    }
}

/// Task-level binding schema produced by lowering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolDescriptor {
    pub id: String,
    pub base_command: Vec<String>,
    pub inputs: Vec<InputBinding>,
    pub arguments: Vec<ArgumentBinding>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    /// Declared outputs; lowering always leaves this empty
    pub outputs: Vec<Value>,
}

impl ToolDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn input(&self, id: &str) -> Option<&InputBinding> {
        self.inputs.iter().find(|input| input.id == id)
    }

    /// Fill every field this descriptor left unset from `imported`.
    ///
    /// Fields already set here take precedence; the id is never replaced.
    pub fn merge_from(&mut self, imported: ToolDescriptor) {
        if self.base_command.is_empty() {
            self.base_command = imported.base_command;
        }
        if self.inputs.is_empty() {
            self.inputs = imported.inputs;
        }
        if self.arguments.is_empty() {
            self.arguments = imported.arguments;
        }
        if self.stdin.is_none() {
            self.stdin = imported.stdin;
        }
        if self.stdout.is_none() {
            self.stdout = imported.stdout;
        }
        if self.outputs.is_empty() {
            self.outputs = imported.outputs;
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let fields = value
            .as_object()
            .ok_or_else(|| CwilError::invalid_descriptor("descriptor is not a mapping"))?;
        match fields.get("class").and_then(Value::as_str) {
            Some("CommandLineTool") => {}
            Some(other) => {
                return Err(CwilError::invalid_descriptor(format!(
                    "expected class CommandLineTool, found {}",
                    other
                )))
            }
            None => return Err(CwilError::invalid_descriptor("descriptor without class")),
        }

        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let base_command = match fields.get("baseCommand") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(command)) => vec![command.clone()],
            Some(Value::Array(tokens)) => tokens
                .iter()
                .map(|token| {
                    token.as_str().map(str::to_string).ok_or_else(|| {
                        CwilError::invalid_descriptor("baseCommand entries must be strings")
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(CwilError::invalid_descriptor(format!(
                    "unrecognized baseCommand {}",
                    other
                )))
            }
        };
        let inputs = list_field(fields, "inputs")?
            .iter()
            .map(InputBinding::from_value)
            .collect::<Result<Vec<_>>>()?;
        let arguments = list_field(fields, "arguments")?
            .iter()
            .map(ArgumentBinding::from_value)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id,
            base_command,
            inputs,
            arguments,
            stdin: optional_str(fields, "stdin", "descriptor")?,
            stdout: optional_str(fields, "stdout", "descriptor")?,
            outputs: list_field(fields, "outputs")?.to_vec(),
        })
    }

    pub fn to_value(&self) -> Value {
        let mut fields = Map::new();
        fields.insert("class".to_string(), json!("CommandLineTool"));
        fields.insert("id".to_string(), json!(self.id));
        fields.insert("baseCommand".to_string(), json!(self.base_command));
        fields.insert(
            "inputs".to_string(),
            Value::Array(self.inputs.iter().map(InputBinding::to_value).collect()),
        );
        if !self.arguments.is_empty() {
            fields.insert(
                "arguments".to_string(),
                Value::Array(self.arguments.iter().map(ArgumentBinding::to_value).collect()),
            );
        }
        fields.insert("outputs".to_string(), Value::Array(self.outputs.clone()));
        if let Some(stdin) = &self.stdin {
            fields.insert("stdin".to_string(), json!(stdin));
        }
        if let Some(stdout) = &self.stdout {
            fields.insert("stdout".to_string(), json!(stdout));
        }
        Value::Object(fields)
    }
}

/// Workflow-level descriptor: resolved task steps in call order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDescriptor {
    pub id: String,
    pub steps: Vec<ToolDescriptor>,
}

impl WorkflowDescriptor {
    pub fn to_value(&self) -> Value {
        json!({
            "class": "Workflow",
            "id": self.id,
            "steps": self.steps.iter().map(ToolDescriptor::to_value).collect::<Vec<_>>(),
        })
    }
}

/// Result of compiling a document
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Tool(ToolDescriptor),
    Workflow(WorkflowDescriptor),
}

impl Descriptor {
    pub fn id(&self) -> &str {
        match self {
            Descriptor::Tool(tool) => &tool.id,
            Descriptor::Workflow(workflow) => &workflow.id,
        }
    }

    pub fn as_tool(&self) -> Option<&ToolDescriptor> {
        match self {
            Descriptor::Tool(tool) => Some(tool),
            Descriptor::Workflow(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Descriptor::Tool(tool) => tool.to_value(),
            Descriptor::Workflow(workflow) => workflow.to_value(),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        match value.get("class").and_then(Value::as_str) {
            Some("Workflow") => {
                let id = value
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let steps = value
                    .get("steps")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .map(ToolDescriptor::from_value)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Descriptor::Workflow(WorkflowDescriptor { id, steps }))
            }
            _ => ToolDescriptor::from_value(value).map(Descriptor::Tool),
        }
    }
}

fn list_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<&'a [Value]> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(CwilError::invalid_descriptor(format!("{} must be a list", key))),
    }
}

fn optional_str(fields: &Map<String, Value>, key: &str, owner: &str) -> Result<Option<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(CwilError::invalid_descriptor(format!(
            "{} of {} must be a string",
            key, owner
        ))),
    }
}

fn optional_int(fields: &Map<String, Value>, key: &str, owner: &str) -> Result<Option<i64>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            CwilError::invalid_descriptor(format!("{} of {} must be an integer", key, owner))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_tool() -> ToolDescriptor {
        ToolDescriptor {
            id: "echo".to_string(),
            base_command: vec!["echo".to_string()],
            inputs: vec![InputBinding::new("message", TypeSpec::file())
                .with_binding(CommandLineBinding::at(0))],
            ..Default::default()
        }
    }

    #[test]
    fn test_tool_to_value_shape() {
        let value = echo_tool().to_value();
        assert_eq!(
            value,
            json!({
                "class": "CommandLineTool",
                "id": "echo",
                "baseCommand": ["echo"],
                "inputs": [{"id": "message", "type": "File", "inputBinding": {"position": 0}}],
                "outputs": [],
            })
        );
    }

    #[test]
    fn test_tool_from_value_accepts_string_base_command() {
        let tool = ToolDescriptor::from_value(&json!({
            "class": "CommandLineTool",
            "baseCommand": "tar",
            "inputs": [
                {"id": "verbose", "type": "boolean", "inputBinding": {"prefix": "-v"}},
                {"id": "level", "type": ["null", "int"]},
            ],
            "arguments": ["x", {"valueFrom": "$(runtime.cores)", "position": 1, "prefix": "-j"}],
            "stdout": "out.txt",
        }))
        .unwrap();

        assert_eq!(tool.base_command, vec!["tar"]);
        assert_eq!(tool.inputs.len(), 2);
        assert_eq!(
            tool.input("verbose").and_then(|i| i.binding.clone()),
            Some(CommandLineBinding {
                prefix: Some("-v".to_string()),
                ..Default::default()
            })
        );
        assert!(tool.input("level").unwrap().binding.is_none());
        assert_eq!(tool.arguments[0], ArgumentBinding::Literal("x".to_string()));
        assert_eq!(tool.arguments[1].position(), Some(1));
        assert_eq!(tool.stdout.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_from_value_rejects_bad_shapes() {
        assert!(matches!(
            ToolDescriptor::from_value(&json!({"class": "ExpressionTool"})),
            Err(CwilError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            ToolDescriptor::from_value(&json!({"class": "CommandLineTool", "inputs": {}})),
            Err(CwilError::InvalidDescriptor { .. })
        ));
        assert!(matches!(
            ToolDescriptor::from_value(&json!({
                "class": "CommandLineTool",
                "inputs": [{"id": "x", "type": "File", "inputBinding": {"position": "first"}}],
            })),
            Err(CwilError::InvalidDescriptor { .. })
        ));
    }

    #[test]
    fn test_merge_keeps_own_fields() {
        let mut own = ToolDescriptor::new("local");
        own.base_command = vec!["cat".to_string()];

        let mut imported = echo_tool();
        imported.stdout = Some("out.txt".to_string());
        own.merge_from(imported);

        assert_eq!(own.id, "local");
        assert_eq!(own.base_command, vec!["cat"]);
        assert_eq!(own.inputs.len(), 1);
        assert_eq!(own.stdout.as_deref(), Some("out.txt"));
    }

    #[test]
    fn test_workflow_descriptor_value() {
        let descriptor = Descriptor::Workflow(WorkflowDescriptor {
            id: "wf".to_string(),
            steps: vec![echo_tool()],
        });
        let value = descriptor.to_value();
        assert_eq!(value["class"], "Workflow");
        assert_eq!(value["steps"][0]["id"], "echo");
        assert_eq!(Descriptor::from_value(&value).unwrap(), descriptor);
    }
}
