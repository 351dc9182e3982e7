//! CWIL Abstract Syntax Tree (AST) for documents, tasks, and workflows
//!
//! The AST is constructed by the parser and consumed by the compiler. Nodes
//! are immutable once parsed: a [`Document`] is only ever built whole, after
//! the complete source text matched the grammar.

use crate::error::{CwilError, Result};
use crate::types::TypeSpec;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;


/// A parsed CWIL document: tasks and workflows in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub statements: Vec<Statement>,
}

/// Top-level statement of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Task(Task),
    Workflow(Workflow),
}

impl Document {
    /// Build a document, rejecting duplicate task names.
    pub fn new(statements: Vec<Statement>) -> Result<Self> {
        let mut seen = HashSet::new();
        for statement in &statements {
            if let Statement::Task(task) = statement {
                if !seen.insert(task.name.as_str()) {
                    return Err(CwilError::DuplicateTask {
                        name: task.name.clone(),
                    });
                }
            }
        }
        Ok(Self { statements })
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Task(task) => Some(task),
            Statement::Workflow(_) => None,
        })
    }

    pub fn workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Workflow(workflow) => Some(workflow),
            Statement::Task(_) => None,
        })
    }

    /// Look up a task by name.
    pub fn get_task(&self, name: &str) -> Option<&Task> {
        self.tasks().find(|task| task.name == name)
    }
}

/// The kinds of block a task may declare, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    CommandLine,
    InputSet,
    OutputSet,
    Import,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            PartKind::CommandLine => "command",
            PartKind::InputSet => "input",
            PartKind::OutputSet => "output",
            PartKind::Import => "import",
        };
        f.write_str(keyword)
    }
}

/// One block inside a task body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskPart {
    CommandLine(CommandLine),
    InputSet(InputSet),
    OutputSet(OutputSet),
    Import(Import),
}

impl TaskPart {
    pub fn kind(&self) -> PartKind {
        match self {
            TaskPart::CommandLine(_) => PartKind::CommandLine,
            TaskPart::InputSet(_) => PartKind::InputSet,
            TaskPart::OutputSet(_) => PartKind::OutputSet,
            TaskPart::Import(_) => PartKind::Import,
        }
    }
}

/// A task: a name plus at most one block of each kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    parts: IndexMap<PartKind, TaskPart>,
}

impl Task {
    /// Assemble a task from its blocks in declaration order.
    ///
    /// A block kind declared twice fails with [`CwilError::DuplicatePart`].
    pub fn new(name: String, parts: Vec<TaskPart>) -> Result<Self> {
        let mut part_map = IndexMap::new();
        for part in parts {
            let kind = part.kind();
            if part_map.contains_key(&kind) {
                return Err(CwilError::DuplicatePart {
                    task: name,
                    part: kind.to_string(),
                });
            }
            part_map.insert(kind, part);
        }
        Ok(Self {
            name,
            parts: part_map,
        })
    }

    pub fn part(&self, kind: PartKind) -> Option<&TaskPart> {
        self.parts.get(&kind)
    }

    pub fn parts(&self) -> impl Iterator<Item = &TaskPart> {
        self.parts.values()
    }

    pub fn command_line(&self) -> Option<&CommandLine> {
        match self.part(PartKind::CommandLine) {
            Some(TaskPart::CommandLine(command)) => Some(command),
            _ => None,
        }
    }

    pub fn input_set(&self) -> Option<&InputSet> {
        match self.part(PartKind::InputSet) {
            Some(TaskPart::InputSet(inputs)) => Some(inputs),
            _ => None,
        }
    }

    pub fn output_set(&self) -> Option<&OutputSet> {
        match self.part(PartKind::OutputSet) {
            Some(TaskPart::OutputSet(outputs)) => Some(outputs),
            _ => None,
        }
    }

    pub fn import(&self) -> Option<&Import> {
        match self.part(PartKind::Import) {
            Some(TaskPart::Import(import)) => Some(import),
            _ => None,
        }
    }
}

/// `command { ... }`: ordered argument tokens, the first being the base command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLine {
    pub args: Vec<CommandArg>,
}

/// A single command-line token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandArg {
    /// Bare symbol word, e.g. `-n` or `wc`
    Word(String),
    /// Single-quoted literal with the quotes removed
    Quoted(String),
    /// `${name}` reference to a declared input
    Variable(String),
}

impl fmt::Display for CommandArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandArg::Word(word) => f.write_str(word),
            CommandArg::Quoted(text) => f.write_str(text),
            CommandArg::Variable(name) => write!(f, "${{{}}}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSet {
    pub inputs: Vec<InputDeclare>,
}

/// `<Type> <name>` inside an input block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDeclare {
    pub name: String,
    pub decl_type: TypeSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSet {
    pub outputs: Vec<OutputDeclare>,
}

/// `<type> <name> = <function>(...)` inside an output block.
///
/// Parsed only; outputs are never lowered into the descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDeclare {
    pub name: String,
    pub output_type: String,
    pub expr: FunctionCall,
}

/// A (possibly nested) function call such as `glob(pattern)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arg: Option<FunctionArg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FunctionArg {
    Call(Box<FunctionCall>),
    Word(String),
    Quoted(String),
}

/// `import <path>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub path: String,
}

/// A workflow: an ordered list of task calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub calls: Vec<TaskCall>,
}

/// `call <task> [{ input: name = value }]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCall {
    pub task: String,
    /// Call-site input declarations. Parsed, but not applied to the called task.
    pub inputs: Vec<Declaration>,
}

/// `name = value` inside a call's input clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}
