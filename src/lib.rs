//! # cwil
//!
//! Compiler and command-line binder for CWIL, a small workflow description
//! language.
//!
//! The pipeline has two stages:
//! 1. [`compile`]: DSL text → [`Descriptor`] (a CommandLineTool-shaped tool
//!    descriptor per task, or a workflow of such steps)
//! 2. [`bind`]: [`ToolDescriptor`] + value tree → [`BoundCommand`]
//!    (argument vector plus stdin/stdout)
//!
//! ```
//! use serde_json::json;
//!
//! let descriptor = cwil::compile("task echo {\n  input { File message }\n  command { echo ${message} }\n}")?;
//! let tool = descriptor.as_tool().unwrap();
//! let bound = cwil::bind(tool, &json!({"message": {"path": "/tmp/x"}}))?;
//! assert_eq!(bound.args, vec!["echo", "/tmp/x"]);
//! # Ok::<(), cwil::CwilError>(())
//! ```

pub mod binder;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod inputs;
pub mod parser;
pub mod tree;
pub mod types;

pub use binder::{Binder, BoundCommand};
pub use compiler::Compiler;
pub use config::Config;
pub use descriptor::{
    ArgumentBinding, CommandLineBinding, Descriptor, InputBinding, ToolDescriptor,
    WorkflowDescriptor,
};
pub use error::{CwilError, Result, SourcePosition};
pub use tree::{Document, Task, Workflow};
pub use types::{ScalarType, TypeSpec};

/// Compile CWIL source text, resolving imports against the current
/// working directory.
pub fn compile(source: &str) -> Result<Descriptor> {
    Compiler::new().compile_source(source)
}

/// Bind a tool descriptor against a value tree with the default runtime.
pub fn bind(tool: &ToolDescriptor, values: &serde_json::Value) -> Result<BoundCommand> {
    Binder::default().bind(tool, values)
}
