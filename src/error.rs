//! Error types and source position tracking for CWIL compilation and binding.
//!
//! Every failure is terminal for the operation in which it occurs: compiling
//! or binding aborts with the offending identifier or path attached, and no
//! partial descriptor or token vector is returned alongside the error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CwilError>;

/// Source position of a parse failure.
///
/// Line and column are one-based.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// The filename passed to the parser, empty for anonymous text
    pub uri: String,
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(uri: String, line: u32, column: u32) -> Self {
        Self { uri, line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.uri.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.uri, self.line, self.column)
        }
    }
}

/// Main error type for all CWIL errors.
#[derive(Error, Debug)]
pub enum CwilError {
    /// Document text does not match the grammar
    #[error("Syntax error at {pos}: {message} (near {remainder:?})")]
    Parse {
        pos: SourcePosition,
        message: String,
        /// First line of the unconsumed input
        remainder: String,
    },

    /// A task declares the same block kind twice
    #[error("Task {task}: {part} block previously declared")]
    DuplicatePart { task: String, part: String },

    /// Two tasks share a name within one document
    #[error("Multiple definitions of task {name}")]
    DuplicateTask { name: String },

    /// A command-line variable names an undeclared input
    #[error("Task {task}: unknown input ${{{name}}}")]
    UnknownInput { task: String, name: String },

    /// A workflow calls a task that is not declared in the document
    #[error("Workflow {workflow}: no such task {name}")]
    UnresolvedTask { workflow: String, name: String },

    /// An import chain revisits a path it is already importing
    #[error("Cyclic import of {}", path.display())]
    CyclicImport { path: PathBuf },

    /// An imported document could not be read or used
    #[error("Failed to import {}: {message}", path.display())]
    ImportIo {
        path: PathBuf,
        message: String,
        #[source]
        cause: Option<std::io::Error>,
    },

    /// A required input is absent from the value tree
    #[error("Missing required input {name}")]
    MissingRequiredInput { name: String },

    /// A type shape the binder cannot format
    #[error("Unsupported type for {name}: {message}")]
    UnsupportedType { name: String, message: String },

    /// A value does not fit its declared type
    #[error("Invalid value for {name}: expected {expected}")]
    InvalidValue { name: String, expected: String },

    /// An embedded expression outside the supported vocabulary
    #[error("Unsupported expression: {expression}")]
    UnsupportedExpression { expression: String },

    /// A descriptor tree that does not have the interchange shape
    #[error("Invalid descriptor: {message}")]
    InvalidDescriptor { message: String },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error reading a document, descriptor or input file
    #[error("Input error: {message}")]
    Input { message: String },
}

impl CwilError {
    /// Create a parse error from a position and the unconsumed input.
    pub fn parse_error(pos: SourcePosition, message: impl Into<String>, rest: &str) -> Self {
        let remainder = rest.lines().next().unwrap_or_default().trim().to_string();
        CwilError::Parse {
            pos,
            message: message.into(),
            remainder,
        }
    }

    /// Create an import error wrapping an I/O failure.
    pub fn import_io(path: PathBuf, cause: std::io::Error) -> Self {
        CwilError::ImportIo {
            path,
            message: cause.to_string(),
            cause: Some(cause),
        }
    }

    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        CwilError::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Get the source position for this error, if available.
    pub fn source_position(&self) -> Option<&SourcePosition> {
        match self {
            CwilError::Parse { pos, .. } => Some(pos),
            _ => None,
        }
    }
}
