//! Lowering of parsed documents into tool and workflow descriptors
//!
//! Per task, the input block becomes an ordered list of typed inputs and the
//! command block becomes the base command plus input positions: every
//! `${name}` token after the base command records its 0-based ordinal among
//! the argument tokens as that input's position.
//!
//! Known gaps, kept deliberately:
//! - literal command-line tokens after the base command produce no binding
//! - output declarations are parsed but never lowered; `outputs` stays empty
//! - call-site `input:` declarations in workflows are parsed but not applied

pub mod imports;

use crate::descriptor::{CommandLineBinding, Descriptor, InputBinding, ToolDescriptor, WorkflowDescriptor};
use crate::error::{CwilError, Result};
use crate::parser;
use crate::tree::{CommandArg, Document, Import, Task, Workflow};
use imports::{FsLoader, ImportLoader, ImportStack};
use indexmap::IndexMap;

/// Compiles CWIL documents. Import resolution goes through `L`.
#[derive(Debug, Clone)]
pub struct Compiler<L = FsLoader> {
    loader: L,
}

impl Compiler<FsLoader> {
    /// A compiler resolving imports against the current working directory.
    pub fn new() -> Self {
        Self::with_loader(FsLoader::current_dir())
    }
}

impl Default for Compiler<FsLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ImportLoader> Compiler<L> {
    pub fn with_loader(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Parse and compile document text.
    pub fn compile_source(&self, source: &str) -> Result<Descriptor> {
        let document = parser::parse_document(source)?;
        self.compile(&document)
    }

    /// Compile a document: its last workflow if it declares any, otherwise
    /// its first task.
    pub fn compile(&self, document: &Document) -> Result<Descriptor> {
        self.lower_document(document, &mut ImportStack::default())
    }

    /// Compile every task and workflow of a document in declaration order.
    pub fn compile_all(&self, document: &Document) -> Result<Vec<Descriptor>> {
        let mut stack = ImportStack::default();
        let mut descriptors = Vec::new();
        for task in document.tasks() {
            descriptors.push(Descriptor::Tool(self.lower_task(task, &mut stack)?));
        }
        for workflow in document.workflows() {
            descriptors.push(Descriptor::Workflow(
                self.lower_workflow(document, workflow, &mut stack)?,
            ));
        }
        Ok(descriptors)
    }

    /// Compile one named task of a document.
    pub fn compile_task(&self, document: &Document, name: &str) -> Result<ToolDescriptor> {
        let task = document
            .get_task(name)
            .ok_or_else(|| CwilError::UnresolvedTask {
                workflow: String::new(),
                name: name.to_string(),
            })?;
        self.lower_task(task, &mut ImportStack::default())
    }

    fn lower_document(&self, document: &Document, stack: &mut ImportStack) -> Result<Descriptor> {
        if let Some(workflow) = document.workflows().last() {
            return self
                .lower_workflow(document, workflow, stack)
                .map(Descriptor::Workflow);
        }
        match document.tasks().next() {
            Some(task) => self.lower_task(task, stack).map(Descriptor::Tool),
            None => Err(CwilError::invalid_descriptor("document declares no task or workflow")),
        }
    }

    fn lower_workflow(
        &self,
        document: &Document,
        workflow: &Workflow,
        stack: &mut ImportStack,
    ) -> Result<WorkflowDescriptor> {
        let mut steps = Vec::with_capacity(workflow.calls.len());
        for call in &workflow.calls {
            let task = document
                .get_task(&call.task)
                .ok_or_else(|| CwilError::UnresolvedTask {
                    workflow: workflow.name.clone(),
                    name: call.task.clone(),
                })?;
            if !call.inputs.is_empty() {
                tracing::debug!(
                    workflow = %workflow.name,
                    task = %call.task,
                    count = call.inputs.len(),
                    "call-site inputs are not applied to the called task"
                );
            }
            steps.push(self.lower_task(task, stack)?);
        }
        Ok(WorkflowDescriptor {
            id: workflow.name.clone(),
            steps,
        })
    }

    fn lower_task(&self, task: &Task, stack: &mut ImportStack) -> Result<ToolDescriptor> {
        tracing::debug!(task = %task.name, "lowering task");

        let mut inputs: IndexMap<&str, InputBinding> = IndexMap::new();
        if let Some(input_set) = task.input_set() {
            for decl in &input_set.inputs {
                inputs.insert(
                    decl.name.as_str(),
                    InputBinding::new(decl.name.clone(), decl.decl_type.clone()),
                );
            }
        }

        let mut base_command = Vec::new();
        if let Some(command) = task.command_line() {
            let mut args = command.args.iter();
            if let Some(first) = args.next() {
                if let CommandArg::Variable(name) = first {
                    check_declared(task, &inputs, name)?;
                }
                base_command.push(first.to_string());
            }
            for (position, arg) in args.enumerate() {
                if let CommandArg::Variable(name) = arg {
                    check_declared(task, &inputs, name)?;
                    if let Some(input) = inputs.get_mut(name.as_str()) {
                        input.binding = Some(CommandLineBinding::at(position as i64));
                    }
                }
            }
        }

        let mut descriptor = ToolDescriptor {
            id: task.name.clone(),
            base_command,
            inputs: inputs.into_values().collect(),
            ..Default::default()
        };

        if let Some(import) = task.import() {
            let imported = self.resolve_import(import, stack)?;
            descriptor.merge_from(imported);
        }
        Ok(descriptor)
    }

    /// Compile an imported document and return its tool descriptor.
    fn resolve_import(&self, import: &Import, stack: &mut ImportStack) -> Result<ToolDescriptor> {
        let path = self.loader.resolve(&import.path);
        stack.enter(path.clone())?;
        tracing::info!(path = %path.display(), depth = stack.depth(), "importing");

        let result = self
            .loader
            .load(&path)
            .map_err(|e| CwilError::import_io(path.clone(), e))
            .and_then(|source| {
                let filename = path.display().to_string();
                parser::parse_document_with_filename(&source, &filename)
            })
            .and_then(|document| self.lower_document(&document, stack));
        stack.leave();

        match result? {
            Descriptor::Tool(tool) => Ok(tool),
            Descriptor::Workflow(_) => Err(CwilError::ImportIo {
                path,
                message: "imported document describes a workflow, not a tool".to_string(),
                cause: None,
            }),
        }
    }
}

fn check_declared(task: &Task, inputs: &IndexMap<&str, InputBinding>, name: &str) -> Result<()> {
    if inputs.contains_key(name) {
        Ok(())
    } else {
        Err(CwilError::UnknownInput {
            task: task.name.clone(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod compile_tests;
