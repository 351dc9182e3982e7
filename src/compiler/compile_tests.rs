//! Lowering tests: tasks, workflows, and import resolution through an
//! in-memory loader.

use super::imports::ImportLoader;
use super::Compiler;
use crate::descriptor::{CommandLineBinding, Descriptor, InputBinding, ToolDescriptor};
use crate::error::CwilError;
use crate::parser;
use crate::types::TypeSpec;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Serves imports from a fixed map of path -> source
#[derive(Default)]
struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    fn with(mut self, path: &str, source: &str) -> Self {
        self.files.insert(PathBuf::from("/work").join(path), source.to_string());
        self
    }
}

impl ImportLoader for MemoryLoader {
    fn resolve(&self, path: &str) -> PathBuf {
        PathBuf::from("/work").join(path)
    }

    fn load(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

fn compile_with(loader: MemoryLoader, source: &str) -> Result<Descriptor, CwilError> {
    Compiler::with_loader(loader).compile_source(source)
}

fn compile_tool(source: &str) -> ToolDescriptor {
    match compile_with(MemoryLoader::default(), source).unwrap() {
        Descriptor::Tool(tool) => tool,
        other => panic!("expected a tool, got {:?}", other),
    }
}

#[test]
fn test_echo_task() {
    let tool = compile_tool("task echo {\n  input { File message }\n  command { echo ${message} }\n}");
    assert_eq!(tool.id, "echo");
    assert_eq!(tool.base_command, vec!["echo"]);
    assert_eq!(
        tool.inputs,
        vec![InputBinding::new("message", TypeSpec::file()).with_binding(CommandLineBinding::at(0))]
    );
    assert!(tool.arguments.is_empty());
    assert!(tool.outputs.is_empty());
}

#[test]
fn test_positions_count_literal_tokens() {
    let tool = compile_tool(
        "task cat {\n  input {\n    File second\n    File first\n    Boolean unused\n  }\n  command { cat ${first} -n ${second} }\n}",
    );
    assert_eq!(tool.base_command, vec!["cat"]);

    let ids: Vec<&str> = tool.inputs.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["second", "first", "unused"]);
    assert_eq!(tool.input("first").unwrap().position(), Some(0));
    assert_eq!(tool.input("second").unwrap().position(), Some(2));
    assert!(tool.input("unused").unwrap().binding.is_none());
}

#[test]
fn test_literal_tokens_produce_no_binding() {
    let tool = compile_tool("task ls {\n  command { ls -l 'my dir' }\n}");
    assert_eq!(tool.base_command, vec!["ls"]);
    assert!(tool.arguments.is_empty());
    assert!(tool.inputs.is_empty());
}

#[test]
fn test_outputs_are_not_lowered() {
    let tool = compile_tool(
        "task wc {\n  input { File reads }\n  command { wc ${reads} }\n  output {\n    File counts = glob('*.txt')\n  }\n}",
    );
    assert!(tool.outputs.is_empty());
    assert_eq!(tool.to_value()["outputs"], serde_json::json!([]));
}

#[test]
fn test_unknown_input() {
    let err = compile_with(
        MemoryLoader::default(),
        "task echo {\n  input { File message }\n  command { echo ${mesage} }\n}",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CwilError::UnknownInput { ref task, ref name } if task == "echo" && name == "mesage"
    ));
}

#[test]
fn test_unknown_input_without_input_block() {
    let err = compile_with(MemoryLoader::default(), "task echo {\n  command { echo ${x} }\n}")
        .unwrap_err();
    assert!(matches!(err, CwilError::UnknownInput { .. }));
}

#[test]
fn test_duplicate_input_block() {
    let err = compile_with(
        MemoryLoader::default(),
        "task twice {\n  input { File a }\n  input { File b }\n  command { cat ${a} }\n}",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CwilError::DuplicatePart { ref task, ref part } if task == "twice" && part == "input"
    ));
}

#[test]
fn test_workflow_steps_in_call_order() {
    let source = "task first {\n  command { date }\n}\n\ntask second {\n  input { Int n }\n  command { seq ${n} }\n}\n\nworkflow main {\n  call second\n  call first\n  call second\n}";
    let descriptor = compile_with(MemoryLoader::default(), source).unwrap();
    let Descriptor::Workflow(workflow) = descriptor else {
        panic!("expected a workflow");
    };
    assert_eq!(workflow.id, "main");
    let ids: Vec<&str> = workflow.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["second", "first", "second"]);
    assert_eq!(workflow.steps[0].input("n").unwrap().position(), Some(0));
}

#[test]
fn test_last_workflow_is_compiled() {
    let source = "task a {\n  command { date }\n}\ntask b {\n  command { uptime }\n}\nworkflow w1 {\n  call a\n}\nworkflow w2 {\n  call b\n}";
    let descriptor = compile_with(MemoryLoader::default(), source).unwrap();
    let Descriptor::Workflow(workflow) = descriptor else {
        panic!("expected a workflow");
    };
    assert_eq!(workflow.id, "w2");
    let ids: Vec<&str> = workflow.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
}

#[test]
fn test_workflow_with_unresolved_task() {
    let source = "task first {\n  command { date }\n}\nworkflow main {\n  call first\n  call missing\n}";
    let err = compile_with(MemoryLoader::default(), source).unwrap_err();
    assert!(matches!(
        err,
        CwilError::UnresolvedTask { ref workflow, ref name } if workflow == "main" && name == "missing"
    ));
}

#[test]
fn test_call_site_inputs_are_not_applied() {
    let source = "task seq {\n  input { Int n }\n  command { seq ${n} }\n}\nworkflow main {\n  call seq {\n    input: n = 5\n  }\n}";
    let document = parser::parse_document(source).unwrap();
    let call_inputs = &document.workflows().next().unwrap().calls[0].inputs;
    assert_eq!(call_inputs.len(), 1);

    let compiler = Compiler::with_loader(MemoryLoader::default());
    let Descriptor::Workflow(workflow) = compiler.compile(&document).unwrap() else {
        panic!("expected a workflow");
    };
    let standalone = compiler.compile_task(&document, "seq").unwrap();
    assert_eq!(workflow.steps[0], standalone);
}

#[test]
fn test_import_fills_unset_fields() {
    let loader = MemoryLoader::default().with(
        "lib/echo.cwil",
        "task shared {\n  input { File message }\n  command { echo ${message} }\n}",
    );
    let Descriptor::Tool(tool) = compile_with(loader, "task local {\n  import lib/echo.cwil\n}").unwrap() else {
        panic!("expected a tool");
    };
    assert_eq!(tool.id, "local");
    assert_eq!(tool.base_command, vec!["echo"]);
    assert_eq!(tool.input("message").unwrap().position(), Some(0));
}

#[test]
fn test_importing_task_fields_take_precedence() {
    let loader = MemoryLoader::default().with(
        "echo.cwil",
        "task shared {\n  input { File message }\n  command { echo ${message} }\n}",
    );
    let source = "task local {\n  import echo.cwil\n  command { printf 'hello' }\n}";
    let Descriptor::Tool(tool) = compile_with(loader, source).unwrap() else {
        panic!("expected a tool");
    };
    assert_eq!(tool.base_command, vec!["printf"]);
    assert_eq!(tool.inputs.len(), 1);
}

#[test]
fn test_nested_imports() {
    let loader = MemoryLoader::default()
        .with("a.cwil", "task a {\n  import b.cwil\n}")
        .with("b.cwil", "task b {\n  command { true }\n}");
    let descriptor = compile_with(loader, "task top {\n  import a.cwil\n}").unwrap();
    assert_eq!(descriptor.as_tool().unwrap().base_command, vec!["true"]);
}

#[test]
fn test_cyclic_import() {
    let loader = MemoryLoader::default()
        .with("a.cwil", "task a {\n  import b.cwil\n}")
        .with("b.cwil", "task b {\n  import a.cwil\n}");
    let err = compile_with(loader, "task top {\n  import a.cwil\n}").unwrap_err();
    assert!(matches!(
        err,
        CwilError::CyclicImport { ref path } if path == Path::new("/work/a.cwil")
    ));
}

#[test]
fn test_self_import_is_cyclic() {
    let loader = MemoryLoader::default().with("self.cwil", "task s {\n  import self.cwil\n}");
    let err = compile_with(loader, "task top {\n  import self.cwil\n}").unwrap_err();
    assert!(matches!(err, CwilError::CyclicImport { .. }));
}

#[test]
fn test_repeated_non_cyclic_import() {
    let loader = MemoryLoader::default().with("tool.cwil", "task tool {\n  command { true }\n}");
    let source = "task one {\n  import tool.cwil\n}\ntask two {\n  import tool.cwil\n}";
    let document = parser::parse_document(source).unwrap();
    let descriptors = Compiler::with_loader(loader).compile_all(&document).unwrap();
    assert_eq!(descriptors.len(), 2);
}

#[test]
fn test_missing_import() {
    let err = compile_with(MemoryLoader::default(), "task top {\n  import nowhere.cwil\n}").unwrap_err();
    assert!(matches!(
        err,
        CwilError::ImportIo { ref path, .. } if path == Path::new("/work/nowhere.cwil")
    ));
}

#[test]
fn test_import_with_syntax_error() {
    let loader = MemoryLoader::default().with("bad.cwil", "task {\n}");
    let err = compile_with(loader, "task top {\n  import bad.cwil\n}").unwrap_err();
    match err {
        CwilError::Parse { pos, .. } => assert_eq!(pos.uri, "/work/bad.cwil"),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_compile_all() {
    let source = "task a {\n  command { true }\n}\ntask b {\n  command { false }\n}\nworkflow w {\n  call b\n}";
    let document = parser::parse_document(source).unwrap();
    let descriptors = Compiler::with_loader(MemoryLoader::default())
        .compile_all(&document)
        .unwrap();
    let ids: Vec<&str> = descriptors.iter().map(Descriptor::id).collect();
    assert_eq!(ids, vec!["a", "b", "w"]);
}
