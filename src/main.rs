//! cwil CLI
//!
//! Compiles CWIL documents to descriptors and binds descriptors against input
//! values. The constructed command line is printed, never executed.

use clap::{Parser, Subcommand};
use cwil::compiler::imports::FsLoader;
use cwil::inputs::resolve_file_paths;
use cwil::{Binder, Compiler, Config, CwilError, Descriptor, ToolDescriptor};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "cwil")]
#[command(about = "Compile CWIL documents and bind tool descriptors into command lines")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./cwil.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a CWIL document and print its descriptor as JSON
    Compile {
        /// CWIL document
        document: PathBuf,

        /// Compile only this task
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Bind a JSON tool descriptor against JSON inputs
    Bind {
        /// Descriptor file (CommandLineTool shape)
        descriptor: PathBuf,

        /// Input values
        inputs: PathBuf,

        /// Directory relative file paths in the inputs are resolved against
        /// (defaults to the inputs file's directory)
        #[arg(long)]
        basedir: Option<PathBuf>,
    },

    /// Compile a CWIL document and bind one of its tasks against JSON inputs
    Run {
        /// CWIL document
        document: PathBuf,

        /// Input values
        inputs: PathBuf,

        /// Task to bind (defaults to the document's first task)
        #[arg(short, long)]
        task: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CwilError> {
    let config = Config::load(cli.config.as_deref())?;
    let loader = match &config.imports.base_dir {
        Some(dir) => FsLoader::new(dir),
        None => FsLoader::current_dir(),
    };
    let compiler = Compiler::with_loader(loader);
    let binder = Binder::new(config.runtime.clone());

    match cli.command {
        Commands::Compile { document, task } => {
            let source = read_file(&document)?;
            let filename = document.display().to_string();
            let parsed = cwil::parser::parse_document_with_filename(&source, &filename)?;
            let descriptor = match task {
                Some(name) => Descriptor::Tool(compiler.compile_task(&parsed, &name)?),
                None => compiler.compile(&parsed)?,
            };
            print_json(&descriptor.to_value())
        }
        Commands::Bind {
            descriptor,
            inputs,
            basedir,
        } => {
            let tool = ToolDescriptor::from_value(&read_json(&descriptor)?)?;
            let values = read_inputs(&inputs, basedir.as_deref())?;
            let bound = binder.bind(&tool, &values)?;
            let value = serde_json::to_value(&bound).map_err(|e| CwilError::Input {
                message: format!("Failed to serialize output: {}", e),
            })?;
            print_json(&value)
        }
        Commands::Run {
            document,
            inputs,
            task,
        } => {
            let source = read_file(&document)?;
            let filename = document.display().to_string();
            let parsed = cwil::parser::parse_document_with_filename(&source, &filename)?;
            let name = match task.or_else(|| parsed.tasks().next().map(|t| t.name.clone())) {
                Some(name) => name,
                None => {
                    return Err(CwilError::invalid_descriptor(format!(
                        "{} declares no task",
                        filename
                    )))
                }
            };
            let tool = compiler.compile_task(&parsed, &name)?;
            let values = read_inputs(&inputs, None)?;
            let bound = binder.bind(&tool, &values)?;
            println!("{}", bound.args.join(" "));
            Ok(())
        }
    }
}

fn read_file(path: &Path) -> Result<String, CwilError> {
    fs::read_to_string(path).map_err(|e| CwilError::Input {
        message: format!("Failed to read {}: {}", path.display(), e),
    })
}

fn read_json(path: &Path) -> Result<Value, CwilError> {
    serde_json::from_str(&read_file(path)?).map_err(|e| CwilError::Input {
        message: format!("Failed to parse {} as JSON: {}", path.display(), e),
    })
}

fn read_inputs(path: &Path, basedir: Option<&Path>) -> Result<Value, CwilError> {
    let mut values = read_json(path)?;
    let base = match basedir {
        Some(dir) => dir.to_path_buf(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    resolve_file_paths(&mut values, &base);
    Ok(values)
}

fn print_json(value: &Value) -> Result<(), CwilError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CwilError::Input {
        message: format!("Failed to serialize output: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}
