//! Top-level document parsing and conversion of grammar failures

use super::lexer::ws;
use super::statements::workflow_block;
use super::tasks::{task_block, TaskSyntax};
use super::{PResult, Span};
use crate::error::{CwilError, Result, SourcePosition};
use crate::tree::{Document, Statement, Task, Workflow};
use nom::{
    branch::alt,
    combinator::map,
    multi::many1,
    sequence::{preceded, terminated},
};

enum StatementSyntax {
    Task(TaskSyntax),
    Workflow(Workflow),
}

fn statement(input: Span) -> PResult<StatementSyntax> {
    alt((
        map(task_block, StatementSyntax::Task),
        map(workflow_block, StatementSyntax::Workflow),
    ))(input)
}

fn statements(input: Span) -> PResult<Vec<StatementSyntax>> {
    terminated(many1(preceded(ws, statement)), ws)(input)
}

/// Parse a complete document. Either the whole text matches, or the
/// error carries the position and remainder where matching stopped.
pub fn parse_document_with_filename(source: &str, filename: &str) -> Result<Document> {
    let input = Span::new(source);
    let parsed = match statements(input) {
        Ok((remaining, parsed)) if remaining.fragment().is_empty() => parsed,
        Ok((remaining, _)) => {
            return Err(syntax_error(
                remaining,
                filename,
                "expected a task or workflow".to_string(),
            ))
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let message = format!("unexpected input ({})", e.code.description());
            return Err(syntax_error(e.input, filename, message));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(syntax_error(
                input,
                filename,
                "unexpected end of input".to_string(),
            ))
        }
    };

    let statements = parsed
        .into_iter()
        .map(|statement| match statement {
            StatementSyntax::Task(task) => Task::new(task.name, task.parts).map(Statement::Task),
            StatementSyntax::Workflow(workflow) => Ok(Statement::Workflow(workflow)),
        })
        .collect::<Result<Vec<_>>>()?;
    Document::new(statements)
}

fn syntax_error(at: Span, filename: &str, message: String) -> CwilError {
    let pos = SourcePosition::new(
        filename.to_string(),
        at.location_line(),
        at.get_utf8_column() as u32,
    );
    CwilError::parse_error(pos, message, at.fragment())
}
