//! Task blocks: `task <name> { <parts> }` and the command line grammar

use super::declarations::{input_block, output_block};
use super::lexer::{bs, keyword, newlines, optbs, path_word, quote_word, symbol_word, word, ws};
use super::{PResult, Span};
use crate::tree::{CommandArg, CommandLine, Import, TaskPart};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{cut, map},
    multi::separated_list0,
    multi::separated_list1,
    sequence::{delimited, pair, preceded, tuple},
};

/// A task as written, before block kinds are checked for duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSyntax {
    pub name: String,
    pub parts: Vec<TaskPart>,
}

/// `${name}`
pub fn variable(input: Span) -> PResult<String> {
    delimited(tag("${"), delimited(optbs, word, optbs), char('}'))(input)
}

pub fn command_arg(input: Span) -> PResult<CommandArg> {
    alt((
        map(variable, CommandArg::Variable),
        map(quote_word, CommandArg::Quoted),
        map(symbol_word, CommandArg::Word),
    ))(input)
}

/// `command { <tokens> }`
pub fn command_block(input: Span) -> PResult<CommandLine> {
    map(
        preceded(
            pair(keyword("command"), optbs),
            delimited(
                pair(char('{'), ws),
                separated_list1(bs, command_arg),
                pair(ws, char('}')),
            ),
        ),
        |args| CommandLine { args },
    )(input)
}

/// `import <path>`
pub fn import_block(input: Span) -> PResult<Import> {
    map(preceded(pair(keyword("import"), bs), path_word), |path| {
        Import { path }
    })(input)
}

pub fn task_part(input: Span) -> PResult<TaskPart> {
    alt((
        map(command_block, TaskPart::CommandLine),
        map(input_block, TaskPart::InputSet),
        map(output_block, TaskPart::OutputSet),
        map(import_block, TaskPart::Import),
    ))(input)
}

/// `task <name> { <part> (newlines <part>)* }`
///
/// Once `task <name>` has matched, any failure inside the body is final.
pub fn task_block(input: Span) -> PResult<TaskSyntax> {
    let (input, _) = pair(keyword("task"), bs)(input)?;
    let (input, name) = word(input)?;
    let (input, parts) = cut(delimited(
        tuple((optbs, char('{'), ws)),
        separated_list0(newlines, preceded(optbs, task_part)),
        pair(ws, char('}')),
    ))(input)?;
    Ok((input, TaskSyntax { name, parts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::PartKind;

    #[test]
    fn test_command_args() {
        let (_, command) =
            command_block(Span::new("command { wc -l ${ reads } 'a b' |  sort.py }")).unwrap();
        assert_eq!(
            command.args,
            vec![
                CommandArg::Word("wc".to_string()),
                CommandArg::Word("-l".to_string()),
                CommandArg::Variable("reads".to_string()),
                CommandArg::Quoted("a b".to_string()),
                CommandArg::Word("|".to_string()),
                CommandArg::Word("sort.py".to_string()),
            ]
        );
    }

    #[test]
    fn test_command_block_spanning_lines() {
        let (_, command) = command_block(Span::new("command {\n    echo ${message}\n  }")).unwrap();
        assert_eq!(command.args.len(), 2);
    }

    #[test]
    fn test_import_block() {
        let (remaining, import) = import_block(Span::new("import tools/echo.cwil\n")).unwrap();
        assert_eq!(import.path, "tools/echo.cwil");
        assert_eq!(*remaining.fragment(), "\n");
    }

    #[test]
    fn test_task_block_parts_in_order() {
        let source = "task count {\n  input {\n    File reads\n  }\n\n  command { wc -l ${reads} }\n}";
        let (_, task) = task_block(Span::new(source)).unwrap();
        assert_eq!(task.name, "count");
        let kinds: Vec<PartKind> = task.parts.iter().map(TaskPart::kind).collect();
        assert_eq!(kinds, vec![PartKind::InputSet, PartKind::CommandLine]);
    }

    #[test]
    fn test_task_body_failure_is_not_recoverable() {
        let result = task_block(Span::new("task broken {\n  command { echo $x }\n}"));
        assert!(matches!(result, Err(nom::Err::Failure(_))));
    }
}
