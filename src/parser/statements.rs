//! Workflow blocks and call statements

use super::lexer::{bs, keyword, newlines, optbs, quote_word, symbol_word, word, ws};
use super::{PResult, Span};
use crate::tree::{Declaration, TaskCall, Workflow};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{cut, map, opt},
    multi::{separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, separated_pair, tuple},
};

/// `name = value`
pub fn declaration(input: Span) -> PResult<Declaration> {
    map(
        separated_pair(
            word,
            tuple((optbs, char('='), optbs)),
            alt((quote_word, symbol_word)),
        ),
        |(name, value)| Declaration { name, value },
    )(input)
}

/// `{ input: name = value, ... }`
fn call_inputs(input: Span) -> PResult<Vec<Declaration>> {
    delimited(
        tuple((char('{'), ws, tag("input:"), optbs)),
        separated_list1(tuple((optbs, char(','), ws)), declaration),
        pair(ws, char('}')),
    )(input)
}

/// `call <task> [{ input: ... }]`
pub fn task_call(input: Span) -> PResult<TaskCall> {
    let (input, _) = pair(keyword("call"), bs)(input)?;
    let (input, task) = word(input)?;
    let (input, inputs) = opt(preceded(ws, call_inputs))(input)?;
    Ok((
        input,
        TaskCall {
            task,
            inputs: inputs.unwrap_or_default(),
        },
    ))
}

/// `workflow <name> { <call> (newlines <call>)* }`
pub fn workflow_block(input: Span) -> PResult<Workflow> {
    let (input, _) = pair(keyword("workflow"), bs)(input)?;
    let (input, name) = word(input)?;
    let (input, calls) = cut(delimited(
        tuple((optbs, char('{'), ws)),
        separated_list0(newlines, preceded(optbs, task_call)),
        pair(ws, char('}')),
    ))(input)?;
    Ok((input, Workflow { name, calls }))
}
