//! Token classes and whitespace rules shared by the CWIL grammar

use super::{PResult, Span};
use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, line_ending, multispace0, satisfy, space0, space1},
    combinator::{map, not, value},
    multi::many1_count,
    sequence::{delimited, preceded, terminated},
};

/// `\w`: letters, digits and underscore
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn is_symbol_char(c: char) -> bool {
    is_word_char(c) || matches!(c, '-' | '|' | '.')
}

pub fn is_path_char(c: char) -> bool {
    is_symbol_char(c) || c == '/'
}

/// Parse a word (`\w+`)
pub fn word(input: Span) -> PResult<String> {
    map(take_while1(is_word_char), |s: Span| s.fragment().to_string())(input)
}

/// Parse a symbol word (`[\w\-|.]+`)
pub fn symbol_word(input: Span) -> PResult<String> {
    map(take_while1(is_symbol_char), |s: Span| s.fragment().to_string())(input)
}

/// Parse a path word (`[\w\-/|.]+`)
pub fn path_word(input: Span) -> PResult<String> {
    map(take_while1(is_path_char), |s: Span| s.fragment().to_string())(input)
}

/// Parse a single-quoted literal, returning its content without quotes
pub fn quote_word(input: Span) -> PResult<String> {
    map(
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        |s: Span| s.fragment().to_string(),
    )(input)
}

/// Parse a keyword that is not immediately followed by another word character
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, Span<'a>> {
    terminated(tag(kw), not(satisfy(is_word_char)))
}

/// One or more spaces or tabs
pub fn bs(input: Span) -> PResult<()> {
    value((), space1)(input)
}

/// Zero or more spaces or tabs
pub fn optbs(input: Span) -> PResult<()> {
    value((), space0)(input)
}

/// Any whitespace, including newlines
pub fn ws(input: Span) -> PResult<()> {
    value((), multispace0)(input)
}

/// One or more line breaks; blank and whitespace-only lines collapse
pub fn newlines(input: Span) -> PResult<()> {
    value((), many1_count(preceded(space0, line_ending)))(input)
}
