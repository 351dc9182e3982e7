//! CWIL parser implementation using nom
//!
//! The grammar is a set of stateless combinator functions over a located
//! span, so failures can report line and column. Parsing is all-or-nothing:
//! a malformed document never yields a partial AST.

pub mod declarations;
pub mod document;
pub mod lexer;
pub mod statements;
pub mod tasks;

use crate::error::Result;
use crate::tree::Document;
use nom::IResult;
use nom_locate::LocatedSpan;

pub type Span<'a> = LocatedSpan<&'a str>;

pub type PResult<'a, T> = IResult<Span<'a>, T>;

/// Parse a CWIL document from source text
pub fn parse_document(source: &str) -> Result<Document> {
    document::parse_document_with_filename(source, "")
}

/// Parse a CWIL document from source text with filename for better error reporting
pub fn parse_document_with_filename(source: &str, filename: &str) -> Result<Document> {
    document::parse_document_with_filename(source, filename)
}
