//! Input and output declarations, type syntax and output function calls

use super::lexer::{bs, keyword, newlines, optbs, quote_word, symbol_word, word, ws};
use super::{PResult, Span};
use crate::tree::{FunctionArg, FunctionCall, InputDeclare, InputSet, OutputDeclare, OutputSet};
use crate::types::{ScalarType, TypeSpec};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{map, opt, value},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, tuple},
};

/// Parse a type: `File`, `Int`, `Boolean`, `Array[T]`, each optionally
/// followed by `?`.
pub fn type_spec(input: Span) -> PResult<TypeSpec> {
    let (input, base) = alt((array_type, map(scalar_type, TypeSpec::Scalar)))(input)?;
    let (input, optional) = opt(char('?'))(input)?;
    let spec = match optional {
        Some(_) => TypeSpec::optional(base),
        None => base,
    };
    Ok((input, spec))
}

fn scalar_type(input: Span) -> PResult<ScalarType> {
    alt((
        value(ScalarType::File, keyword("File")),
        value(ScalarType::Int, alt((keyword("Int"), keyword("int")))),
        value(
            ScalarType::Boolean,
            alt((keyword("Boolean"), keyword("boolean"))),
        ),
    ))(input)
}

fn array_type(input: Span) -> PResult<TypeSpec> {
    map(
        delimited(
            pair(keyword("Array"), char('[')),
            delimited(optbs, type_spec, optbs),
            char(']'),
        ),
        TypeSpec::array,
    )(input)
}

/// `<Type> <name>`
pub fn input_declare(input: Span) -> PResult<InputDeclare> {
    map(tuple((type_spec, bs, word)), |(decl_type, _, name)| InputDeclare {
        name,
        decl_type,
    })(input)
}

/// `input { <declarations> }`
pub fn input_block(input: Span) -> PResult<InputSet> {
    map(
        preceded(
            pair(keyword("input"), optbs),
            delimited(
                pair(char('{'), ws),
                separated_list1(newlines, preceded(optbs, input_declare)),
                pair(ws, char('}')),
            ),
        ),
        |inputs| InputSet { inputs },
    )(input)
}

/// `function(arg)` where the argument is another call, a quoted literal,
/// a symbol word, or nothing
pub fn function_call(input: Span) -> PResult<FunctionCall> {
    let (input, name) = word(input)?;
    let (input, _) = char('(')(input)?;
    let (input, arg) = delimited(optbs, opt(function_arg), optbs)(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, FunctionCall { name, arg }))
}

fn function_arg(input: Span) -> PResult<FunctionArg> {
    alt((
        map(function_call, |call| FunctionArg::Call(Box::new(call))),
        map(quote_word, FunctionArg::Quoted),
        map(symbol_word, FunctionArg::Word),
    ))(input)
}

/// `<type> <name> = <function>(...)`
pub fn output_declare(input: Span) -> PResult<OutputDeclare> {
    map(
        tuple((
            word,
            bs,
            word,
            delimited(optbs, char('='), optbs),
            function_call,
        )),
        |(output_type, _, name, _, expr)| OutputDeclare {
            name,
            output_type,
            expr,
        },
    )(input)
}

/// `output { <declarations> }`
pub fn output_block(input: Span) -> PResult<OutputSet> {
    map(
        preceded(
            pair(keyword("output"), optbs),
            delimited(
                pair(char('{'), ws),
                separated_list1(newlines, preceded(optbs, output_declare)),
                pair(ws, char('}')),
            ),
        ),
        |outputs| OutputSet { outputs },
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_type(text: &str) -> TypeSpec {
        let (remaining, spec) = type_spec(Span::new(text)).unwrap();
        assert!(remaining.fragment().is_empty(), "unparsed: {}", remaining.fragment());
        spec
    }

    #[test]
    fn test_types() {
        assert_eq!(parse_type("File"), TypeSpec::file());
        assert_eq!(parse_type("int"), TypeSpec::int());
        assert_eq!(parse_type("Boolean"), TypeSpec::boolean());
        assert_eq!(parse_type("Int?"), TypeSpec::optional(TypeSpec::int()));
        assert_eq!(
            parse_type("Array[File]?"),
            TypeSpec::optional(TypeSpec::array(TypeSpec::file()))
        );
        assert_eq!(
            parse_type("Array[ Array[Int] ]"),
            TypeSpec::array(TypeSpec::array(TypeSpec::int()))
        );
        assert!(type_spec(Span::new("String")).is_err());
        assert!(type_spec(Span::new("Filename")).is_err());
    }

    #[test]
    fn test_input_block() {
        let (_, set) = input_block(Span::new("input {\n  File reads\n\n  Int? threads\n}")).unwrap();
        assert_eq!(set.inputs.len(), 2);
        assert_eq!(set.inputs[0].name, "reads");
        assert_eq!(set.inputs[1].decl_type, TypeSpec::optional(TypeSpec::int()));
    }

    #[test]
    fn test_single_line_input_block() {
        let (_, set) = input_block(Span::new("input { File message }")).unwrap();
        assert_eq!(set.inputs[0].name, "message");
    }

    #[test]
    fn test_output_block_with_nested_call() {
        let (_, set) = output_block(Span::new(
            "output {\n  File report = glob('*.txt')\n  File log = first(glob(log))\n}",
        ))
        .unwrap();
        assert_eq!(set.outputs.len(), 2);
        assert_eq!(set.outputs[0].expr.name, "glob");
        assert_eq!(
            set.outputs[0].expr.arg,
            Some(FunctionArg::Quoted("*.txt".to_string()))
        );
        assert_eq!(
            set.outputs[1].expr.arg,
            Some(FunctionArg::Call(Box::new(FunctionCall {
                name: "glob".to_string(),
                arg: Some(FunctionArg::Word("log".to_string())),
            })))
        );
    }

    #[test]
    fn test_function_without_argument() {
        let (_, call) = function_call(Span::new("stdout( )")).unwrap();
        assert_eq!(call.name, "stdout");
        assert!(call.arg.is_none());
    }
}
