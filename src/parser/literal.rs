use crate::{error::ValueError, ParamType, Value};
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, i64 as int, space0},
    combinator::{all_consuming, value},
    number::complete::double,
    sequence::{delimited, separated_pair, terminated},
    IResult,
};

fn bool_literal(i: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("true")),
        value(false, tag_no_case("false")),
    ))(i)
}

fn open_paren(i: &str) -> IResult<&str, ()> {
    value((), terminated(char('('), space0))(i)
}

fn close_paren(i: &str) -> IResult<&str, ()> {
    value((), delimited(space0, char(')'), space0))(i)
}

fn vec2_components(i: &str) -> IResult<&str, (f64, f64)> {
    separated_pair(double, delimited(space0, char(','), space0), double)(i)
}

/// `(x, y)`, parentheses optional.
fn vec2_literal(i: &str) -> IResult<&str, (f64, f64)> {
    alt((
        delimited(open_paren, vec2_components, close_paren),
        vec2_components,
    ))(i)
}

/// Runs `parser` over the whole input, allowing surrounding blanks.
fn whole<'a, O>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> impl FnMut(&'a str) -> IResult<&'a str, O> {
    all_consuming(delimited(space0, parser, space0))
}

/// Decodes the text encoding of a literal of type `ty`.
pub(crate) fn parse_literal(ty: ParamType, text: &str) -> Result<Value, ValueError> {
    let res = match ty {
        ParamType::Bool => whole(bool_literal)(text).map(|(_, b)| Value::Bool(b)),
        ParamType::Int => whole(int)(text).map(|(_, i)| Value::Int(i)),
        ParamType::Float => whole(double)(text).map(|(_, f)| Value::Float(f)),
        ParamType::Vec2 => whole(vec2_literal)(text).map(|(_, (x, y))| Value::Vec2(x, y)),
        // Strings are stored raw
        ParamType::String => return Ok(Value::String(text.to_owned())),
    };
    res.map_err(|_| ValueError::Unparseable {
        ty,
        text: text.to_owned(),
    })
}

#[cfg(test)]
mod test;
