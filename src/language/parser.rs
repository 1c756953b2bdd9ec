//! Parser for the textual type notation printed by the formatter,
//! e.g. `f32[]`, `i32[2,3]`, `(f32[],b1[])`.

use crate::language::types::{ArrayType, DType, Type};
use crate::runtime::error::IrError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{digit1, multispace0},
    combinator::{all_consuming, map_res, value},
    multi::separated_list0,
    sequence::delimited,
    IResult, Parser as NomParser,
};
use std::str::FromStr;

fn parse_dtype(input: &str) -> IResult<&str, DType> {
    alt((
        value(DType::Bool, tag("b1")),
        value(DType::I32, tag("i32")),
        value(DType::F32, tag("f32")),
    ))
    .parse(input)
}

fn parse_dim(input: &str) -> IResult<&str, usize> {
    let (input, _) = multispace0(input)?;
    let (input, dim) = map_res(digit1, |digits: &str| digits.parse::<usize>()).parse(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, dim))
}

fn parse_array(input: &str) -> IResult<&str, Type> {
    let (input, dtype) = parse_dtype(input)?;
    let (input, shape) =
        delimited(tag("["), separated_list0(tag(","), parse_dim), tag("]")).parse(input)?;
    Ok((input, Type::Array(ArrayType::new(shape, dtype))))
}

fn parse_tuple(input: &str) -> IResult<&str, Type> {
    let (input, elements) =
        delimited(tag("("), separated_list0(tag(","), parse_type), tag(")")).parse(input)?;
    Ok((input, Type::Tuple(elements)))
}

pub fn parse_type(input: &str) -> IResult<&str, Type> {
    let (input, _) = multispace0(input)?;
    let (input, ty) = alt((value(Type::None, tag("None")), parse_array, parse_tuple)).parse(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, ty))
}

impl FromStr for Type {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(parse_type)
            .parse(s)
            .map(|(_, ty)| ty)
            .map_err(|err| IrError::TypeParse {
                input: s.to_string(),
                message: err.to_string(),
            })
    }
}
