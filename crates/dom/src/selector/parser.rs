//! A `nom`-based parser for structural selectors.

use super::*;
use crate::error::SelectorError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt},
    error::ErrorKind,
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
};

// --- Main Public Parser ---

pub fn parse_selector(input: &str) -> Result<Selector, SelectorError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SelectorError::Empty);
    }
    match selector_list(trimmed) {
        Ok(("", alternatives)) => Ok(Selector {
            source: trimmed.to_string(),
            alternatives,
        }),
        Ok((rem, _)) => Err(SelectorError::Parse(
            input.to_string(),
            format!("Parser did not consume all input. Remainder: '{}'", rem),
        )),
        Err(e) => Err(SelectorError::Parse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_').parse(input)
}

// --- Selector Grammar ---

fn selector_list(input: &str) -> IResult<&str, Vec<ComplexSelector>> {
    separated_list1(ws(char(',')), complex_selector).parse(input)
}

fn complex_selector(input: &str) -> IResult<&str, ComplexSelector> {
    let (input, first) = compound_selector(input)?;
    let (input, rest) = many0(pair(combinator, compound_selector)).parse(input)?;

    let mut compounds = vec![first];
    let mut combinators = Vec::with_capacity(rest.len());
    for (comb, compound) in rest {
        combinators.push(comb);
        compounds.push(compound);
    }
    Ok((
        input,
        ComplexSelector {
            compounds,
            combinators,
        },
    ))
}

fn combinator(input: &str) -> IResult<&str, Combinator> {
    alt((
        map(ws(char('>')), |_| Combinator::Child),
        map(multispace1, |_| Combinator::Descendant),
    ))
    .parse(input)
}

fn type_selector(input: &str) -> IResult<&str, TypeSelector> {
    alt((
        map(char('*'), |_| TypeSelector::Universal),
        map(ident, |name: &str| {
            TypeSelector::Named(name.to_ascii_lowercase())
        }),
    ))
    .parse(input)
}

fn compound_selector(input: &str) -> IResult<&str, CompoundSelector> {
    let (rest, (element, filters)) =
        (opt(type_selector), many0(simple_selector)).parse(input)?;
    if element.is_none() && filters.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Verify,
        )));
    }
    Ok((
        rest,
        CompoundSelector {
            element: element.unwrap_or(TypeSelector::Universal),
            filters,
        },
    ))
}

fn simple_selector(input: &str) -> IResult<&str, SimpleSelector> {
    alt((
        map(preceded(char('.'), ident), |s: &str| {
            SimpleSelector::Class(s.to_string())
        }),
        map(preceded(char('#'), ident), |s: &str| {
            SimpleSelector::Id(s.to_string())
        }),
        attribute_selector,
    ))
    .parse(input)
}

fn attribute_selector(input: &str) -> IResult<&str, SimpleSelector> {
    map(
        delimited(
            char('['),
            pair(ws(ident), opt(pair(attribute_op, ws(attribute_value)))),
            char(']'),
        ),
        |(name, test): (&str, Option<(AttributeOp, &str)>)| SimpleSelector::Attribute {
            name: name.to_ascii_lowercase(),
            test: test.map(|(op, value)| (op, value.to_string())),
        },
    )
    .parse(input)
}

fn attribute_op(input: &str) -> IResult<&str, AttributeOp> {
    alt((
        map(tag("*="), |_| AttributeOp::Contains),
        map(tag("^="), |_| AttributeOp::Prefix),
        map(tag("$="), |_| AttributeOp::Suffix),
        map(tag("~="), |_| AttributeOp::Word),
        map(char('='), |_| AttributeOp::Equals),
    ))
    .parse(input)
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        ident,
    ))
    .parse(input)
}
