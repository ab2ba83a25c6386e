//! Recognises a dotted number already present at the start of heading text.
//!
//! A prefix is one or more `digits.` groups followed by whitespace: `1. `,
//! `1.1. `, `2.10.3. `. A bare year (`2024 Plans`) or a decimal
//! (`3.5 kg`) is not a prefix.

use crate::numbering::Prefix;
use nom::{
    IResult, Parser,
    character::complete::{char, digit1, multispace1},
    combinator::map_res,
    multi::many1,
    sequence::terminated,
};

fn dotted_group(input: &str) -> IResult<&str, u32> {
    terminated(map_res(digit1, str::parse::<u32>), char('.')).parse(input)
}

fn numbered_prefix(input: &str) -> IResult<&str, Vec<u32>> {
    terminated(many1(dotted_group), multispace1).parse(input)
}

/// Splits `text` into its existing prefix and the remaining title.
///
/// Leading whitespace before the prefix is ignored.
pub fn split_prefix(text: &str) -> Option<(Prefix, &str)> {
    match numbered_prefix(text.trim_start()) {
        Ok((rest, components)) => Some((Prefix::new(components), rest)),
        Err(_) => None,
    }
}

/// The title without any existing prefix.
pub fn strip_prefix(text: &str) -> &str {
    split_prefix(text)
        .map(|(_, rest)| rest)
        .unwrap_or_else(|| text.trim_start())
}
