//! The `Parse` trait and small parsing helpers shared across value grammars.
//!
//! Grounded on `librsvg::parsers`: every CSS value type in this crate implements `Parse`
//! against a `cssparser::Parser`, and `ParseValue`/`parse_str` give ergonomic entry points
//! for both "parse the rest of this parser" and "parse this whole string" use sites.

use cssparser::{Parser, ParserInput, Token};

use crate::error::{ParseError, ValueErrorKind};

/// Trait for parsing a value out of a CSS token stream.
///
/// Implementors should consume exactly the tokens that belong to their grammar and leave
/// the parser positioned right after; callers are responsible for checking that nothing is
/// left over (see `tokenizer::expect_exhausted`), per the "residual must be empty" rule in
/// C3.
pub trait Parse: Sized {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>>;

    /// Convenience entry point for tests and for values that are known to occupy an
    /// entire string (e.g. attribute values, `@import` preludes parsed in isolation).
    fn parse_str(s: &str) -> Result<Self, ParseError<'_>> {
        let mut input = ParserInput::new(s);
        let mut parser = Parser::new(&mut input);
        let res = parser.parse_entirely(Self::parse)?;
        Ok(res)
    }
}

/// Adapter so callers can write `parser.parse_value::<Foo>()` instead of `Foo::parse(parser)`.
pub trait ParseValue {
    fn parse_value<'i, T: Parse>(&mut self) -> Result<T, ParseError<'i>>
    where
        Self: 'i;
}

impl<'i, 't> ParseValue for Parser<'i, 't> {
    fn parse_value<'j, T: Parse>(&mut self) -> Result<T, ParseError<'j>>
    where
        Self: 'j,
    {
        T::parse(self)
    }
}

impl Parse for f64 {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        Ok(f64::from(parser.expect_number()?))
    }
}

impl Parse for i32 {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        Ok(parser.expect_integer()?)
    }
}

impl Parse for u32 {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let n = parser.expect_integer()?;
        if n < 0 {
            return Err(parser.new_custom_error(ValueErrorKind::value_error("expected a non-negative integer")));
        }
        Ok(n as u32)
    }
}

/// `a b` or a single `a` used for both components (SVG's `NumberOptionalNumber`, reused
/// here for `border-spacing`-like two-axis values).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberOptionalNumber<T>(pub T, pub T);

impl<T: Parse + Copy> Parse for NumberOptionalNumber<T> {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let a = T::parse(parser)?;
        if parser.is_exhausted() {
            return Ok(NumberOptionalNumber(a, a));
        }
        let b = T::parse(parser)?;
        Ok(NumberOptionalNumber(a, b))
    }
}

/// Consumes an optional comma plus surrounding whitespace; used between the arguments of
/// legacy comma-separated function notations (`rgb(r, g, b)`, `hsl(h, s%, l%)`).
pub fn optional_comma<'i>(input: &mut Parser<'i, '_>) -> bool {
    input.try_parse(|p| p.expect_comma()).is_ok()
}

/// A floating point value that must not be NaN or infinite; used for cascade-computed
/// lengths where a bogus `calc()` could otherwise smuggle `NaN` into layout.
pub fn finite_f64<'i>(parser: &mut Parser<'i, '_>, loc: cssparser::SourceLocation) -> Result<f64, ParseError<'i>> {
    let x = f64::parse(parser)?;
    if x.is_finite() {
        Ok(x)
    } else {
        Err(loc.new_custom_error(ValueErrorKind::value_error("expected a finite number")))
    }
}

/// A CSS custom identifier (`<custom-ident>`): an `Ident` token that is not one of the
/// CSS-wide keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomIdent(pub String);

const CSS_WIDE_KEYWORDS: &[&str] = &["initial", "inherit", "unset", "default", "revert"];

impl Parse for CustomIdent {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let loc = parser.current_source_location();
        let ident = parser.expect_ident()?;
        if CSS_WIDE_KEYWORDS.iter().any(|kw| ident.eq_ignore_ascii_case(kw)) {
            return Err(loc.new_custom_error(ValueErrorKind::value_error("CSS-wide keyword used as custom-ident")));
        }
        Ok(CustomIdent(ident.as_ref().to_string()))
    }
}

/// True if this token stream, read from the current position, contains a `var(` function
/// anywhere in it (not just at the top level) — used to decide whether a property's value
/// must be deferred as a `VariableReference` (§4.3's "Variable references" rule).
pub fn contains_var_reference(tokens: &[Token]) -> bool {
    tokens
        .iter()
        .any(|t| matches!(t, Token::Function(name) if name.eq_ignore_ascii_case("var")))
}

/// Parses a single ident token against a fixed set of keyword -> value mappings, the same
/// way `librsvg::parse_identifiers!` backs `make_property!`'s identifier-enum arm.
#[macro_export]
macro_rules! parse_identifiers {
    ($parser:expr,
     $($str:expr => $val:expr,)+) => {
        {
            let loc = $parser.current_source_location();
            let token = $parser.next()?;

            match token {
                $(cssparser::Token::Ident(ref cow) if cow.eq_ignore_ascii_case($str) => Ok($val),)+

                _ => Err(loc.new_basic_unexpected_token_error(token.clone()))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_number_optional_number() {
        let both: NumberOptionalNumber<f64> = NumberOptionalNumber::parse_str("3").unwrap();
        assert_eq!(both, NumberOptionalNumber(3.0, 3.0));

        let pair: NumberOptionalNumber<f64> = NumberOptionalNumber::parse_str("3 4").unwrap();
        assert_eq!(pair, NumberOptionalNumber(3.0, 4.0));
    }

    #[test]
    fn custom_ident_rejects_wide_keywords() {
        assert!(CustomIdent::parse_str("inherit").is_err());
        assert!(CustomIdent::parse_str("foo").is_ok());
    }
}
