//! C3: tokens to a typed value tree, plus the C10 resolution helpers that sit next to it
//! (lengths, `calc()`, colors, `var()` substitution, `An+B` patterns).

pub mod calc;
pub mod color;
pub mod length;
pub mod nth;
pub mod variables;

use std::rc::Rc;

use cssparser::{match_ignore_ascii_case, Parser, Token};

use crate::error::{ParseError, ValueErrorKind};
use crate::parsers::Parse;
use calc::Calc;
use cssparser::Color;
use length::Length;

/// A parsed property value, shared via `Rc` so that repeated identifiers (`auto`, `none`)
/// and shorthand-expansion siblings can share storage per §9's reference-counted value
/// graph note.
pub type SharedValue = Rc<Value>;

/// The sum type described in §3. Not every property uses every variant; each property's
/// grammar (driven from `properties.rs`) picks the subset it accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Initial,
    Inherit,
    Unset,
    Ident(String),
    Integer(i32),
    Number(f64),
    Percent(f64),
    Length(Length),
    Angle(f64),
    Str(String),
    CustomIdent(String),
    Url(String),
    LocalUrl(String),
    Color(Color),
    Pair(Box<Value>, Box<Value>),
    List(Vec<Value>),
    Rect(Box<Value>, Box<Value>, Box<Value>, Box<Value>),
    Function(String, Vec<Value>),
    UnicodeRange(u32, u32),
    Calc(Calc),
    /// A custom property's raw, unexpanded token text (`name` excludes the leading `--`).
    CustomProperty(String, String),
    /// A value whose raw token text contains `var()` and must be re-resolved once the
    /// cascade's custom-property environment for the element is known (§4.3, §4.8 step 5).
    VariableReference(String),
}

/// Angle units accepted wherever `<angle>` is legal (hue in `hsl()`/`hwb()`, among others).
pub fn parse_angle_degrees<'i>(input: &mut Parser<'i, '_>) -> Result<f64, ParseError<'i>> {
    let loc = input.current_source_location();
    match input.next()?.clone() {
        Token::Dimension { value, ref unit, .. } => {
            let v = value as f64;
            match_ignore_ascii_case! { unit,
                "deg" => Ok(v),
                "grad" => Ok(v * 0.9),
                "rad" => Ok(v.to_degrees()),
                "turn" => Ok(v * 360.0),
                _ => Err(loc.new_custom_error(ValueErrorKind::value_error("unknown angle unit"))),
            }
        }
        Token::Number { value, .. } => Ok(value as f64),
        _ => Err(loc.new_custom_error(ValueErrorKind::parse_error("expected an angle"))),
    }
}

/// Tries to parse one of the three CSS-wide keywords, per §4.3. Returns `None` (without
/// consuming) if the next token is not one of them.
pub fn try_parse_wide_keyword<'i>(input: &mut Parser<'i, '_>) -> Option<Value> {
    input
        .try_parse(|p| {
            let loc = p.current_source_location();
            let ident = p.expect_ident()?;
            match_ignore_ascii_case! { ident,
                "initial" => Ok(Value::Initial),
                "inherit" => Ok(Value::Inherit),
                "unset" => Ok(Value::Unset),
                _ => Err(loc.new_custom_error::<()>(ValueErrorKind::parse_error("not a wide keyword"))),
            }
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    #[test]
    fn wide_keywords_recognized() {
        for (src, expected) in [
            ("initial", Value::Initial),
            ("inherit", Value::Inherit),
            ("unset", Value::Unset),
        ] {
            let mut input = ParserInput::new(src);
            let mut parser = Parser::new(&mut input);
            assert_eq!(try_parse_wide_keyword(&mut parser), Some(expected));
        }
    }

    #[test]
    fn non_keyword_is_not_consumed() {
        let mut input = ParserInput::new("red");
        let mut parser = Parser::new(&mut input);
        assert_eq!(try_parse_wide_keyword(&mut parser), None);
        assert_eq!(parser.expect_ident().unwrap().as_ref(), "red");
    }

    #[test]
    fn angle_units_convert_to_degrees() {
        let mut input = ParserInput::new("180deg");
        let mut parser = Parser::new(&mut input);
        assert_eq!(parse_angle_degrees(&mut parser).unwrap(), 180.0);

        let mut input2 = ParserInput::new("0.5turn");
        let mut parser2 = Parser::new(&mut input2);
        assert_eq!(parse_angle_degrees(&mut parser2).unwrap(), 180.0);
    }
}
