//! `calc()`/`min()`/`max()`/`clamp()` (part of C3), and their unit-safe evaluation (C10).
//!
//! Parsing uses a shunting-yard pass over the sum/product grammar to produce a flat
//! postfix sequence; evaluation walks that sequence with a small stack of
//! `(value, unit-kind)` pairs, exactly as described in §4.10. This file has no teacher
//! analogue (`librsvg` does not implement `calc()` for its SVG properties) and is grounded
//! directly on spec §4.3/§4.10/§8's worked examples instead.

use cssparser::{match_ignore_ascii_case, Parser, Token};

use super::length::{parse_length, Length, LengthContext, LengthUnit};
use crate::error::{ParseError, ValueErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalcOperand {
    Number(f64),
    Length(Length),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalcToken {
    Operand(CalcOperand),
    Op(CalcOp),
}

/// A parsed `calc()`-family expression: a postfix token sequence plus the context flags
/// captured at the call site (whether negative results are allowed, and whether a bare
/// unitless number is an acceptable final result).
#[derive(Debug, Clone, PartialEq)]
pub struct Calc {
    pub postfix: Vec<CalcToken>,
    pub negative: bool,
    pub unitless: bool,
}

/// The "kind" half of the `(value, unit-kind)` evaluation stack entries in §4.10.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    None,
    Pixels,
}

impl Calc {
    /// Parses the argument list of `calc(...)`, `min(...)`, `max(...)`, or `clamp(...)`
    /// (the opening function token has already been consumed by the caller; this consumes
    /// up to, but not including, the closing `)`, which `cssparser`'s `parse_nested_block`
    /// handles for us when called via `parse_function`).
    pub fn parse_function<'i>(
        name: &str,
        input: &mut Parser<'i, '_>,
        negative: bool,
        unitless: bool,
    ) -> Result<Calc, ParseError<'i>> {
        let postfix = match_ignore_ascii_case! { name,
            "calc" => parse_sum(input)?,
            "min" => parse_variadic(input, CalcOp::Min)?,
            "max" => parse_variadic(input, CalcOp::Max)?,
            "clamp" => parse_clamp(input)?,
            _ => {
                return Err(input.new_custom_error(ValueErrorKind::parse_error("unknown calc function")));
            }
        };
        Ok(Calc {
            postfix,
            negative,
            unitless,
        })
    }

    /// Evaluates the postfix sequence per §4.10. Any unit-safety violation returns `0`
    /// (the "graceful degradation" path from §7), matching the `calc()` examples in §8:
    /// `calc(1px + 1)` → 0, `calc(1px * 2px)` → 0, `calc(1 / 0)` → 0, `calc(10px * 2)` →
    /// 20px.
    pub fn evaluate(&self, ctx: &LengthContext) -> f64 {
        let mut stack: Vec<(f64, UnitKind)> = Vec::new();

        for tok in &self.postfix {
            match tok {
                CalcToken::Operand(CalcOperand::Number(n)) => stack.push((*n, UnitKind::None)),
                CalcToken::Operand(CalcOperand::Length(len)) => {
                    stack.push((len.to_px(ctx), UnitKind::Pixels))
                }
                CalcToken::Op(op) => {
                    let (rhs, rhs_kind) = match stack.pop() {
                        Some(v) => v,
                        None => return 0.0,
                    };
                    let (lhs, lhs_kind) = match stack.pop() {
                        Some(v) => v,
                        None => return 0.0,
                    };
                    match op {
                        CalcOp::Add | CalcOp::Sub => {
                            if lhs_kind != rhs_kind {
                                return 0.0;
                            }
                            let v = if *op == CalcOp::Add { lhs + rhs } else { lhs - rhs };
                            stack.push((v, lhs_kind));
                        }
                        CalcOp::Mul => {
                            if lhs_kind != UnitKind::None && rhs_kind != UnitKind::None {
                                return 0.0;
                            }
                            let kind = if lhs_kind != UnitKind::None { lhs_kind } else { rhs_kind };
                            stack.push((lhs * rhs, kind));
                        }
                        CalcOp::Div => {
                            if rhs_kind != UnitKind::None || rhs == 0.0 {
                                return 0.0;
                            }
                            stack.push((lhs / rhs, lhs_kind));
                        }
                        CalcOp::Min | CalcOp::Max => {
                            if lhs_kind != rhs_kind {
                                return 0.0;
                            }
                            let v = if *op == CalcOp::Min { lhs.min(rhs) } else { lhs.max(rhs) };
                            stack.push((v, lhs_kind));
                        }
                    }
                }
            }
        }

        let (value, kind) = match stack.pop() {
            Some(v) if stack.is_empty() => v,
            _ => return 0.0,
        };

        if !self.unitless && kind != UnitKind::Pixels {
            return 0.0;
        }
        if !self.negative && value < 0.0 {
            return 0.0;
        }
        value
    }
}

fn parse_operand<'i>(input: &mut Parser<'i, '_>) -> Result<CalcOperand, ParseError<'i>> {
    input.skip_whitespace();
    let loc = input.current_source_location();
    match input.next()?.clone() {
        Token::Number { value, .. } => Ok(CalcOperand::Number(value as f64)),
        Token::Dimension { value, ref unit, .. } => {
            let unit = LengthUnit::from_ident(unit)
                .ok_or_else(|| loc.new_custom_error(ValueErrorKind::value_error("unknown unit in calc()")))?;
            Ok(CalcOperand::Length(Length::new(value as f64, unit)))
        }
        Token::Percentage { unit_value, .. } => {
            Ok(CalcOperand::Length(Length::new(unit_value as f64 * 100.0, LengthUnit::Percent)))
        }
        _ => Err(loc.new_custom_error(ValueErrorKind::parse_error("expected a number or length in calc()"))),
    }
}

/// `sum = product (('+' | '-') product)*`
fn parse_sum<'i>(input: &mut Parser<'i, '_>) -> Result<Vec<CalcToken>, ParseError<'i>> {
    let mut out = parse_product(input)?;
    loop {
        input.skip_whitespace();
        let op = input.try_parse(|p| -> Result<CalcOp, ParseError<'i>> {
            match p.next_including_whitespace()?.clone() {
                Token::Delim('+') => Ok(CalcOp::Add),
                Token::Delim('-') => Ok(CalcOp::Sub),
                _ => Err(p.new_custom_error(ValueErrorKind::parse_error("expected + or -"))),
            }
        });
        match op {
            Ok(op) => {
                let rhs = parse_product(input)?;
                out.extend(rhs);
                out.push(CalcToken::Op(op));
            }
            Err(_) => break,
        }
    }
    Ok(out)
}

/// `product = value (('*' | '/') value)*`
fn parse_product<'i>(input: &mut Parser<'i, '_>) -> Result<Vec<CalcToken>, ParseError<'i>> {
    let mut out = parse_value_or_paren(input)?;
    loop {
        let op = input.try_parse(|p| -> Result<CalcOp, ParseError<'i>> {
            p.skip_whitespace();
            match p.next()?.clone() {
                Token::Delim('*') => Ok(CalcOp::Mul),
                Token::Delim('/') => Ok(CalcOp::Div),
                _ => Err(p.new_custom_error(ValueErrorKind::parse_error("expected * or /"))),
            }
        });
        match op {
            Ok(op) => {
                let rhs = parse_value_or_paren(input)?;
                out.extend(rhs);
                out.push(CalcToken::Op(op));
            }
            Err(_) => break,
        }
    }
    Ok(out)
}

fn parse_value_or_paren<'i>(input: &mut Parser<'i, '_>) -> Result<Vec<CalcToken>, ParseError<'i>> {
    input.skip_whitespace();
    if let Ok(inner) = input.try_parse(|p| p.expect_parenthesis_block().and_then(|_| p.parse_nested_block(parse_sum)))
    {
        return Ok(inner);
    }
    let operand = parse_operand(input)?;
    Ok(vec![CalcToken::Operand(operand)])
}

fn parse_variadic<'i>(input: &mut Parser<'i, '_>, op: CalcOp) -> Result<Vec<CalcToken>, ParseError<'i>> {
    let mut out = parse_sum(input)?;
    while input.try_parse(|p| p.expect_comma()).is_ok() {
        let next = parse_sum(input)?;
        out.extend(next);
        out.push(CalcToken::Op(op));
    }
    Ok(out)
}

fn parse_clamp<'i>(input: &mut Parser<'i, '_>) -> Result<Vec<CalcToken>, ParseError<'i>> {
    let min = parse_sum(input)?;
    input.expect_comma()?;
    let val = parse_sum(input)?;
    input.expect_comma()?;
    let max = parse_sum(input)?;

    let mut out = Vec::new();
    out.extend(min);
    out.extend(val);
    out.push(CalcToken::Op(CalcOp::Max));
    out.extend(max);
    out.push(CalcToken::Op(CalcOp::Min));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    fn eval(src: &str, negative: bool, unitless: bool) -> f64 {
        let mut input = ParserInput::new(src);
        let mut parser = Parser::new(&mut input);
        let name = parser.expect_function().unwrap().to_string();
        let calc = parser
            .parse_nested_block(|p| Calc::parse_function(&name, p, negative, unitless))
            .unwrap();
        calc.evaluate(&LengthContext::default())
    }

    #[test]
    fn px_plus_number_is_zero() {
        assert_eq!(eval("calc(1px + 1)", true, false), 0.0);
    }

    #[test]
    fn px_times_px_is_zero() {
        assert_eq!(eval("calc(1px * 2px)", true, false), 0.0);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(eval("calc(1 / 0)", true, true), 0.0);
    }

    #[test]
    fn scaling_a_length_works() {
        assert_eq!(eval("calc(10px * 2)", true, false), 20.0);
    }

    #[test]
    fn clamp_picks_middle_value() {
        assert_eq!(eval("clamp(10px, 5px, 20px)", true, false), 10.0);
        assert_eq!(eval("clamp(10px, 15px, 20px)", true, false), 15.0);
        assert_eq!(eval("clamp(10px, 25px, 20px)", true, false), 20.0);
    }

    #[test]
    fn negative_result_clamped_to_zero_when_disallowed() {
        assert_eq!(eval("calc(-5px)", false, false), 0.0);
    }
}
