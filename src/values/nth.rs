//! The `An+B` micro-syntax used by `:nth-child()` and friends (part of C4), and the
//! matching predicate from §4.9/§8.

use cssparser::{match_ignore_ascii_case, Parser, Token};

use crate::error::{ParseError, ValueErrorKind};

/// An `(a, b)` pair from `An+B` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NthPattern {
    pub a: i32,
    pub b: i32,
}

impl NthPattern {
    pub const fn new(a: i32, b: i32) -> Self {
        NthPattern { a, b }
    }

    /// `matches(a, b, n) ⇔ ∃k ∈ ℤ: n = a·k + b`, subject to the sign constraint in §8:
    /// `n ≥ b` when `a > 0`, `n ≤ b` when `a < 0`.  `n` is the 1-based sibling index.
    pub fn matches(self, n: i32) -> bool {
        if self.a == 0 {
            return n == self.b;
        }
        if self.a > 0 {
            n >= self.b && (n - self.b) % self.a == 0
        } else {
            n <= self.b && (self.b - n) % (-self.a) == 0
        }
    }
}

/// Parses `odd`, `even`, a signed integer, or the full `An+B` grammar (`3n`, `3n+1`,
/// `-n+3`, `n`, …), per §4.3/§4.4.
pub fn parse_nth<'i>(input: &mut Parser<'i, '_>) -> Result<NthPattern, ParseError<'i>> {
    let loc = input.current_source_location();
    match input.next()?.clone() {
        Token::Ident(ref ident) => {
            return match_ignore_ascii_case! { ident,
                "odd" => Ok(NthPattern::new(2, 1)),
                "even" => Ok(NthPattern::new(2, 0)),
                _ => parse_an_b_ident(ident, input, loc),
            };
        }
        Token::Number {
            int_value: Some(b), ..
        } => Ok(NthPattern::new(0, b)),
        Token::Dimension {
            int_value: Some(a),
            ref unit,
            ..
        } => parse_dimension_an_b(a, unit, input, loc),
        _ => Err(loc.new_custom_error(ValueErrorKind::parse_error("invalid An+B pattern"))),
    }
}

fn parse_an_b_ident<'i>(
    ident: &str,
    input: &mut Parser<'i, '_>,
    loc: cssparser::SourceLocation,
) -> Result<NthPattern, ParseError<'i>> {
    // `n`, `-n`, `n+B`, `-n+B`, `n-B`, `-n-B` spelled as a single or split ident+number.
    let (a, rest) = if let Some(rest) = ident.strip_prefix('-') {
        (-1, rest)
    } else {
        (1, ident)
    };
    if !rest.eq_ignore_ascii_case("n") {
        return Err(loc.new_custom_error(ValueErrorKind::parse_error("invalid An+B pattern")));
    }
    parse_b_tail(a, input, loc)
}

fn parse_dimension_an_b<'i>(
    a: i32,
    unit: &str,
    input: &mut Parser<'i, '_>,
    loc: cssparser::SourceLocation,
) -> Result<NthPattern, ParseError<'i>> {
    if !unit.eq_ignore_ascii_case("n") {
        return Err(loc.new_custom_error(ValueErrorKind::parse_error("invalid An+B pattern")));
    }
    parse_b_tail(a, input, loc)
}

fn parse_b_tail<'i>(
    a: i32,
    input: &mut Parser<'i, '_>,
    loc: cssparser::SourceLocation,
) -> Result<NthPattern, ParseError<'i>> {
    input.skip_whitespace();
    match input.try_parse(|p| p.next().cloned()) {
        Ok(Token::Delim('+')) => {
            input.skip_whitespace();
            let b = input.expect_integer()?;
            Ok(NthPattern::new(a, b))
        }
        Ok(Token::Delim('-')) => {
            input.skip_whitespace();
            let b = input.expect_integer()?;
            Ok(NthPattern::new(a, -b))
        }
        Ok(Token::Number {
            int_value: Some(b), ..
        }) => Ok(NthPattern::new(a, b)),
        _ => Ok(NthPattern::new(a, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    fn matching_n(a: i32, b: i32) -> Vec<i32> {
        (1..=10).filter(|&n| NthPattern::new(a, b).matches(n)).collect()
    }

    #[test]
    fn nth_child_2n_plus_1() {
        assert_eq!(matching_n(2, 1), vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn odd_and_even_keywords() {
        assert_eq!(NthPattern::new(2, 1).matches(3), true);
        assert_eq!(NthPattern::new(2, 0).matches(4), true);
        assert_eq!(NthPattern::new(2, 0).matches(3), false);
    }

    #[test]
    fn negative_a_bounds_above() {
        assert_eq!(matching_n(-1, 3), vec![1, 2, 3]);
    }

    #[test]
    fn a_zero_matches_single_index() {
        assert_eq!(matching_n(0, 5), vec![5]);
    }

    #[test]
    fn whitespace_minus_tail_negates_b() {
        let mut input = ParserInput::new("2n - 1");
        let mut parser = Parser::new(&mut input);
        assert_eq!(parse_nth(&mut parser).unwrap(), NthPattern::new(2, -1));
    }

    #[test]
    fn universal_property_matches_an_b_definition() {
        // matches(a,b,n) <=> exists k: n = a*k+b, with the sign-bound from §8.
        for a in -3..=3 {
            for b in -3..=5 {
                let pat = NthPattern::new(a, b);
                for n in 1..=20 {
                    let direct = pat.matches(n);
                    let exists_k = (-20..=20).any(|k| a * k + b == n);
                    let bound_ok = if a > 0 {
                        n >= b
                    } else if a < 0 {
                        n <= b
                    } else {
                        true
                    };
                    assert_eq!(direct, exists_k && bound_ok, "a={a} b={b} n={n}");
                }
            }
        }
    }
}
