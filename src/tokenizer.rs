//! C1/C2: the byte-to-token pipeline and the speculative-parse guard.
//!
//! `cssparser::Token`/`cssparser::Parser`/`cssparser::ParserInput` already implement CSS
//! Syntax Level 3 tokenization (comment skipping, escape decoding, `url()` bad-url
//! recovery, number sign/integer-vs-number tracking, unicode-range parsing) to the letter
//! described for C1/C2 here, so this module does not re-tokenize; it re-exports the pieces
//! callers need and adds the RAII rollback guard that the rest of the crate uses for
//! speculative grammars (`url()`, `attr()`, `calc()`).

pub use cssparser::{
    BasicParseErrorKind, ParseErrorKind, Parser, ParserInput, ParserState, SourcePosition, Token,
};

use crate::error::ParseError;

/// Captures a parser's cursor and restores it when dropped, unless `release()` is called.
///
/// This is the Rust analogue of the token-stream guard described for C2: a speculative
/// grammar (e.g. `attr()`'s optional fallback, or `calc()`'s backtracking on a malformed
/// operand) takes a `Mark`, tries to parse, and either calls `release()` to keep the
/// progress or lets the `Mark` drop to roll the parser back to where it started.
pub struct Mark<'i, 't, 'a> {
    parser: &'a mut Parser<'i, 't>,
    state: ParserState,
    released: bool,
}

impl<'i, 't, 'a> Mark<'i, 't, 'a> {
    pub fn new(parser: &'a mut Parser<'i, 't>) -> Self {
        let state = parser.state();
        Mark {
            parser,
            state,
            released: false,
        }
    }

    pub fn parser(&mut self) -> &mut Parser<'i, 't> {
        self.parser
    }

    /// Keep the parser's current position; do not roll back on drop.
    pub fn release(mut self) {
        self.released = true;
        drop(self);
    }
}

impl<'i, 't, 'a> Drop for Mark<'i, 't, 'a> {
    fn drop(&mut self) {
        if !self.released {
            self.parser.reset(&self.state);
        }
    }
}

/// Runs `f` speculatively: on `Ok`, the parser position is kept; on `Err`, it is rolled
/// back to where it was before `f` ran. This is the common case for the `Mark` guard and
/// covers most call sites in `values::functions` and the selector parser.
pub fn speculate<'i, 't, F, O>(parser: &mut Parser<'i, 't>, f: F) -> Result<O, ParseError<'i>>
where
    F: FnOnce(&mut Parser<'i, 't>) -> Result<O, ParseError<'i>>,
{
    let state = parser.state();
    match f(parser) {
        Ok(v) => Ok(v),
        Err(e) => {
            parser.reset(&state);
            Err(e)
        }
    }
}

/// Expects the parser to be fully exhausted (aside from trailing whitespace) after a value
/// grammar has consumed what it wants; used to implement the "residual must be empty"
/// rule from C3.
pub fn expect_exhausted<'i>(parser: &mut Parser<'i, '_>) -> Result<(), ParseError<'i>> {
    parser.expect_exhausted().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    #[test]
    fn mark_rolls_back_on_drop() {
        let mut input = ParserInput::new("foo bar");
        let mut parser = Parser::new(&mut input);
        {
            let mut mark = Mark::new(&mut parser);
            let _ = mark.parser().expect_ident();
        }
        // Dropped without release(): cursor should be back at the start.
        assert_eq!(parser.expect_ident().unwrap().as_ref(), "foo");
    }

    #[test]
    fn mark_keeps_position_on_release() {
        let mut input = ParserInput::new("foo bar");
        let mut parser = Parser::new(&mut input);
        let mark = Mark::new(&mut parser);
        mark.release();
        assert_eq!(parser.expect_ident().unwrap().as_ref(), "foo");
        assert_eq!(parser.expect_ident().unwrap().as_ref(), "bar");
    }

    #[test]
    fn speculate_rolls_back_on_error() {
        let mut input = ParserInput::new("foo bar");
        let mut parser = Parser::new(&mut input);
        let result: Result<(), ParseError> = speculate(&mut parser, |p| {
            p.expect_ident()?;
            Err(p.new_custom_error(crate::error::ValueErrorKind::parse_error("nope")))
        });
        assert!(result.is_err());
        assert_eq!(parser.expect_ident().unwrap().as_ref(), "foo");
    }
}
