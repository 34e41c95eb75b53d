//! Error types.

use std::fmt;

use cssparser::{BasicParseError, BasicParseErrorKind};

/// A short-lived error.
///
/// The lifetime of the error is the same as the `cssparser::ParserInput` that
/// was used to create a `cssparser::Parser`.  That is, it is the lifetime of
/// the string data that is being parsed.
pub type ParseError<'i> = cssparser::ParseError<'i, ValueErrorKind>;

/// A simple error describing why a value failed to parse.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueErrorKind {
    /// A property with the specified name was not found.
    UnknownProperty,

    /// The value could not be parsed at all.
    Parse(String),

    /// The value could be parsed, but is invalid for this grammar.
    Value(String),
}

impl ValueErrorKind {
    pub fn parse_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Parse(s.to_string())
    }

    pub fn value_error(s: &str) -> ValueErrorKind {
        ValueErrorKind::Value(s.to_string())
    }
}

impl fmt::Display for ValueErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueErrorKind::UnknownProperty => write!(f, "unknown property name"),
            ValueErrorKind::Parse(ref s) => write!(f, "parse error: {s}"),
            ValueErrorKind::Value(ref s) => write!(f, "invalid value: {s}"),
        }
    }
}

impl<'a> From<BasicParseError<'a>> for ValueErrorKind {
    fn from(e: BasicParseError<'_>) -> ValueErrorKind {
        let BasicParseError { kind, .. } = e;

        let msg = match kind {
            BasicParseErrorKind::UnexpectedToken(_) => "unexpected token",
            BasicParseErrorKind::EndOfInput => "unexpected end of input",
            BasicParseErrorKind::AtRuleInvalid(_) => "invalid @-rule",
            BasicParseErrorKind::AtRuleBodyInvalid => "invalid @-rule body",
            BasicParseErrorKind::QualifiedRuleInvalid => "invalid qualified rule",
        };

        ValueErrorKind::parse_error(msg)
    }
}

/// Owned, long-lived error for counter style resolution (`extends`/fallback cycles,
/// unknown systems).
#[derive(Debug, Clone, PartialEq)]
pub enum CounterError {
    UnknownSystem(String),
    EmptySymbols,
    RangeExcluded,
    FallbackCycle(String),
    RepresentationFailed,
}

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterError::UnknownSystem(s) => write!(f, "unknown counter system: {s}"),
            CounterError::EmptySymbols => write!(f, "counter style has no symbols"),
            CounterError::RangeExcluded => write!(f, "value excluded by counter range"),
            CounterError::FallbackCycle(name) => {
                write!(f, "fallback cycle detected at counter style {name}")
            }
            CounterError::RepresentationFailed => write!(f, "could not represent value"),
        }
    }
}

/// Owned, long-lived error for stylesheet-level failures (as opposed to the
/// per-declaration silent discard described by the cascade).
#[derive(Debug, Clone, PartialEq)]
pub enum StylesheetError {
    /// `@import` nesting exceeded the hard cap.
    ImportDepthExceeded,

    /// The caller-supplied loader failed to fetch an `@import`ed sheet.
    ImportFailed(String),
}

impl fmt::Display for StylesheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StylesheetError::ImportDepthExceeded => {
                write!(f, "@import recursion exceeded the maximum depth")
            }
            StylesheetError::ImportFailed(s) => write!(f, "@import failed: {s}"),
        }
    }
}

impl std::error::Error for CounterError {}
impl std::error::Error for StylesheetError {}
