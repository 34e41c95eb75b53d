//! Lengths and their unit conversions (C3/C10).
//!
//! Grounded on `librsvg::length`'s `LengthUnit`/`RsvgLength` pair: a length is a raw
//! number plus the unit it was written in, and conversion to pixels happens later, once a
//! font/viewport context is available. We drop librsvg's SVG-viewport-normalization
//! generics (`Horizontal`/`Vertical`/`Both`) since this engine has a single, fixed
//! conversion path (dpi = 96) rather than SVG's percentage-of-viewport lengths.

use cssparser::{Parser, Token};

use crate::error::{ParseError, ValueErrorKind};
use crate::parsers::Parse;

include!(concat!(env!("OUT_DIR"), "/length_units.rs"));

/// Standard resolution used to convert absolute units (in, cm, mm, pt, pc) to pixels.
pub const DPI: f64 = 96.0;
const POINTS_PER_INCH: f64 = 72.0;
const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;
const PICA_PER_INCH: f64 = 6.0;

/// Default root font size, used to resolve `rem` when no document root style is available.
pub const DEFAULT_FONT_SIZE_PX: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Px,
    Pt,
    Pc,
    Cm,
    Mm,
    In,
    Em,
    Ex,
    Ch,
    Rem,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Percent,
    /// A bare number with no unit, only legal in unitless/SVG contexts (§4.3).
    Number,
}

impl LengthUnit {
    pub fn from_ident(ident: &str) -> Option<LengthUnit> {
        LENGTH_UNITS.get(ident.to_ascii_lowercase().as_str()).copied()
    }

    /// True for units whose pixel value does not depend on font metrics or viewport.
    pub fn is_absolute(self) -> bool {
        matches!(
            self,
            LengthUnit::Px | LengthUnit::Pt | LengthUnit::Pc | LengthUnit::Cm | LengthUnit::Mm | LengthUnit::In
        )
    }
}

/// A length as written: a number plus the unit it carried at parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Length { value, unit }
    }

    pub fn zero() -> Self {
        Length::new(0.0, LengthUnit::Number)
    }

    /// Resolve this length to pixels given a font/viewport context.
    ///
    /// `em`/`ex`/`ch` resolve from `font_size_px` (the computed font size of the element
    /// itself, per CSS: `font-size` resolves against the *parent's* computed size, all
    /// other `em`-bearing properties against the element's own). `ex`/`ch` fall back to
    /// `0.5 * font_size_px` when no font metrics are available, per §4.10.
    pub fn to_px(self, ctx: &LengthContext) -> f64 {
        match self.unit {
            LengthUnit::Px => self.value,
            LengthUnit::Pt => self.value * DPI / POINTS_PER_INCH,
            LengthUnit::Pc => self.value * DPI / PICA_PER_INCH,
            LengthUnit::Cm => self.value * DPI / CM_PER_INCH,
            LengthUnit::Mm => self.value * DPI / MM_PER_INCH,
            LengthUnit::In => self.value * DPI,
            LengthUnit::Em => self.value * ctx.font_size_px,
            LengthUnit::Ex => self.value * ctx.ex_size_px.unwrap_or(ctx.font_size_px * 0.5),
            LengthUnit::Ch => self.value * ctx.ch_size_px.unwrap_or(ctx.font_size_px * 0.5),
            LengthUnit::Rem => self.value * ctx.root_font_size_px,
            LengthUnit::Vw => self.value / 100.0 * ctx.viewport_width_px,
            LengthUnit::Vh => self.value / 100.0 * ctx.viewport_height_px,
            LengthUnit::Vmin => self.value / 100.0 * ctx.viewport_width_px.min(ctx.viewport_height_px),
            LengthUnit::Vmax => self.value / 100.0 * ctx.viewport_width_px.max(ctx.viewport_height_px),
            LengthUnit::Percent => self.value, // caller resolves against its own basis
            LengthUnit::Number => self.value,
        }
    }
}

/// Everything `Length::to_px` needs to resolve a font- or viewport-relative unit.
#[derive(Debug, Clone, Copy)]
pub struct LengthContext {
    pub font_size_px: f64,
    pub ex_size_px: Option<f64>,
    pub ch_size_px: Option<f64>,
    pub root_font_size_px: f64,
    pub viewport_width_px: f64,
    pub viewport_height_px: f64,
}

impl Default for LengthContext {
    fn default() -> Self {
        LengthContext {
            font_size_px: DEFAULT_FONT_SIZE_PX,
            ex_size_px: None,
            ch_size_px: None,
            root_font_size_px: DEFAULT_FONT_SIZE_PX,
            viewport_width_px: 0.0,
            viewport_height_px: 0.0,
        }
    }
}

/// Parses a `<length-percentage>` per §4.3: a `Dimension` with a known unit, a bare
/// `Number` (legal only when `unitless` is true, e.g. inside an SVG presentation
/// attribute), or a `Percentage`. `negative` controls whether a negative value is
/// accepted.
pub fn parse_length<'i, 't>(
    input: &mut Parser<'i, 't>,
    negative: bool,
    unitless: bool,
) -> Result<Length, ParseError<'i>> {
    let location = input.current_source_location();
    let token = input.next()?.clone();
    let length = match token {
        Token::Dimension { value, ref unit, .. } => {
            let unit = LengthUnit::from_ident(unit).ok_or_else(|| {
                location.new_custom_error(ValueErrorKind::value_error("unknown length unit"))
            })?;
            Length::new(value as f64, unit)
        }
        Token::Percentage { unit_value, .. } => Length::new(unit_value as f64 * 100.0, LengthUnit::Percent),
        Token::Number { value, .. } if unitless || value == 0.0 => {
            Length::new(value as f64, LengthUnit::Number)
        }
        _ => {
            return Err(location.new_custom_error(ValueErrorKind::parse_error(
                "expected a length, percentage, or unitless number",
            )))
        }
    };

    if !negative && length.value < 0.0 {
        return Err(location.new_custom_error(ValueErrorKind::value_error("negative value not allowed")));
    }

    Ok(length)
}

impl Parse for Length {
    fn parse<'i, 't>(input: &mut Parser<'i, 't>) -> Result<Self, ParseError<'i>> {
        parse_length(input, true, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::Parse;

    #[test]
    fn parses_known_units() {
        assert_eq!(Length::parse_str("10px").unwrap(), Length::new(10.0, LengthUnit::Px));
        assert_eq!(Length::parse_str("2in").unwrap(), Length::new(2.0, LengthUnit::In));
        assert_eq!(Length::parse_str("50%").unwrap(), Length::new(50.0, LengthUnit::Percent));
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(Length::parse_str("10foo").is_err());
    }

    #[test]
    fn zero_is_allowed_without_unit() {
        assert_eq!(Length::parse_str("0").unwrap(), Length::new(0.0, LengthUnit::Number));
    }

    #[test]
    fn nonzero_number_requires_unitless_context() {
        let mut input = cssparser::ParserInput::new("5");
        let mut parser = Parser::new(&mut input);
        assert!(parse_length(&mut parser, true, false).is_err());

        let mut input2 = cssparser::ParserInput::new("5");
        let mut parser2 = Parser::new(&mut input2);
        assert!(parse_length(&mut parser2, true, true).is_ok());
    }

    #[test]
    fn absolute_units_convert_at_96_dpi() {
        let ctx = LengthContext::default();
        assert_eq!(Length::new(1.0, LengthUnit::In).to_px(&ctx), 96.0);
        assert_eq!(Length::new(72.0, LengthUnit::Pt).to_px(&ctx), 96.0);
    }

    #[test]
    fn em_resolves_against_font_size() {
        let ctx = LengthContext {
            font_size_px: 20.0,
            ..Default::default()
        };
        assert_eq!(Length::new(2.0, LengthUnit::Em).to_px(&ctx), 40.0);
    }
}
