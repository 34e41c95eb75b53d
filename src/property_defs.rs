//! Definitions for CSS property types, the same shape as `librsvg::property_defs`: each
//! property gets a Rust type, a `Default` impl for its initial value, a `Property` impl
//! for whether it inherits and how it computes, and a `Parse` impl for its grammar.
//!
//! Do not import things directly from this module; use the `properties` module instead.

use cssparser::{Color, Parser, RGBA};

use crate::error::ParseError;
use crate::parsers::Parse;
use crate::properties::ComputedValues;
use crate::property_macros::Property;
use crate::values::length::{Length, LengthContext, LengthUnit};

make_property!(
    /// `color`.
    CssColor,
    default: Color::RGBA(RGBA::new(0, 0, 0, 255)),
    inherits_automatically: true,
    newtype: Color,
);

make_property!(
    /// `background-color`.
    BackgroundColor,
    default: Color::RGBA(RGBA::new(0, 0, 0, 0)),
    inherits_automatically: false,
    newtype: Color,
);

make_property!(
    /// `direction`.
    Direction,
    default: Ltr,
    inherits_automatically: true,
    identifiers:
    "ltr" => Ltr,
    "rtl" => Rtl,
);

make_property!(
    /// `font-style`.
    FontStyle,
    default: Normal,
    inherits_automatically: true,
    identifiers:
    "normal" => Normal,
    "italic" => Italic,
    "oblique" => Oblique,
);

make_property!(
    /// `text-align`.
    TextAlign,
    default: Start,
    inherits_automatically: true,
    identifiers:
    "start" => Start,
    "end" => End,
    "left" => Left,
    "right" => Right,
    "center" => Center,
    "justify" => Justify,
);

make_property!(
    /// `text-transform`.
    TextTransform,
    default: None,
    inherits_automatically: true,
    identifiers:
    "none" => None,
    "uppercase" => Uppercase,
    "lowercase" => Lowercase,
    "capitalize" => Capitalize,
);

make_property!(
    /// `visibility`.
    Visibility,
    default: Visible,
    inherits_automatically: true,
    identifiers:
    "visible" => Visible,
    "hidden" => Hidden,
    "collapse" => Collapse,
);

make_property!(
    /// `white-space`.
    WhiteSpace,
    default: Normal,
    inherits_automatically: true,
    identifiers:
    "normal" => Normal,
    "nowrap" => Nowrap,
    "pre" => Pre,
    "pre-wrap" => PreWrap,
    "pre-line" => PreLine,
);

make_property!(
    /// `writing-mode`.
    WritingMode,
    default: HorizontalTb,
    inherits_automatically: true,
    identifiers:
    "horizontal-tb" => HorizontalTb,
    "vertical-rl" => VerticalRl,
    "vertical-lr" => VerticalLr,
);

make_property!(
    /// `display`.
    Display,
    default: Inline,
    inherits_automatically: false,
    identifiers:
    "block" => Block,
    "inline" => Inline,
    "inline-block" => InlineBlock,
    "flex" => Flex,
    "grid" => Grid,
    "list-item" => ListItem,
    "table" => Table,
    "none" => None,
);

make_property!(
    /// `position`.
    Position,
    default: Static,
    inherits_automatically: false,
    identifiers:
    "static" => Static,
    "relative" => Relative,
    "absolute" => Absolute,
    "fixed" => Fixed,
    "sticky" => Sticky,
);

/// `font-family`: a comma-separated list, kept as the raw family name list (§4.10's font
/// selection walks this list trying each family in turn).
#[derive(Debug, Clone, PartialEq)]
pub struct FontFamily(pub Vec<String>);

impl_default!(FontFamily, FontFamily(vec!["sans-serif".to_string()]));
impl_property!(FontFamily, true);

impl Parse for FontFamily {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let mut families = Vec::new();
        loop {
            let name = if let Ok(s) = parser.try_parse(|p| p.expect_string().map(|s| s.to_string())) {
                s
            } else {
                let mut words = vec![parser.expect_ident()?.to_string()];
                while let Ok(w) = parser.try_parse(|p| p.expect_ident().map(|s| s.to_string())) {
                    words.push(w);
                }
                words.join(" ")
            };
            families.push(name);
            if parser.try_parse(|p| p.expect_comma()).is_err() {
                break;
            }
        }
        Ok(FontFamily(families))
    }
}

/// `font-size`: a `<length-percentage>`, resolved at cascade time against the *parent's*
/// computed size (`em`/`%`) or the document root's (`rem`) — see `properties::SpecifiedValues
/// ::to_computed_values`, which always computes this property first. After `compute()` the
/// stored `Length` is always in `Px`, so other properties can read `font_size.0.value`
/// directly as this element's font size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSize(pub Length);

impl_default!(FontSize, FontSize(Length::new(16.0, LengthUnit::Px)));

impl Parse for FontSize {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        Ok(FontSize(Length::parse(parser)?))
    }
}

impl Property for FontSize {
    fn inherits_automatically() -> bool {
        true
    }

    fn compute(&self, v: &ComputedValues) -> FontSize {
        let ctx = LengthContext {
            font_size_px: v.font_size_px,
            root_font_size_px: v.root_font_size_px,
            ..LengthContext::default()
        };
        FontSize(Length::new(self.0.to_px(&ctx), LengthUnit::Px))
    }
}

/// `font-weight`: a number in `[1, 1000]`, plus the relative `bolder`/`lighter` keywords
/// resolved against the parent's computed weight in `compute()` (CSS Fonts Level 4 §2.2.3
/// bucketed relative-weight steps).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontWeight {
    Absolute(f64),
    Bolder,
    Lighter,
}

impl Default for FontWeight {
    fn default() -> FontWeight {
        FontWeight::Absolute(400.0)
    }
}

impl Parse for FontWeight {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        if let Ok(n) = parser.try_parse(|p| f64::parse(p)) {
            return Ok(FontWeight::Absolute(n.clamp(1.0, 1000.0)));
        }
        let loc = parser.current_source_location();
        let ident = parser.expect_ident()?;
        font_weight_keyword(ident.as_ref())
            .ok_or_else(|| loc.new_custom_error(crate::error::ValueErrorKind::parse_error("invalid font-weight")))
    }
}

fn font_weight_keyword(s: &str) -> Option<FontWeight> {
    match s.to_ascii_lowercase().as_str() {
        "normal" => Some(FontWeight::Absolute(400.0)),
        "bold" => Some(FontWeight::Absolute(700.0)),
        "bolder" => Some(FontWeight::Bolder),
        "lighter" => Some(FontWeight::Lighter),
        _ => None,
    }
}

impl Property for FontWeight {
    fn inherits_automatically() -> bool {
        true
    }

    fn compute(&self, v: &ComputedValues) -> FontWeight {
        let parent = match v.font_weight() {
            FontWeight::Absolute(w) => w,
            _ => 400.0,
        };
        match self {
            FontWeight::Absolute(w) => FontWeight::Absolute(*w),
            FontWeight::Bolder => FontWeight::Absolute(bolder_step(parent)),
            FontWeight::Lighter => FontWeight::Absolute(lighter_step(parent)),
        }
    }
}

fn bolder_step(w: f64) -> f64 {
    if w < 350.0 {
        400.0
    } else if w < 550.0 {
        700.0
    } else {
        900.0_f64.min(w + 300.0).max(w)
    }
}

fn lighter_step(w: f64) -> f64 {
    if w < 550.0 {
        100.0
    } else if w < 750.0 {
        400.0
    } else {
        700.0
    }
}

// `font-variant-*` and `font-kerning` feed `resolver::synthesize_feature_settings`'s
// OpenType mapping table (§4.10). Each is simplified to a single keyword rather than the
// full space-separated `font-variant-ligatures`/`-numeric`/`-east-asian` grammars (which
// allow several keywords from independent groups at once) — see DESIGN.md.
make_property!(
    /// `font-variant-ligatures`.
    FontVariantLigatures,
    default: Normal,
    inherits_automatically: true,
    identifiers:
    "normal" => Normal,
    "none" => None,
    "common-ligatures" => CommonLigatures,
    "no-common-ligatures" => NoCommonLigatures,
);

make_property!(
    /// `font-variant-caps`.
    FontVariantCaps,
    default: Normal,
    inherits_automatically: true,
    identifiers:
    "normal" => Normal,
    "small-caps" => SmallCaps,
    "all-small-caps" => AllSmallCaps,
);

make_property!(
    /// `font-variant-numeric`.
    FontVariantNumeric,
    default: Normal,
    inherits_automatically: true,
    identifiers:
    "normal" => Normal,
    "lining-nums" => LiningNums,
    "oldstyle-nums" => OldstyleNums,
    "proportional-nums" => ProportionalNums,
    "tabular-nums" => TabularNums,
    "diagonal-fractions" => DiagonalFractions,
    "stacked-fractions" => StackedFractions,
    "ordinal" => Ordinal,
    "slashed-zero" => SlashedZero,
);

make_property!(
    /// `font-variant-east-asian`.
    FontVariantEastAsian,
    default: Normal,
    inherits_automatically: true,
    identifiers:
    "normal" => Normal,
    "jis78" => Jis78,
    "jis83" => Jis83,
    "jis90" => Jis90,
    "jis04" => Jis04,
    "simplified" => Simplified,
    "traditional" => Traditional,
    "full-width" => FullWidth,
    "proportional-width" => ProportionalWidth,
    "ruby" => Ruby,
);

make_property!(
    /// `font-kerning`.
    FontKerning,
    default: Auto,
    inherits_automatically: true,
    identifiers:
    "auto" => Auto,
    "normal" => Normal,
    "none" => None,
);

/// `letter-spacing` / `word-spacing`: `normal` or a `<length>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spacing {
    Normal,
    Length(Length),
}

impl Default for Spacing {
    fn default() -> Spacing {
        Spacing::Normal
    }
}

impl Parse for Spacing {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        if parser.try_parse(|p| p.expect_ident_matching("normal")).is_ok() {
            return Ok(Spacing::Normal);
        }
        Ok(Spacing::Length(Length::parse(parser)?))
    }
}

impl_property!(Spacing, true);

#[derive(Debug, Clone, PartialEq)]
pub struct LetterSpacing(pub Spacing);
impl_default!(LetterSpacing, LetterSpacing(Spacing::Normal));
impl_property!(LetterSpacing, true);
impl Parse for LetterSpacing {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        Ok(LetterSpacing(Spacing::parse(parser)?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordSpacing(pub Spacing);
impl_default!(WordSpacing, WordSpacing(Spacing::Normal));
impl_property!(WordSpacing, true);
impl Parse for WordSpacing {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        Ok(WordSpacing(Spacing::parse(parser)?))
    }
}

/// `line-height`: `normal`, a unitless number (multiplied by font-size at use time), or a
/// `<length>`/`<percentage>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineHeight {
    Normal,
    Number(f64),
    Len(Length),
}

impl_default!(LineHeight, LineHeight::Normal);
impl_property!(LineHeight, true);

impl Parse for LineHeight {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        if parser.try_parse(|p| p.expect_ident_matching("normal")).is_ok() {
            return Ok(LineHeight::Normal);
        }
        if let Ok(n) = parser.try_parse(|p| f64::parse(p)) {
            return Ok(LineHeight::Number(n));
        }
        Ok(LineHeight::Len(Length::parse(parser)?))
    }
}

/// `text-indent`: a `<length-percentage>`, possibly negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextIndent(pub Length);
impl_default!(TextIndent, TextIndent(Length::zero()));
impl_property!(TextIndent, true);
impl Parse for TextIndent {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        Ok(TextIndent(Length::parse(parser)?))
    }
}

/// `widows`: a positive integer (CSS2.1 initial value 2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Widows(pub i32);
impl_default!(Widows, Widows(2));
impl_property!(Widows, true);
impl Parse for Widows {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let loc = parser.current_source_location();
        let n = i32::parse(parser)?;
        if n < 1 {
            return Err(loc.new_custom_error(crate::error::ValueErrorKind::value_error("widows must be >= 1")));
        }
        Ok(Widows(n))
    }
}

/// `list-style-type`: either a named counter style or `none`.
#[derive(Debug, Clone, PartialEq)]
pub enum ListStyleType {
    None,
    CounterStyle(String),
}

impl_default!(ListStyleType, ListStyleType::CounterStyle("disc".to_string()));
impl_property!(ListStyleType, true);

impl Parse for ListStyleType {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        let ident = parser.expect_ident()?.to_string();
        if ident.eq_ignore_ascii_case("none") {
            Ok(ListStyleType::None)
        } else {
            Ok(ListStyleType::CounterStyle(ident))
        }
    }
}

/// `width` / `height`: `auto` or a `<length-percentage>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LengthOrAuto {
    Auto,
    Length(Length),
}

impl Parse for LengthOrAuto {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        if parser.try_parse(|p| p.expect_ident_matching("auto")).is_ok() {
            return Ok(LengthOrAuto::Auto);
        }
        Ok(LengthOrAuto::Length(Length::parse(parser)?))
    }
}

macro_rules! length_or_auto_property {
    ($name:ident, $default:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name(pub LengthOrAuto);
        impl_default!($name, $name($default));
        impl_property!($name, false);
        impl Parse for $name {
            fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
                Ok($name(LengthOrAuto::parse(parser)?))
            }
        }
    };
}

length_or_auto_property!(Width, LengthOrAuto::Auto);
length_or_auto_property!(Height, LengthOrAuto::Auto);
length_or_auto_property!(MarginTop, LengthOrAuto::Length(Length::zero()));
length_or_auto_property!(MarginRight, LengthOrAuto::Length(Length::zero()));
length_or_auto_property!(MarginBottom, LengthOrAuto::Length(Length::zero()));
length_or_auto_property!(MarginLeft, LengthOrAuto::Length(Length::zero()));

macro_rules! padding_property {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name(pub Length);
        impl_default!($name, $name(Length::zero()));
        impl_property!($name, false);
        impl Parse for $name {
            fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
                Ok($name(Length::parse(parser)?))
            }
        }
    };
}

padding_property!(PaddingTop);
padding_property!(PaddingRight);
padding_property!(PaddingBottom);
padding_property!(PaddingLeft);

/// `z-index`: `auto` or an integer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZIndex {
    Auto,
    Index(i32),
}

impl_default!(ZIndex, ZIndex::Auto);
impl_property!(ZIndex, false);

impl Parse for ZIndex {
    fn parse<'i>(parser: &mut Parser<'i, '_>) -> Result<Self, ParseError<'i>> {
        if parser.try_parse(|p| p.expect_ident_matching("auto")).is_ok() {
            return Ok(ZIndex::Auto);
        }
        Ok(ZIndex::Index(i32::parse(parser)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_weight_bolder_steps_up_from_normal() {
        let computed = ComputedValues::default();
        let bolder = FontWeight::Bolder.compute(&computed);
        assert_eq!(bolder, FontWeight::Absolute(700.0));
    }

    #[test]
    fn display_parses_known_keywords() {
        assert_eq!(Display::parse_str("block").unwrap(), Display::Block);
        assert!(Display::parse_str("bogus").is_err());
    }

    #[test]
    fn width_parses_auto_and_length() {
        assert_eq!(Width::parse_str("auto").unwrap().0, LengthOrAuto::Auto);
        assert!(matches!(Width::parse_str("10px").unwrap().0, LengthOrAuto::Length(_)));
    }

    #[test]
    fn list_style_type_none_is_distinct_from_named_style() {
        assert_eq!(ListStyleType::parse_str("none").unwrap(), ListStyleType::None);
        assert_eq!(
            ListStyleType::parse_str("decimal").unwrap(),
            ListStyleType::CounterStyle("decimal".to_string())
        );
    }
}
