//! C6: media query parsing and evaluation, per §4.6.

use cssparser::{match_ignore_ascii_case, Parser};

use crate::error::{ParseError, ValueErrorKind};
use crate::values::length::{parse_length, Length, LengthContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restrictor {
    None,
    Only,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    All,
    Print,
    Screen,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feature {
    Width(Length),
    MinWidth(Length),
    MaxWidth(Length),
    Height(Length),
    MinHeight(Length),
    MaxHeight(Length),
    Orientation(Orientation),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    pub restrictor: Restrictor,
    pub media_type: MediaType,
    pub features: Vec<Feature>,
}

/// The rendering context a media query is evaluated against (§4.6: "host").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width_px: f64,
    pub height_px: f64,
    pub is_screen: bool,
    pub is_print: bool,
}

impl Default for Viewport {
    fn default() -> Viewport {
        Viewport {
            width_px: 800.0,
            height_px: 600.0,
            is_screen: true,
            is_print: false,
        }
    }
}

impl MediaQuery {
    /// Step 1-3 of §4.6's evaluation algorithm.
    pub fn evaluate(&self, viewport: &Viewport) -> bool {
        let type_matches = match self.media_type {
            MediaType::All => true,
            MediaType::Screen => viewport.is_screen,
            MediaType::Print => viewport.is_print,
            MediaType::None => false,
        };

        if !type_matches {
            return self.restrictor == Restrictor::Not;
        }

        let features_match = self.features.iter().all(|f| f.evaluate(viewport));
        features_match ^ (self.restrictor == Restrictor::Not)
    }
}

impl Feature {
    fn evaluate(&self, viewport: &Viewport) -> bool {
        let ctx = LengthContext::default();
        match self {
            Feature::Width(l) => l.to_px(&ctx) == viewport.width_px,
            Feature::MinWidth(l) => viewport.width_px >= l.to_px(&ctx),
            Feature::MaxWidth(l) => viewport.width_px <= l.to_px(&ctx),
            Feature::Height(l) => l.to_px(&ctx) == viewport.height_px,
            Feature::MinHeight(l) => viewport.height_px >= l.to_px(&ctx),
            Feature::MaxHeight(l) => viewport.height_px <= l.to_px(&ctx),
            Feature::Orientation(o) => {
                let actual = if viewport.height_px >= viewport.width_px {
                    Orientation::Portrait
                } else {
                    Orientation::Landscape
                };
                actual == *o
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaQueryList {
    pub queries: Vec<MediaQuery>,
}

impl MediaQueryList {
    pub fn empty() -> MediaQueryList {
        MediaQueryList { queries: Vec::new() }
    }

    /// An empty list matches unconditionally (§4.6).
    pub fn matches(&self, viewport: &Viewport) -> bool {
        self.queries.is_empty() || self.queries.iter().any(|q| q.evaluate(viewport))
    }

    pub fn parse<'i>(input: &mut Parser<'i, '_>) -> Result<MediaQueryList, ParseError<'i>> {
        let mut queries = Vec::new();
        input.skip_whitespace();
        if input.is_exhausted() {
            return Ok(MediaQueryList::empty());
        }
        loop {
            queries.push(parse_one_query(input)?);
            input.skip_whitespace();
            if input.try_parse(|p| p.expect_comma()).is_err() {
                break;
            }
        }
        Ok(MediaQueryList { queries })
    }
}

fn parse_one_query<'i>(input: &mut Parser<'i, '_>) -> Result<MediaQuery, ParseError<'i>> {
    input.skip_whitespace();

    let mut restrictor = Restrictor::None;
    let mut media_type = None;

    if let Ok(ident) = input.try_parse(|p| p.expect_ident().map(|s| s.to_string())) {
        match_ignore_ascii_case! { &ident,
            "not" => restrictor = Restrictor::Not,
            "only" => restrictor = Restrictor::Only,
            _ => media_type = Some(parse_media_type(&ident, input)?),
        }
        if media_type.is_none() {
            input.skip_whitespace();
            let ident2 = input.expect_ident()?.to_string();
            media_type = Some(parse_media_type(&ident2, input)?);
        }
    }

    let mut features = Vec::new();
    loop {
        input.skip_whitespace();
        let has_and = if media_type.is_some() || !features.is_empty() {
            input.try_parse(|p| p.expect_ident_matching("and")).is_ok()
        } else {
            true
        };
        if !has_and {
            break;
        }
        input.skip_whitespace();
        if input.try_parse(|p| p.expect_parenthesis_block()).is_err() {
            break;
        }
        let feature = input.parse_nested_block(parse_feature)?;
        features.push(feature);
    }

    Ok(MediaQuery {
        restrictor,
        media_type: media_type.unwrap_or(MediaType::All),
        features,
    })
}

fn parse_media_type<'i>(ident: &str, input: &mut Parser<'i, '_>) -> Result<MediaType, ParseError<'i>> {
    match_ignore_ascii_case! { ident,
        "all" => Ok(MediaType::All),
        "print" => Ok(MediaType::Print),
        "screen" => Ok(MediaType::Screen),
        "none" => Ok(MediaType::None),
        _ => Err(input.new_custom_error(ValueErrorKind::parse_error("unknown media type"))),
    }
}

fn parse_feature<'i>(input: &mut Parser<'i, '_>) -> Result<Feature, ParseError<'i>> {
    let name = input.expect_ident()?.to_string();
    input.skip_whitespace();

    if name.eq_ignore_ascii_case("orientation") {
        input.expect_colon()?;
        input.skip_whitespace();
        let value = input.expect_ident()?.to_string();
        return match_ignore_ascii_case! { &value,
            "portrait" => Ok(Feature::Orientation(Orientation::Portrait)),
            "landscape" => Ok(Feature::Orientation(Orientation::Landscape)),
            _ => Err(input.new_custom_error(ValueErrorKind::parse_error("unknown orientation value"))),
        };
    }

    input.expect_colon()?;
    input.skip_whitespace();
    let length = parse_length(input, true, false)?;

    match_ignore_ascii_case! { &name,
        "width" => Ok(Feature::Width(length)),
        "min-width" => Ok(Feature::MinWidth(length)),
        "max-width" => Ok(Feature::MaxWidth(length)),
        "height" => Ok(Feature::Height(length)),
        "min-height" => Ok(Feature::MinHeight(length)),
        "max-height" => Ok(Feature::MaxHeight(length)),
        _ => Err(input.new_custom_error(ValueErrorKind::parse_error("unknown media feature"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    fn parse(src: &str) -> MediaQueryList {
        let mut input = ParserInput::new(src);
        let mut parser = Parser::new(&mut input);
        MediaQueryList::parse(&mut parser).unwrap()
    }

    #[test]
    fn empty_list_matches_unconditionally() {
        let list = MediaQueryList::empty();
        assert!(list.matches(&Viewport::default()));
    }

    #[test]
    fn min_width_matches_against_500px_viewport() {
        let list = parse("(min-width: 400px)");
        let viewport = Viewport {
            width_px: 500.0,
            ..Viewport::default()
        };
        assert!(list.matches(&viewport));
    }

    #[test]
    fn min_width_fails_below_threshold() {
        let list = parse("(min-width: 400px)");
        let viewport = Viewport {
            width_px: 300.0,
            ..Viewport::default()
        };
        assert!(!list.matches(&viewport));
    }

    #[test]
    fn not_screen_excludes_screen_viewport() {
        let list = parse("not screen");
        let viewport = Viewport {
            is_screen: true,
            is_print: false,
            ..Viewport::default()
        };
        assert!(!list.matches(&viewport));
    }

    #[test]
    fn print_type_matches_print_viewport() {
        let list = parse("print");
        let viewport = Viewport {
            is_screen: false,
            is_print: true,
            ..Viewport::default()
        };
        assert!(list.matches(&viewport));
    }

    #[test]
    fn orientation_landscape_matches_wide_viewport() {
        let list = parse("(orientation: landscape)");
        let viewport = Viewport {
            width_px: 800.0,
            height_px: 600.0,
            ..Viewport::default()
        };
        assert!(list.matches(&viewport));
    }

    #[test]
    fn comma_separated_list_matches_if_any_query_matches() {
        let list = parse("print, (min-width: 9000px)");
        let viewport = Viewport {
            is_screen: true,
            is_print: false,
            width_px: 500.0,
            ..Viewport::default()
        };
        assert!(!list.matches(&viewport));
        let print_viewport = Viewport {
            is_screen: false,
            is_print: true,
            ..Viewport::default()
        };
        assert!(list.matches(&print_viewport));
    }
}
