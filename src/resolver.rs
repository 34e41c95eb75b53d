//! The value resolver (C10): font selection and `font-feature-settings` synthesis. Length,
//! `calc()`, and `var()` resolution are already implemented where they're grounded most
//! naturally — `values::length`, `values::calc`, `values::variables` — so this file covers
//! only the two remaining §4.10 algorithms. Like `values::calc`, there is no teacher analog
//! (`librsvg` renders paths, not text), so this is grounded directly on the distance
//! functions and OpenType mapping table spelled out in §4.10 and CSS Fonts Level 4.

use std::collections::HashMap;

use cssparser::{match_ignore_ascii_case, Parser, ParserInput, Token};

use crate::properties::{ComputedValues, FontKerning, FontStyle, FontVariantCaps, FontVariantEastAsian, FontVariantLigatures, FontVariantNumeric, FontWeight};
use crate::rules::Declaration;

/// A face's selection range along one axis (weight, width, or slope), per CSS Fonts Level
/// 4 §2 — a single authored value (`bold`) is a degenerate range `(v, v)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange(pub f32, pub f32);

impl AxisRange {
    fn contains(self, v: f32) -> bool {
        v >= self.0 && v <= self.1
    }
}

/// `FontSelectionDescription`: the `@font-face` cache key (§4.10).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSelectionDescription {
    pub weight: AxisRange,
    pub width: AxisRange,
    pub slope: AxisRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedFontFace {
    pub family: String,
    pub selection: FontSelectionDescription,
    pub sources: Vec<String>,
}

/// The requested `FontDescription`, built from an element's cascaded font properties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontDescription {
    pub weight: f32,
    pub width: f32,
    pub slope: f32,
}

impl FontDescription {
    pub fn from_computed_values(computed: &ComputedValues) -> FontDescription {
        let weight = match computed.font_weight() {
            FontWeight::Absolute(w) => w as f32,
            FontWeight::Bolder | FontWeight::Lighter => 400.0,
        };
        let slope = match computed.font_style() {
            FontStyle::Normal => 0.0,
            FontStyle::Italic | FontStyle::Oblique => 14.0,
        };
        // No `font-stretch` property is modeled (§ DESIGN.md); every request is `normal`.
        FontDescription { weight, width: 100.0, slope }
    }
}

/// Per-family table of `@font-face` faces, built once per stylesheet.
pub struct FontFaceCache {
    by_family: HashMap<String, Vec<SegmentedFontFace>>,
}

impl FontFaceCache {
    pub fn build(font_face_rules: &[Vec<Declaration>]) -> FontFaceCache {
        let mut by_family: HashMap<String, Vec<SegmentedFontFace>> = HashMap::new();
        for declarations in font_face_rules {
            if let Some(face) = parse_font_face(declarations) {
                by_family.entry(face.family.to_ascii_lowercase()).or_default().push(face);
            }
        }
        FontFaceCache { by_family }
    }

    /// Chooses the best face for `family`/`requested`, minimizing in order
    /// width-distance → slope-distance → weight-distance (§4.10).
    pub fn best_match(&self, family: &str, requested: FontDescription) -> Option<&SegmentedFontFace> {
        self.by_family
            .get(&family.to_ascii_lowercase())?
            .iter()
            .min_by(|a, b| {
                let key = |f: &SegmentedFontFace| {
                    (
                        width_distance(requested.width, f.selection.width),
                        slope_distance(requested.slope, f.selection.slope),
                        weight_distance(requested.weight, f.selection.weight),
                    )
                };
                key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Walks an element's `font-family` list, returning the first family with at least one
    /// registered face (§7's "font lookup fallback to next family").
    pub fn resolve_family<'a>(
        &self,
        families: &'a [String],
        requested: FontDescription,
    ) -> Option<(&'a str, &SegmentedFontFace)> {
        families
            .iter()
            .find_map(|name| self.best_match(name, requested).map(|face| (name.as_str(), face)))
    }
}

/// Asymmetric around `normal` (100): a candidate on the same side as the request is
/// preferred over one on the opposite side.
fn width_distance(requested: f32, range: AxisRange) -> f32 {
    if range.contains(requested) {
        return 0.0;
    }
    if requested <= 100.0 {
        if range.1 < requested {
            requested - range.1
        } else {
            (range.0 - requested) * 1.5
        }
    } else if range.0 > requested {
        range.0 - requested
    } else {
        (requested - range.1) * 1.5
    }
}

/// Asymmetric around the italic/oblique threshold (slope 0deg): upright text prefers the
/// least-slanted face, slanted text prefers the most similarly slanted one.
fn slope_distance(requested: f32, range: AxisRange) -> f32 {
    if range.contains(requested) {
        return 0.0;
    }
    if requested >= 0.0 {
        if range.0 > requested {
            range.0 - requested
        } else {
            (requested - range.1) * 1.5
        }
    } else if range.1 < requested {
        requested - range.1
    } else {
        (range.0 - requested) * 1.5
    }
}

/// Favors the 400-500 region (CSS Fonts Level 4 §5.2): a request inside it first looks for
/// a face at or above the request (up to 500), then below, then elsewhere.
fn weight_distance(requested: f32, range: AxisRange) -> f32 {
    if range.contains(requested) {
        return 0.0;
    }
    if (400.0..=500.0).contains(&requested) {
        if range.0 > requested {
            if range.0 <= 500.0 {
                range.0 - requested
            } else {
                (range.0 - requested) * 1.2
            }
        } else {
            (requested - range.1) * 1.1
        }
    } else if requested < 400.0 {
        if range.1 < requested {
            requested - range.1
        } else {
            (range.0 - requested) * 1.5
        }
    } else if range.0 > requested {
        range.0 - requested
    } else {
        (requested - range.1) * 1.5
    }
}

fn parse_axis_range(text: &str) -> Option<AxisRange> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let first = parse_axis_value(&mut parser)?;
    let second = parser.try_parse(parse_axis_value).unwrap_or(first);
    parser.expect_exhausted().ok()?;
    Some(AxisRange(first.min(second), first.max(second)))
}

fn parse_axis_value<'i>(parser: &mut Parser<'i, '_>) -> Result<f32, cssparser::ParseError<'i, ()>> {
    match parser.next()?.clone() {
        Token::Number { value, .. } => Ok(value),
        Token::Dimension { value, ref unit, .. } if unit.eq_ignore_ascii_case("deg") => Ok(value),
        Token::Ident(ref ident) => match_ignore_ascii_case! { ident,
            "normal" => Ok(0.0),
            "italic" => Ok(14.0),
            "oblique" => Ok(14.0),
            "bold" => Ok(700.0),
            _ => Err(parser.new_error_for_next_token()),
        },
        _ => Err(parser.new_error_for_next_token()),
    }
}

fn declaration_text<'a>(declarations: &'a [Declaration], name: &str) -> Option<&'a str> {
    declarations.iter().rev().find(|d| d.name.eq_ignore_ascii_case(name)).map(|d| d.raw_value.as_str())
}

fn parse_font_face(declarations: &[Declaration]) -> Option<SegmentedFontFace> {
    let family = declaration_text(declarations, "font-family")?.trim().trim_matches(['"', '\'']).to_string();

    let weight = declaration_text(declarations, "font-weight")
        .and_then(parse_axis_range)
        .unwrap_or(AxisRange(400.0, 400.0));
    let width = declaration_text(declarations, "font-stretch")
        .and_then(parse_axis_range)
        .unwrap_or(AxisRange(100.0, 100.0));
    let slope = declaration_text(declarations, "font-style")
        .and_then(parse_axis_range)
        .unwrap_or(AxisRange(0.0, 0.0));

    let sources = declaration_text(declarations, "src")
        .map(|s| s.split(',').map(|part| part.trim().to_string()).collect())
        .unwrap_or_default();

    Some(SegmentedFontFace {
        family,
        selection: FontSelectionDescription { weight, width, slope },
        sources,
    })
}

/// Synthesizes the OpenType feature-tag list implied by an element's `font-variant-*` and
/// `font-kerning` computed values (§4.10's mapping table). Each simplified property
/// contributes at most one tag pair, so the "duplicates within a group reject the whole
/// value" rule (meant for the full space-separated grammars) never triggers here — see
/// DESIGN.md's note on the simplification.
pub fn synthesize_feature_settings(computed: &ComputedValues) -> Vec<(&'static str, u32)> {
    let mut tags = Vec::new();

    match computed.font_variant_ligatures() {
        FontVariantLigatures::CommonLigatures => {
            tags.push(("liga", 1));
            tags.push(("clig", 1));
        }
        FontVariantLigatures::NoCommonLigatures => {
            tags.push(("liga", 0));
            tags.push(("clig", 0));
        }
        FontVariantLigatures::Normal | FontVariantLigatures::None => {}
    }

    match computed.font_variant_caps() {
        FontVariantCaps::SmallCaps => tags.push(("smcp", 1)),
        FontVariantCaps::AllSmallCaps => {
            tags.push(("c2sc", 1));
            tags.push(("smcp", 1));
        }
        FontVariantCaps::Normal => {}
    }

    match computed.font_variant_numeric() {
        FontVariantNumeric::LiningNums => tags.push(("lnum", 1)),
        FontVariantNumeric::OldstyleNums => tags.push(("onum", 1)),
        FontVariantNumeric::ProportionalNums => tags.push(("pnum", 1)),
        FontVariantNumeric::TabularNums => tags.push(("tnum", 1)),
        FontVariantNumeric::DiagonalFractions => tags.push(("frac", 1)),
        FontVariantNumeric::StackedFractions => tags.push(("afrc", 1)),
        FontVariantNumeric::Ordinal => tags.push(("ordn", 1)),
        FontVariantNumeric::SlashedZero => tags.push(("zero", 1)),
        FontVariantNumeric::Normal => {}
    }

    match computed.font_variant_east_asian() {
        FontVariantEastAsian::Jis78 => tags.push(("jp78", 1)),
        FontVariantEastAsian::Jis83 => tags.push(("jp83", 1)),
        FontVariantEastAsian::Jis90 => tags.push(("jp90", 1)),
        FontVariantEastAsian::Jis04 => tags.push(("jp04", 1)),
        FontVariantEastAsian::Simplified => tags.push(("smpl", 1)),
        FontVariantEastAsian::Traditional => tags.push(("trad", 1)),
        FontVariantEastAsian::FullWidth => tags.push(("fwid", 1)),
        FontVariantEastAsian::ProportionalWidth => tags.push(("pwid", 1)),
        FontVariantEastAsian::Ruby => tags.push(("ruby", 1)),
        FontVariantEastAsian::Normal => {}
    }

    match computed.font_kerning() {
        FontKerning::Normal => tags.push(("kern", 1)),
        FontKerning::None => tags.push(("kern", 0)),
        FontKerning::Auto => {}
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, value: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            raw_value: value.to_string(),
            important: false,
        }
    }

    #[test]
    fn exact_weight_match_has_zero_distance() {
        let face = SegmentedFontFace {
            family: "Roboto".to_string(),
            selection: FontSelectionDescription {
                weight: AxisRange(400.0, 400.0),
                width: AxisRange(100.0, 100.0),
                slope: AxisRange(0.0, 0.0),
            },
            sources: vec![],
        };
        let cache = FontFaceCache {
            by_family: [("roboto".to_string(), vec![face])].into_iter().collect(),
        };
        let requested = FontDescription { weight: 400.0, width: 100.0, slope: 0.0 };
        assert!(cache.best_match("Roboto", requested).is_some());
    }

    #[test]
    fn font_face_cache_prefers_closer_weight() {
        let light = SegmentedFontFace {
            family: "Inter".to_string(),
            selection: FontSelectionDescription {
                weight: AxisRange(300.0, 300.0),
                width: AxisRange(100.0, 100.0),
                slope: AxisRange(0.0, 0.0),
            },
            sources: vec![],
        };
        let bold = SegmentedFontFace {
            family: "Inter".to_string(),
            selection: FontSelectionDescription {
                weight: AxisRange(700.0, 700.0),
                width: AxisRange(100.0, 100.0),
                slope: AxisRange(0.0, 0.0),
            },
            sources: vec![],
        };
        let cache = FontFaceCache {
            by_family: [("inter".to_string(), vec![light, bold])].into_iter().collect(),
        };
        let requested = FontDescription { weight: 650.0, width: 100.0, slope: 0.0 };
        let chosen = cache.best_match("Inter", requested).unwrap();
        assert_eq!(chosen.selection.weight, AxisRange(700.0, 700.0));
    }

    #[test]
    fn font_face_parses_weight_range_and_src_list() {
        let declarations = vec![
            decl("font-family", "\"Open Sans\""),
            decl("font-weight", "400 700"),
            decl("src", "url(a.woff2), url(a.woff)"),
        ];
        let face = parse_font_face(&declarations).unwrap();
        assert_eq!(face.family, "Open Sans");
        assert_eq!(face.selection.weight, AxisRange(400.0, 700.0));
        assert_eq!(face.sources.len(), 2);
    }

    #[test]
    fn common_ligatures_synthesizes_liga_and_clig() {
        let mut computed = ComputedValues::default();
        computed.font_variant_ligatures = FontVariantLigatures::CommonLigatures;
        computed.font_kerning = FontKerning::Normal;
        let tags = synthesize_feature_settings(&computed);
        assert!(tags.contains(&("liga", 1)));
        assert!(tags.contains(&("clig", 1)));
        assert!(tags.contains(&("kern", 1)));
    }

    #[test]
    fn resolve_family_falls_back_to_next_family_when_first_is_unregistered() {
        let face = SegmentedFontFace {
            family: "Fallback".to_string(),
            selection: FontSelectionDescription {
                weight: AxisRange(400.0, 400.0),
                width: AxisRange(100.0, 100.0),
                slope: AxisRange(0.0, 0.0),
            },
            sources: vec![],
        };
        let cache = FontFaceCache {
            by_family: [("fallback".to_string(), vec![face])].into_iter().collect(),
        };
        let requested = FontDescription { weight: 400.0, width: 100.0, slope: 0.0 };
        let families = vec!["Missing".to_string(), "Fallback".to_string()];
        let (name, _) = cache.resolve_family(&families, requested).unwrap();
        assert_eq!(name, "Fallback");
    }
}
