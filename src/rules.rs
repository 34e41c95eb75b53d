//! C5: the rule parser, driven by `cssparser`'s qualified-rule/at-rule traits exactly the
//! way `librsvg::css::{DeclParser, RuleParser}` do, extended to the full at-rule grammar
//! from §4.5 (`@import`, `@namespace`, `@media`, `@font-face`, `@counter-style`, `@page`
//! with its margin boxes).

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseErrorKind, Parser, ParserState, QualifiedRuleParser,
    RuleBodyItemParser, RuleBodyParser, SourceLocation, StyleSheetParser, ToCss,
};

use crate::error::{ParseError, ValueErrorKind};
use crate::media::MediaQueryList;
use crate::selector::{parse_selector_list, ComplexSelector};
use crate::session::{session_log, Session};
use crate::values::nth::{parse_nth, NthPattern};
use crate::values::variables::is_custom_property_name;

include!(concat!(env!("OUT_DIR"), "/margin_boxes.rs"));

/// One `name: value [!important]` declaration. Custom properties keep their raw text
/// (§3: "stored verbatim as token lists, never expanded"); ordinary properties keep their
/// raw text too, since resolving them against the value grammar happens per-property at
/// cascade time once the element context (font, viewport) is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub raw_value: String,
    pub important: bool,
}

impl Declaration {
    pub fn is_custom_property(&self) -> bool {
        is_custom_property_name(&self.name)
    }
}

/// A page-margin box, one of the 16 named in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginBoxType {
    TopLeftCorner,
    TopLeft,
    TopCenter,
    TopRight,
    TopRightCorner,
    BottomLeftCorner,
    BottomLeft,
    BottomCenter,
    BottomRight,
    BottomRightCorner,
    LeftTop,
    LeftMiddle,
    LeftBottom,
    RightTop,
    RightMiddle,
    RightBottom,
}

impl MarginBoxType {
    pub fn from_at_rule_name(name: &str) -> Option<MarginBoxType> {
        MARGIN_BOXES.get(name.to_ascii_lowercase().as_str()).copied()
    }
}

/// A page selector: an optional page-name, plus pseudo-classes (`:first`, `:left`,
/// `:right`, `:blank`, `:nth(An+B)`), per §4.9 step 4's `MatchType` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSelector {
    pub name: Option<String>,
    pub first: bool,
    pub blank: bool,
    pub left: bool,
    pub right: bool,
    pub nth: Option<NthPattern>,
}

/// A parsed rule, per §3's `Rule` tagged variant.
#[derive(Debug, Clone)]
pub enum Rule {
    Style {
        selectors: Vec<ComplexSelector>,
        declarations: Vec<Declaration>,
    },
    Import {
        url: String,
        media: MediaQueryList,
    },
    Namespace {
        prefix: Option<String>,
        uri: String,
    },
    Media {
        queries: MediaQueryList,
        rules: Vec<Rule>,
    },
    FontFace {
        declarations: Vec<Declaration>,
    },
    CounterStyle {
        name: String,
        declarations: Vec<Declaration>,
    },
    Page {
        selectors: Vec<PageSelector>,
        declarations: Vec<Declaration>,
        margins: Vec<(MarginBoxType, Vec<Declaration>)>,
    },
}

/// Parses one declaration body (used for style rules, `@font-face`, `@counter-style`, and
/// page/margin-box bodies). `allow_important` is false inside `@font-face`/`@counter-style`
/// per §4.5.
pub struct DeclParser<'a> {
    pub session: &'a Session,
    pub allow_important: bool,
}

impl<'a, 'i> cssparser::DeclarationParser<'i> for DeclParser<'a> {
    type Declaration = Declaration;
    type Error = ValueErrorKind;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _declaration_start: &ParserState,
    ) -> Result<Declaration, ParseError<'i>> {
        let start = input.position();
        while input.next().is_ok() {}
        let raw_all = input.slice_from(start).to_string();

        let important = if self.allow_important {
            cssparser::parse_important(input).is_ok()
        } else {
            false
        };

        let raw_value = if important {
            raw_all
                .rsplit_once("!important")
                .map(|(v, _)| v.trim_end().to_string())
                .unwrap_or(raw_all.trim().to_string())
        } else {
            raw_all.trim().to_string()
        };

        Ok(Declaration {
            name: name.as_ref().to_string(),
            raw_value,
            important,
        })
    }
}

impl<'a, 'i> cssparser::AtRuleParser<'i> for DeclParser<'a> {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ValueErrorKind;
}

impl<'a, 'i> cssparser::QualifiedRuleParser<'i> for DeclParser<'a> {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ValueErrorKind;
}

impl<'a, 'i> RuleBodyItemParser<'i, Declaration, ValueErrorKind> for DeclParser<'a> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parses a `{ ... }` declaration block into `Declaration`s, discarding any declaration
/// that fails to parse (§7 "silent discard"; other declarations in the rule survive).
pub fn parse_declaration_list<'i>(
    input: &mut Parser<'i, '_>,
    session: &Session,
    allow_important: bool,
) -> Vec<Declaration> {
    let mut parser = DeclParser { session, allow_important };
    let mut out = Vec::new();
    let mut iter = RuleBodyParser::new(input, &mut parser);
    while let Some(result) = iter.next() {
        match result {
            Ok(decl) => out.push(decl),
            Err((err, slice)) => {
                session_log!(session, "discarding malformed declaration '{}': {:?}", slice, err.kind);
            }
        }
    }
    out
}

/// Top-level rule parser: at-rules and qualified (style) rules, per §4.5.
pub struct RuleParser<'a> {
    pub session: &'a Session,
    pub import_depth: u32,
}

const MAX_IMPORT_DEPTH: u32 = 256;

pub enum AtRulePrelude {
    Import(String, MediaQueryList),
    Namespace(Option<String>, String),
    Media(MediaQueryList),
    FontFace,
    CounterStyle(String),
    Page(Vec<PageSelector>),
    MarginBox(MarginBoxType),
}

impl<'a, 'i> cssparser::AtRuleParser<'i> for RuleParser<'a> {
    type Prelude = AtRulePrelude;
    type AtRule = Rule;
    type Error = ValueErrorKind;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<AtRulePrelude, ParseError<'i>> {
        match_lower(&name, input, self)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: AtRulePrelude,
        _location: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Rule, ParseError<'i>> {
        match prelude {
            AtRulePrelude::Media(queries) => {
                let rules = parse_rule_list(input, self.session, self.import_depth);
                Ok(Rule::Media { queries, rules })
            }
            AtRulePrelude::FontFace => Ok(Rule::FontFace {
                declarations: parse_declaration_list(input, self.session, false),
            }),
            AtRulePrelude::CounterStyle(name) => Ok(Rule::CounterStyle {
                name,
                declarations: parse_declaration_list(input, self.session, false),
            }),
            AtRulePrelude::Page(selectors) => {
                let (declarations, margins) = parse_page_block(input, self.session);
                Ok(Rule::Page {
                    selectors,
                    declarations,
                    margins,
                })
            }
            AtRulePrelude::MarginBox(_) => unreachable!("margin boxes are parsed inside parse_page_block"),
            AtRulePrelude::Import(..) | AtRulePrelude::Namespace(..) => {
                unreachable!("these at-rules have no block")
            }
        }
    }

    fn rule_without_block(&mut self, prelude: AtRulePrelude, _location: &ParserState) -> Result<Rule, ()> {
        match prelude {
            AtRulePrelude::Import(url, media) => {
                if self.import_depth >= MAX_IMPORT_DEPTH {
                    session_log!(self.session, "ignoring @import: depth {} exceeds cap", self.import_depth);
                    return Err(());
                }
                Ok(Rule::Import { url, media })
            }
            AtRulePrelude::Namespace(prefix, uri) => Ok(Rule::Namespace { prefix, uri }),
            _ => Err(()),
        }
    }
}

fn match_lower<'i, 't>(
    name: &str,
    input: &mut Parser<'i, 't>,
    rp: &RuleParser<'_>,
) -> Result<AtRulePrelude, ParseError<'i>> {
    use cssparser::match_ignore_ascii_case;
    match_ignore_ascii_case! { name,
        "import" => {
            let url = expect_url_or_string(input)?;
            let media = MediaQueryList::parse(input).unwrap_or_else(|_| MediaQueryList::empty());
            Ok(AtRulePrelude::Import(url, media))
        },
        "namespace" => {
            let prefix = input.try_parse(|p| p.expect_ident().map(|s| s.to_string())).ok();
            let uri = expect_url_or_string(input)?;
            Ok(AtRulePrelude::Namespace(prefix, uri))
        },
        "media" => {
            let media = MediaQueryList::parse(input)?;
            Ok(AtRulePrelude::Media(media))
        },
        "font-face" => Ok(AtRulePrelude::FontFace),
        "counter-style" => {
            let loc = input.current_source_location();
            let ident = input.expect_ident()?.to_string();
            if ident.eq_ignore_ascii_case("none") {
                return Err(loc.new_custom_error(ValueErrorKind::value_error("'none' is not a valid counter-style name")));
            }
            Ok(AtRulePrelude::CounterStyle(ident))
        },
        "page" => {
            let selectors = parse_page_selector_list(input)?;
            Ok(AtRulePrelude::Page(selectors))
        },
        _ => {
            let _ = rp;
            Err(input.new_custom_error(ValueErrorKind::parse_error("unknown at-rule")))
        },
    }
}

fn expect_url_or_string<'i>(input: &mut Parser<'i, '_>) -> Result<String, ParseError<'i>> {
    let loc = input.current_source_location();
    match input.next()?.clone() {
        cssparser::Token::UnquotedUrl(ref s) => Ok(s.to_string()),
        cssparser::Token::QuotedString(ref s) => Ok(s.to_string()),
        cssparser::Token::Function(ref f) if f.eq_ignore_ascii_case("url") => {
            input.parse_nested_block(|p| {
                p.expect_string().map(|s| s.to_string()).map_err(ParseError::from)
            })
        }
        _ => Err(loc.new_custom_error(ValueErrorKind::parse_error("expected a url or string"))),
    }
}

fn parse_page_selector_list<'i>(input: &mut Parser<'i, '_>) -> Result<Vec<PageSelector>, ParseError<'i>> {
    let mut out = Vec::new();
    loop {
        input.skip_whitespace();
        if input.is_exhausted() {
            break;
        }
        let mut sel = PageSelector::default();
        if let Ok(name) = input.try_parse(|p| p.expect_ident().map(|s| s.to_string())) {
            sel.name = Some(name);
        }
        loop {
            if input.try_parse(|p| p.expect_colon()).is_err() {
                break;
            }
            if let Ok(name) = input.try_parse(|p| p.expect_function().map(|s| s.to_string())) {
                if !name.eq_ignore_ascii_case("nth") {
                    return Err(input.new_custom_error(ValueErrorKind::parse_error("unknown page pseudo-class")));
                }
                sel.nth = Some(input.parse_nested_block(parse_nth)?);
                continue;
            }
            let ident = input.expect_ident()?.to_string();
            match ident.to_ascii_lowercase().as_str() {
                "first" => sel.first = true,
                "blank" => sel.blank = true,
                "left" => sel.left = true,
                "right" => sel.right = true,
                _ => return Err(input.new_custom_error(ValueErrorKind::parse_error("unknown page pseudo-class"))),
            }
        }
        out.push(sel);
        if input.try_parse(|p| p.expect_comma()).is_err() {
            break;
        }
    }
    if out.is_empty() {
        out.push(PageSelector::default());
    }
    Ok(out)
}

fn parse_page_block<'i>(
    input: &mut Parser<'i, '_>,
    session: &Session,
) -> (Vec<Declaration>, Vec<(MarginBoxType, Vec<Declaration>)>) {
    let mut declarations = Vec::new();
    let mut margins = Vec::new();
    // Margin-box at-rules interleave with declarations; drive a small manual loop instead
    // of reusing `RuleBodyParser` since margin boxes are blocks, not plain declarations.
    loop {
        input.skip_whitespace();
        if input.is_exhausted() {
            break;
        }
        let state = input.state();
        if let Ok(at_name) = input.try_parse(|p| p.expect_at_keyword().map(|s| s.to_string())) {
            if let Some(margin_ty) = MarginBoxType::from_at_rule_name(&at_name) {
                if let Ok(_) = input.try_parse(|p| p.expect_curly_bracket_block()) {
                    let decls = input
                        .parse_nested_block(|p| Ok::<_, ParseError<'_>>(parse_declaration_list(p, session, false)))
                        .unwrap_or_default();
                    margins.push((margin_ty, decls));
                    continue;
                }
            }
            session_log!(session, "discarding unknown margin box @{}", at_name);
            input.reset(&state);
        }

        // Otherwise parse one declaration up to the next `;` or end.
        let decl_start = input.state();
        if let Ok(name) = input.try_parse(|p| p.expect_ident().map(|s| s.to_string())) {
            if input.try_parse(|p| p.expect_colon()).is_ok() {
                let value_start = input.position();
                while !input.is_exhausted()
                    && input
                        .try_parse(|p| p.expect_semicolon())
                        .is_err()
                {
                    if input.next().is_err() {
                        break;
                    }
                }
                let raw_all = input.slice_from(value_start).to_string();
                let important = raw_all.to_ascii_lowercase().contains("!important");
                let raw_value = if important {
                    raw_all.replace("!important", "").trim().to_string()
                } else {
                    raw_all.trim().to_string()
                };
                declarations.push(Declaration {
                    name,
                    raw_value,
                    important,
                });
                continue;
            }
        }
        input.reset(&decl_start);
        if input.next().is_err() {
            break;
        }
    }
    (declarations, margins)
}

impl<'a, 'i> cssparser::QualifiedRuleParser<'i> for RuleParser<'a> {
    type Prelude = Vec<ComplexSelector>;
    type QualifiedRule = Rule;
    type Error = ValueErrorKind;

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Vec<ComplexSelector>, ParseError<'i>> {
        let start = input.position();
        while input.next().is_ok() {}
        let text = input.slice_from(start).to_string();
        parse_selector_list(&text)
            .map(|list| list.selectors)
            .map_err(|e| match e.kind {
                ParseErrorKind::Custom(c) => input.new_custom_error(c),
                _ => input.new_custom_error(ValueErrorKind::parse_error("invalid selector")),
            })
    }

    fn parse_block<'t>(
        &mut self,
        selectors: Vec<ComplexSelector>,
        _location: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Rule, ParseError<'i>> {
        let declarations = parse_declaration_list(input, self.session, true);
        Ok(Rule::Style { selectors, declarations })
    }
}

impl<'a, 'i> RuleBodyItemParser<'i, Rule, ValueErrorKind> for RuleParser<'a> {
    fn parse_qualified(&self) -> bool {
        true
    }
    fn parse_declarations(&self) -> bool {
        false
    }
}

/// Parses a top-level (or nested, inside `@media`) rule list, per §4.5's top-level loop.
/// CDO/CDC tokens are skipped by `cssparser::StyleSheetParser`; a malformed rule prelude
/// or block is dropped and surrounding rules survive (§7).
pub fn parse_rule_list<'i>(input: &mut Parser<'i, '_>, session: &Session, import_depth: u32) -> Vec<Rule> {
    let mut parser = RuleParser { session, import_depth: import_depth + 1 };
    let mut out = Vec::new();
    let mut iter = StyleSheetParser::new(input, &mut parser);
    while let Some(result) = iter.next() {
        match result {
            Ok(rule) => out.push(rule),
            Err((err, slice)) => {
                session_log!(session, "discarding malformed rule '{}': {:?}", slice, err.kind);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    fn parse(css: &str) -> Vec<Rule> {
        let session = Session::quiet();
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        parse_rule_list(&mut parser, &session, 0)
    }

    #[test]
    fn parses_a_simple_style_rule() {
        let rules = parse("p { color: blue; }");
        assert_eq!(rules.len(), 1);
        match &rules[0] {
            Rule::Style { selectors, declarations } => {
                assert_eq!(selectors.len(), 1);
                assert_eq!(declarations.len(), 1);
                assert_eq!(declarations[0].name, "color");
                assert_eq!(declarations[0].raw_value.trim(), "blue");
            }
            _ => panic!("expected a style rule"),
        }
    }

    #[test]
    fn important_flag_is_stripped_from_value() {
        let rules = parse("p { color: blue !important; }");
        match &rules[0] {
            Rule::Style { declarations, .. } => {
                assert!(declarations[0].important);
                assert_eq!(declarations[0].raw_value.trim(), "blue");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn malformed_declaration_is_discarded_others_survive() {
        let rules = parse("p { color: ; font-size: 12px; }");
        match &rules[0] {
            Rule::Style { declarations, .. } => {
                assert_eq!(declarations.len(), 1);
                assert_eq!(declarations[0].name, "font-size");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn parses_media_rule_with_nested_rules() {
        let rules = parse("@media (min-width: 600px) { p { color: red; } }");
        match &rules[0] {
            Rule::Media { rules, .. } => assert_eq!(rules.len(), 1),
            _ => panic!("expected a media rule"),
        }
    }

    #[test]
    fn parses_counter_style_rule() {
        let rules = parse("@counter-style thumbs { system: cyclic; symbols: \"\\1F44D\"; }");
        match &rules[0] {
            Rule::CounterStyle { name, declarations } => {
                assert_eq!(name, "thumbs");
                assert_eq!(declarations.len(), 2);
            }
            _ => panic!("expected a counter-style rule"),
        }
    }

    #[test]
    fn parses_page_rule_with_margin_box() {
        let rules = parse("@page { margin: 1in; @top-center { content: \"Title\"; } }");
        match &rules[0] {
            Rule::Page { declarations, margins, .. } => {
                assert_eq!(declarations.len(), 1);
                assert_eq!(margins.len(), 1);
                assert_eq!(margins[0].0, MarginBoxType::TopCenter);
            }
            _ => panic!("expected a page rule"),
        }
    }

    #[test]
    fn custom_property_declaration_kept_verbatim() {
        let rules = parse("p { --x: 10px; }");
        match &rules[0] {
            Rule::Style { declarations, .. } => assert!(declarations[0].is_custom_property()),
            _ => panic!(),
        }
    }

    #[test]
    fn parses_nth_page_pseudo_class() {
        let rules = parse("@page :nth(2n+1) { size: a4; }");
        match &rules[0] {
            Rule::Page { selectors, .. } => {
                assert_eq!(selectors.len(), 1);
                assert_eq!(selectors[0].nth, Some(crate::values::nth::NthPattern::new(2, 1)));
            }
            _ => panic!("expected a page rule"),
        }
    }
}
