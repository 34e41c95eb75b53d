//! C7: the stylesheet index. Buckets rules by the rightmost compound selector's most
//! selective simple selector (id > class > attribute > tag > universal), the same way
//! `librsvg::css::Stylesheet` keeps a flat `qualified_rules` list but organized so the
//! cascade doesn't have to test every rule in the sheet against every element.

use std::collections::HashMap;

use crate::error::StylesheetError;
use crate::media::{MediaQueryList, Viewport};
use crate::rules::{parse_rule_list, Declaration, MarginBoxType, PageSelector, Rule};
use crate::selector::ast::SimpleSelector;
use crate::selector::specificity::{complex_specificity, Specificity};
use crate::selector::ComplexSelector;
use crate::session::{session_log, Session};

/// Where a rule came from, used by the cascade's precedence tuple (§4.8 step 4). Ordering
/// (lowest to highest): UserAgent, User, Author; Inline and Presentation are synthesized
/// per element rather than read from a stylesheet, and are folded in by the cascade itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Origin {
    UserAgent,
    User,
    Author,
    Inline,
    Presentation,
}

/// One bucketed candidate: a rule, the one selector within it that placed it in this
/// bucket, and that selector's specificity and global position.
#[derive(Debug, Clone)]
pub struct RuleData {
    pub selector: ComplexSelector,
    pub declarations: Vec<Declaration>,
    pub specificity: Specificity,
    pub position: u32,
    pub origin: Origin,
    /// The stack of enclosing `@media`/`@import` conditions this rule was nested under,
    /// outermost first. Every entry must match the caller's `Viewport` (§4.6: "evaluated
    /// against the viewport at application time", not at parse time) for the rule to apply.
    pub media: Vec<MediaQueryList>,
}

#[derive(Debug, Clone)]
pub struct PageRuleData {
    pub selectors: Vec<PageSelector>,
    pub declarations: Vec<Declaration>,
    pub margins: Vec<(MarginBoxType, Vec<Declaration>)>,
    pub position: u32,
    pub origin: Origin,
    pub media: Vec<MediaQueryList>,
}

/// A parsed, indexed stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub origin_default: Origin,
    by_id: HashMap<String, Vec<RuleData>>,
    by_class: HashMap<String, Vec<RuleData>>,
    by_attr: HashMap<String, Vec<RuleData>>,
    by_tag: HashMap<String, Vec<RuleData>>,
    universal: Vec<RuleData>,
    pseudo_element: Vec<RuleData>,
    pub pages: Vec<PageRuleData>,
    pub font_face_rules: Vec<(Vec<Declaration>, Vec<MediaQueryList>)>,
    pub counter_style_rules: Vec<(String, Vec<Declaration>, Vec<MediaQueryList>)>,
}

impl Default for Origin {
    fn default() -> Origin {
        Origin::Author
    }
}

const MAX_IMPORT_DEPTH: u32 = 256;

impl Stylesheet {
    pub fn empty(origin: Origin) -> Stylesheet {
        Stylesheet {
            origin_default: origin,
            ..Default::default()
        }
    }

    /// Parses `css` and indexes every rule it contains (recursing into `@import` and
    /// `@media`), using `position` as the starting value of the global order counter and
    /// returning the counter's new value so a caller building up several sheets in sequence
    /// keeps a single, globally meaningful order (§4.7).
    pub fn parse(
        css: &str,
        origin: Origin,
        session: &Session,
        mut position: u32,
        import_loader: &dyn Fn(&str) -> Option<String>,
    ) -> (Stylesheet, u32) {
        let mut sheet = Stylesheet::empty(origin);
        position = sheet.add_rules_from_string(css, session, 0, &mut position, import_loader, &[]);
        (sheet, position)
    }

    fn add_rules_from_string(
        &mut self,
        css: &str,
        session: &Session,
        import_depth: u32,
        position: &mut u32,
        import_loader: &dyn Fn(&str) -> Option<String>,
        media_stack: &[MediaQueryList],
    ) -> u32 {
        let mut input = cssparser::ParserInput::new(css);
        let mut parser = cssparser::Parser::new(&mut input);
        let rules = parse_rule_list(&mut parser, session, import_depth);
        self.index_rules(rules, session, import_depth, position, import_loader, media_stack);
        *position
    }

    /// Indexes `rules`, tagging each one with `media_stack` — the (still-unevaluated)
    /// stack of enclosing `@media`/`@import` conditions — instead of testing it against a
    /// viewport here. §4.6 requires media queries to be "evaluated against the viewport at
    /// application time", so the actual match happens later, in `candidates`/`style_for_page`
    /// against a caller-supplied `Viewport`.
    fn index_rules(
        &mut self,
        rules: Vec<Rule>,
        session: &Session,
        import_depth: u32,
        position: &mut u32,
        import_loader: &dyn Fn(&str) -> Option<String>,
        media_stack: &[MediaQueryList],
    ) {
        for rule in rules {
            match rule {
                Rule::Style { selectors, declarations } => {
                    let pos = *position;
                    *position += 1;
                    for selector in selectors {
                        self.insert_style_rule(selector, declarations.clone(), pos, media_stack.to_vec());
                    }
                }
                Rule::Import { url, media } => {
                    if import_depth + 1 >= MAX_IMPORT_DEPTH {
                        session_log!(session, "ignoring @import \"{}\": depth cap reached", url);
                        continue;
                    }
                    match import_loader(&url) {
                        Some(imported_css) => {
                            let mut child_stack = media_stack.to_vec();
                            child_stack.push(media);
                            self.add_rules_from_string(
                                &imported_css,
                                session,
                                import_depth + 1,
                                position,
                                import_loader,
                                &child_stack,
                            );
                        }
                        None => {
                            session_log!(session, "could not resolve @import \"{}\"", url);
                        }
                    }
                }
                Rule::Namespace { .. } => {
                    // Namespace declarations affect selector parsing, which has already
                    // happened by the time rules reach the index; recorded here only for
                    // completeness of the rule stream.
                }
                Rule::Media { queries, rules } => {
                    let mut child_stack = media_stack.to_vec();
                    child_stack.push(queries);
                    self.index_rules(rules, session, import_depth, position, import_loader, &child_stack);
                }
                Rule::FontFace { declarations } => {
                    self.font_face_rules.push((declarations, media_stack.to_vec()))
                }
                Rule::CounterStyle { name, declarations } => {
                    self.counter_style_rules.push((name, declarations, media_stack.to_vec()))
                }
                Rule::Page {
                    selectors,
                    declarations,
                    margins,
                } => {
                    let pos = *position;
                    *position += 1;
                    self.pages.push(PageRuleData {
                        selectors,
                        declarations,
                        margins,
                        position: pos,
                        origin: self.origin_default,
                        media: media_stack.to_vec(),
                    });
                }
            }
        }
    }

    fn insert_style_rule(
        &mut self,
        selector: ComplexSelector,
        declarations: Vec<Declaration>,
        position: u32,
        media: Vec<MediaQueryList>,
    ) {
        let specificity = complex_specificity(&selector);
        let rightmost = selector.rightmost();
        let origin = self.origin_default;

        let data = RuleData {
            selector,
            declarations,
            specificity,
            position,
            origin,
            media,
        };

        if rightmost.pseudo_element().is_some() {
            self.pseudo_element.push(data);
            return;
        }

        for simple in &rightmost.simples {
            match simple {
                SimpleSelector::Id(id) => {
                    self.by_id.entry(id.clone()).or_default().push(data);
                    return;
                }
                _ => {}
            }
        }
        for simple in &rightmost.simples {
            if let SimpleSelector::Class(c) = simple {
                self.by_class.entry(c.clone()).or_default().push(data);
                return;
            }
        }
        for simple in &rightmost.simples {
            match simple {
                SimpleSelector::AttrHas(a)
                | SimpleSelector::AttrEquals(a)
                | SimpleSelector::AttrIncludes(a)
                | SimpleSelector::AttrDashMatch(a)
                | SimpleSelector::AttrPrefix(a)
                | SimpleSelector::AttrSuffix(a)
                | SimpleSelector::AttrSubstring(a) => {
                    self.by_attr.entry(a.name.clone()).or_default().push(data);
                    return;
                }
                _ => {}
            }
        }
        for simple in &rightmost.simples {
            if let SimpleSelector::Type(tag) = simple {
                self.by_tag.entry(tag.to_ascii_lowercase()).or_default().push(data);
                return;
            }
        }
        self.universal.push(data);
    }

    /// Collects candidate rules for an element with the given id/classes/attribute names
    /// and tag, per §4.8 step 1. `pseudo` selects the separate pseudo-element bucket.
    /// Rules nested under an `@media`/`@import` condition that doesn't match `viewport`
    /// are filtered out here, at application time, per §4.6.
    pub fn candidates(
        &self,
        id: Option<&str>,
        classes: &[String],
        attr_names: &[String],
        tag: &str,
        pseudo: bool,
        viewport: &Viewport,
    ) -> Vec<&RuleData> {
        let mut out = Vec::new();
        if pseudo {
            out.extend(self.pseudo_element.iter());
            out.retain(|rd| rd.media.iter().all(|m| m.matches(viewport)));
            return out;
        }
        if let Some(id) = id {
            if let Some(v) = self.by_id.get(id) {
                out.extend(v.iter());
            }
        }
        for c in classes {
            if let Some(v) = self.by_class.get(c) {
                out.extend(v.iter());
            }
        }
        for a in attr_names {
            if let Some(v) = self.by_attr.get(a) {
                out.extend(v.iter());
            }
        }
        if let Some(v) = self.by_tag.get(&tag.to_ascii_lowercase()) {
            out.extend(v.iter());
        }
        out.extend(self.universal.iter());
        out.retain(|rd| rd.media.iter().all(|m| m.matches(viewport)));
        out
    }

    pub fn import_depth_error() -> StylesheetError {
        StylesheetError::ImportDepthExceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_imports(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn id_selector_buckets_by_id() {
        let session = Session::quiet();
        let (sheet, _) = Stylesheet::parse("#main { color: red; }", Origin::Author, &session, 0, &no_imports);
        let candidates = sheet.candidates(Some("main"), &[], &[], "div", false, &Viewport::default());
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn class_and_tag_selectors_land_in_expected_buckets() {
        let session = Session::quiet();
        let (sheet, _) =
            Stylesheet::parse("p { color: blue; } .warn { color: red; }", Origin::Author, &session, 0, &no_imports);
        assert_eq!(sheet.candidates(None, &[], &[], "p", false, &Viewport::default()).len(), 1);
        assert_eq!(
            sheet
                .candidates(None, &["warn".to_string()], &[], "span", false, &Viewport::default())
                .len(),
            1
        );
    }

    #[test]
    fn position_counter_is_monotonic_across_rules() {
        let session = Session::quiet();
        let (sheet, next) =
            Stylesheet::parse("a {} b {} c {}", Origin::Author, &session, 0, &no_imports);
        assert_eq!(next, 3);
        let positions: Vec<u32> = sheet
            .universal
            .iter()
            .map(|r| r.position)
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn media_query_gates_nested_rules() {
        let session = Session::quiet();
        let (sheet, _) = Stylesheet::parse(
            "@media (min-width: 99999px) { p { color: red; } }",
            Origin::Author,
            &session,
            0,
            &no_imports,
        );
        assert!(sheet
            .candidates(None, &[], &[], "p", false, &Viewport::default())
            .is_empty());
    }

    #[test]
    fn media_query_is_deferred_to_application_time() {
        let session = Session::quiet();
        let (sheet, _) = Stylesheet::parse(
            "@media (min-width: 100px) { p { color: red; } }",
            Origin::Author,
            &session,
            0,
            &no_imports,
        );
        let narrow = Viewport {
            width_px: 50.0,
            ..Viewport::default()
        };
        let wide = Viewport {
            width_px: 200.0,
            ..Viewport::default()
        };
        assert!(sheet.candidates(None, &[], &[], "p", false, &narrow).is_empty());
        assert_eq!(sheet.candidates(None, &[], &[], "p", false, &wide).len(), 1);
    }

    #[test]
    fn font_face_and_counter_style_rules_are_collected() {
        let session = Session::quiet();
        let (sheet, _) = Stylesheet::parse(
            "@font-face { font-family: Foo; src: url(foo.woff); } @counter-style thumbs { system: cyclic; symbols: \"a\"; }",
            Origin::Author,
            &session,
            0,
            &no_imports,
        );
        assert_eq!(sheet.font_face_rules.len(), 1);
        assert_eq!(sheet.counter_style_rules.len(), 1);
    }

    #[test]
    fn import_depth_cap_ignores_deeply_nested_imports() {
        let session = Session::quiet();
        fn loader(_: &str) -> Option<String> {
            Some("@import url(x.css);".to_string())
        }
        let (sheet, _) = Stylesheet::parse("@import url(x.css);", Origin::Author, &session, 0, &loader);
        // Should terminate (not infinitely recurse) and simply yield an empty sheet.
        assert!(sheet.universal.is_empty());
    }
}
