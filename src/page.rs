//! Page-selector matching and margin-box cascade (§4.9 step 4, §6). No teacher analog
//! (librsvg has no paged model); grounded on `cascade.rs`'s own candidate-collection and
//! precedence-collapse shape, generalized from "element + stylesheet buckets" to "page
//! query + a stylesheet's flat page-rule list".

use std::collections::HashMap;

use crate::cascade::{origin_rank, Precedence};
use crate::media::Viewport;
use crate::rules::{Declaration, MarginBoxType, PageSelector};
use crate::stylesheet::{Origin, PageRuleData, Stylesheet};

/// What a particular page being laid out actually is, matched against every stylesheet's
/// `@page` selectors (§4.9 step 4's `MatchType` table). `index` is the page's 1-based
/// position in the running page count, matched against `:nth(An+B)`.
#[derive(Debug, Clone, Default)]
pub struct PageQuery<'a> {
    pub name: Option<&'a str>,
    pub first: bool,
    pub blank: bool,
    pub left: bool,
    pub right: bool,
    pub index: i32,
}

/// True if `selector` accepts `query`: every condition the selector declares must hold of
/// the page being matched. A selector with no conditions at all (the bare `@page {}`)
/// matches everything.
pub fn matches(selector: &PageSelector, query: &PageQuery) -> bool {
    if let Some(name) = &selector.name {
        if query.name != Some(name.as_str()) {
            return false;
        }
    }
    if selector.first && !query.first {
        return false;
    }
    if selector.blank && !query.blank {
        return false;
    }
    if selector.left && !query.left {
        return false;
    }
    if selector.right && !query.right {
        return false;
    }
    if let Some(nth) = selector.nth {
        if !nth.matches(query.index) {
            return false;
        }
    }
    true
}

/// A named-page selector always outranks one made only of pseudo-classes; among those,
/// more pseudo-classes outrank fewer (mirrors `ComplexSelector` specificity's id > class >
/// type ordering, generalized to this selector's much smaller vocabulary).
fn specificity(selector: &PageSelector) -> u32 {
    let name_points = if selector.name.is_some() { 1 } else { 0 };
    let pseudo_points = selector.first as u32
        + selector.blank as u32
        + selector.left as u32
        + selector.right as u32
        + selector.nth.is_some() as u32;
    name_points * 1000 + pseudo_points
}

struct Candidate {
    declaration: Declaration,
    precedence: Precedence,
}

fn collapse(candidates: Vec<Candidate>) -> HashMap<String, Declaration> {
    let mut winners: HashMap<String, Candidate> = HashMap::new();
    for candidate in candidates {
        let name = candidate.declaration.name.clone();
        match winners.get(&name) {
            Some(existing) if existing.precedence >= candidate.precedence => {}
            _ => {
                winners.insert(name, candidate);
            }
        }
    }
    winners.into_iter().map(|(name, c)| (name, c.declaration)).collect()
}

/// §6's `styleForPage`: the winning declarations for the page box itself (not any margin
/// box), collapsed across every stylesheet's matching `@page` rules by origin/importance/
/// specificity/position, exactly like an element's ordinary cascade (§4.8 step 4).
pub fn style_for_page(
    sheets: &[(&Stylesheet, Origin)],
    query: &PageQuery,
    viewport: &Viewport,
) -> HashMap<String, Declaration> {
    let mut candidates = Vec::new();

    for (sheet, origin) in sheets {
        for (position, page_rule) in sheet.pages.iter().enumerate() {
            if !page_rule.media.iter().all(|m| m.matches(viewport)) {
                continue;
            }
            for selector in &page_rule.selectors {
                if matches(selector, query) {
                    push_candidates(&mut candidates, &page_rule.declarations, *origin, position as u32, selector);
                }
            }
            if page_rule.selectors.is_empty() && matches(&PageSelector::default(), query) {
                push_candidates(&mut candidates, &page_rule.declarations, *origin, position as u32, &PageSelector::default());
            }
        }
    }

    collapse(candidates)
}

/// §6's `styleForPageMargin`: the winning declarations for one named margin box, within the
/// `@page` rules that also match `query` (a margin box only exists inside a matching page).
pub fn style_for_page_margin(
    sheets: &[(&Stylesheet, Origin)],
    query: &PageQuery,
    margin: MarginBoxType,
    viewport: &Viewport,
) -> Option<HashMap<String, Declaration>> {
    let mut candidates = Vec::new();
    let mut any_box_declared = false;

    for (sheet, origin) in sheets {
        for (position, page_rule) in sheet.pages.iter().enumerate() {
            if !page_rule.media.iter().all(|m| m.matches(viewport)) {
                continue;
            }
            let page_matches = page_rule.selectors.is_empty()
                || page_rule.selectors.iter().any(|s| matches(s, query));
            if !page_matches {
                continue;
            }
            let best_selector = page_rule
                .selectors
                .iter()
                .filter(|s| matches(s, query))
                .max_by_key(|s| specificity(s));

            for (box_ty, declarations) in &page_rule.margins {
                if *box_ty != margin {
                    continue;
                }
                any_box_declared = true;
                let selector = best_selector.cloned().unwrap_or_default();
                push_candidates(&mut candidates, declarations, *origin, position as u32, &selector);
            }
        }
    }

    if !any_box_declared {
        return None;
    }

    Some(collapse(candidates))
}

fn push_candidates(
    candidates: &mut Vec<Candidate>,
    declarations: &[Declaration],
    origin: Origin,
    position: u32,
    selector: &PageSelector,
) {
    let spec = specificity(selector);
    for decl in declarations {
        candidates.push(Candidate {
            declaration: decl.clone(),
            precedence: Precedence {
                important: decl.important,
                origin_rank: origin_rank(origin, decl.important),
                specificity: spec,
                position,
            },
        });
    }
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

    fn page_rule(selectors: Vec<PageSelector>, declarations: Vec<Declaration>) -> PageRuleData {
        PageRuleData {
            selectors,
            declarations,
            margins: vec![],
            position: 0,
            origin: Origin::Author,
            media: vec![],
        }
    }

    #[test]
    fn named_page_selector_outranks_pseudo_class_only() {
        let named = PageSelector {
            name: Some("chapter".to_string()),
            ..Default::default()
        };
        let first = PageSelector {
            first: true,
            ..Default::default()
        };
        assert!(specificity(&named) > specificity(&first));
    }

    #[test]
    fn bare_page_rule_matches_every_query() {
        let query = PageQuery {
            name: Some("chapter"),
            first: true,
            ..Default::default()
        };
        assert!(matches(&PageSelector::default(), &query));
    }

    #[test]
    fn named_selector_rejects_a_differently_named_page() {
        let selector = PageSelector {
            name: Some("chapter".to_string()),
            ..Default::default()
        };
        let query = PageQuery {
            name: Some("appendix"),
            ..Default::default()
        };
        assert!(!matches(&selector, &query));
    }

    #[test]
    fn style_for_page_collects_matching_author_declarations() {
        let mut sheet = Stylesheet::empty(Origin::Author);
        sheet.pages.push(page_rule(
            vec![PageSelector {
                first: true,
                ..Default::default()
            }],
            vec![decl("size", "a4")],
        ));
        let query = PageQuery {
            first: true,
            ..Default::default()
        };
        let style = style_for_page(&[(&sheet, Origin::Author)], &query, &Viewport::default());
        assert_eq!(style.get("size").map(|d| d.raw_value.as_str()), Some("a4"));
    }

    #[test]
    fn style_for_page_margin_returns_none_when_box_never_declared() {
        let mut sheet = Stylesheet::empty(Origin::Author);
        sheet.pages.push(page_rule(vec![], vec![decl("size", "a4")]));
        let query = PageQuery::default();
        assert!(style_for_page_margin(
            &[(&sheet, Origin::Author)],
            &query,
            MarginBoxType::TopCenter,
            &Viewport::default()
        )
        .is_none());
    }

    #[test]
    fn nth_page_selector_matches_against_running_page_index() {
        use crate::values::nth::NthPattern;

        let selector = PageSelector {
            nth: Some(NthPattern::new(2, 1)),
            ..Default::default()
        };
        // 2n+1: odd pages.
        for index in 1..=5 {
            let query = PageQuery {
                index,
                ..Default::default()
            };
            assert_eq!(matches(&selector, &query), index % 2 == 1, "index={index}");
        }
    }

    #[test]
    fn style_for_page_respects_nth_page_across_a_running_count() {
        let mut sheet = Stylesheet::empty(Origin::Author);
        sheet.pages.push(page_rule(
            vec![PageSelector {
                nth: Some(crate::values::nth::NthPattern::new(2, 0)),
                ..Default::default()
            }],
            vec![decl("background", "gray")],
        ));

        let odd_query = PageQuery {
            index: 1,
            ..Default::default()
        };
        let even_query = PageQuery {
            index: 2,
            ..Default::default()
        };
        assert!(style_for_page(&[(&sheet, Origin::Author)], &odd_query, &Viewport::default())
            .get("background")
            .is_none());
        assert_eq!(
            style_for_page(&[(&sheet, Origin::Author)], &even_query, &Viewport::default())
                .get("background")
                .map(|d| d.raw_value.as_str()),
            Some("gray")
        );
    }
}
