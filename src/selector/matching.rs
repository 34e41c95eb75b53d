//! C9: matching a `Selector` against a DOM node, and the minimal DOM interface (§6) that
//! matching is written against.
//!
//! `librsvg::css::RsvgElement` shows the same shape of trait (`opaque()`,
//! `parent_element()`, `prev_sibling_element()`, `has_local_name()`, `attr_matches()`,
//! `match_non_ts_pseudo_class()`, …) built on top of `selectors::Element`; this crate
//! defines its own, smaller trait instead of depending on the `selectors` crate, because
//! the cascade and the testable properties in §8 need direct control over the specificity
//! and `:has()` DFS behavior that a `selectors`-crate-provided matcher would hide.

use super::ast::{AttrCaseSensitivity, Combinator, ComplexSelector, CompoundSelector, PseudoElement, SimpleSelector};

/// The DOM interface consumed by the matcher (§6). Implementors are free to use whatever
/// node representation they like; the matcher only ever calls these methods.
pub trait Element: Sized + Clone {
    fn parent(&self) -> Option<Self>;
    fn first_child(&self) -> Option<Self>;
    fn prev_sibling(&self) -> Option<Self>;
    fn next_sibling(&self) -> Option<Self>;

    fn namespace_uri(&self) -> Option<&str>;
    fn tag_name(&self) -> &str;

    fn id(&self) -> Option<&str>;
    fn class_names(&self) -> &[String];

    /// `case_insensitive_name_lookup` is true for HTML documents (attribute *names* are
    /// looked up case-insensitively there; values still respect the selector's own case
    /// flag).
    fn find_attribute(&self, name: &str, case_insensitive_name_lookup: bool) -> Option<&str>;

    fn lang(&self) -> Option<&str>;

    /// False for HTML elements (tag/attribute-name case folds), true otherwise (§4.4, §4.9).
    fn is_case_sensitive(&self) -> bool;
}

/// A query for a specific pseudo-element, or "no pseudo-element" for matching a plain
/// element (§4.9 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoQuery {
    None,
    Element(PseudoElementQuery),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoElementQuery {
    Before,
    After,
    Marker,
    FirstLetter,
    FirstLine,
}

fn pseudo_eq(a: &PseudoElement, b: PseudoElementQuery) -> bool {
    matches!(
        (a, b),
        (PseudoElement::Before, PseudoElementQuery::Before)
            | (PseudoElement::After, PseudoElementQuery::After)
            | (PseudoElement::Marker, PseudoElementQuery::Marker)
            | (PseudoElement::FirstLetter, PseudoElementQuery::FirstLetter)
            | (PseudoElement::FirstLine, PseudoElementQuery::FirstLine)
    )
}

/// Matches `selector` against `element`, per §4.9.
pub fn matches<E: Element>(selector: &ComplexSelector, element: &E, pseudo: PseudoQuery) -> bool {
    let rightmost = selector.rightmost();
    match (rightmost.pseudo_element(), pseudo) {
        (Some(pe), PseudoQuery::Element(q)) if pseudo_eq(pe, q) => {}
        (None, PseudoQuery::None) => {}
        _ => return false,
    }

    if !compound_matches(rightmost, element) {
        return false;
    }

    match_ancestor_chain(&selector.compounds, selector.compounds.len() - 1, element)
}

fn match_ancestor_chain<E: Element>(compounds: &[(Combinator, CompoundSelector)], index: usize, element: &E) -> bool {
    if index == 0 {
        return true;
    }
    let (combinator, _current) = &compounds[index];
    let (_, prev_compound) = &compounds[index - 1];

    match combinator {
        Combinator::None => unreachable!("only the first compound has Combinator::None"),
        Combinator::Child => match element.parent() {
            Some(parent) => {
                compound_matches(prev_compound, &parent) && match_ancestor_chain(compounds, index - 1, &parent)
            }
            None => false,
        },
        Combinator::Descendant => {
            let mut cur = element.parent();
            while let Some(ancestor) = cur {
                if compound_matches(prev_compound, &ancestor) && match_ancestor_chain(compounds, index - 1, &ancestor)
                {
                    return true;
                }
                cur = ancestor.parent();
            }
            false
        }
        Combinator::DirectAdjacent => match element.prev_sibling() {
            Some(sib) => compound_matches(prev_compound, &sib) && match_ancestor_chain(compounds, index - 1, &sib),
            None => false,
        },
        Combinator::IndirectAdjacent => {
            let mut cur = element.prev_sibling();
            while let Some(sib) = cur {
                if compound_matches(prev_compound, &sib) && match_ancestor_chain(compounds, index - 1, &sib) {
                    return true;
                }
                cur = sib.prev_sibling();
            }
            false
        }
    }
}

fn compound_matches<E: Element>(compound: &CompoundSelector, element: &E) -> bool {
    compound.simples.iter().all(|s| simple_matches(s, element))
}

fn simple_matches<E: Element>(simple: &SimpleSelector, element: &E) -> bool {
    match simple {
        SimpleSelector::Universal | SimpleSelector::Namespace(_) => true,
        SimpleSelector::Type(name) => {
            if element.is_case_sensitive() {
                element.tag_name() == name
            } else {
                element.tag_name().eq_ignore_ascii_case(name)
            }
        }
        SimpleSelector::Id(id) => element.id() == Some(id.as_str()),
        SimpleSelector::Class(class) => element.class_names().iter().any(|c| c == class),
        SimpleSelector::AttrHas(attr) => element.find_attribute(&attr.name, !element.is_case_sensitive()).is_some(),
        SimpleSelector::AttrEquals(attr) => attr_value_matches(element, attr, |v, want, ci| str_eq(v, want, ci)),
        SimpleSelector::AttrIncludes(attr) => {
            attr_value_matches(element, attr, |v, want, ci| v.split_whitespace().any(|tok| str_eq(tok, want, ci)))
        }
        SimpleSelector::AttrDashMatch(attr) => attr_value_matches(element, attr, |v, want, ci| {
            str_eq(v, want, ci) || v.len() > want.len() && str_eq(&v[..want.len()], want, ci) && v.as_bytes()[want.len()] == b'-'
        }),
        SimpleSelector::AttrPrefix(attr) => {
            attr_value_matches(element, attr, |v, want, ci| !want.is_empty() && prefix_eq(v, want, ci))
        }
        SimpleSelector::AttrSuffix(attr) => {
            attr_value_matches(element, attr, |v, want, ci| !want.is_empty() && suffix_eq(v, want, ci))
        }
        SimpleSelector::AttrSubstring(attr) => {
            attr_value_matches(element, attr, |v, want, ci| !want.is_empty() && substring_eq(v, want, ci))
        }
        SimpleSelector::Root => element.parent().is_none(),
        SimpleSelector::Empty => element.first_child().is_none(),
        SimpleSelector::FirstChild => element.prev_sibling().is_none(),
        SimpleSelector::LastChild => element.next_sibling().is_none(),
        SimpleSelector::OnlyChild => element.prev_sibling().is_none() && element.next_sibling().is_none(),
        SimpleSelector::NthChild(pat) => pat.matches(sibling_index(element, false)),
        SimpleSelector::NthLastChild(pat) => pat.matches(sibling_index_reverse(element, false)),
        SimpleSelector::NthOfType(pat) => pat.matches(sibling_index(element, true)),
        SimpleSelector::NthLastOfType(pat) => pat.matches(sibling_index_reverse(element, true)),
        SimpleSelector::Link => element.tag_name().eq_ignore_ascii_case("a") && element.find_attribute("href", true).is_some(),
        SimpleSelector::Lang(want) => element
            .lang()
            .map(|lang| dash_match_ci(lang, want))
            .unwrap_or(false),
        SimpleSelector::Is(list) | SimpleSelector::Where(list) => {
            list.iter().any(|s| matches(s, element, PseudoQuery::None))
        }
        SimpleSelector::Not(list) => !list.iter().any(|s| matches(s, element, PseudoQuery::None)),
        SimpleSelector::Has(combinator, list) => has_matches(*combinator, list, element),
        SimpleSelector::PseudoElement(_) => true, // handled by the caller at the selector root
    }
}

fn attr_value_matches<E: Element>(
    element: &E,
    attr: &super::ast::AttrSelector,
    f: impl Fn(&str, &str, bool) -> bool,
) -> bool {
    let ci_name = !element.is_case_sensitive();
    match element.find_attribute(&attr.name, ci_name) {
        Some(v) => f(v, &attr.value, attr.case == AttrCaseSensitivity::Insensitive),
        None => false,
    }
}

fn str_eq(a: &str, b: &str, ci: bool) -> bool {
    if ci {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

fn prefix_eq(v: &str, want: &str, ci: bool) -> bool {
    if v.len() < want.len() {
        return false;
    }
    str_eq(&v[..want.len()], want, ci)
}

fn suffix_eq(v: &str, want: &str, ci: bool) -> bool {
    if v.len() < want.len() {
        return false;
    }
    str_eq(&v[v.len() - want.len()..], want, ci)
}

fn substring_eq(v: &str, want: &str, ci: bool) -> bool {
    if ci {
        v.to_ascii_lowercase().contains(&want.to_ascii_lowercase())
    } else {
        v.contains(want)
    }
}

fn dash_match_ci(value: &str, want: &str) -> bool {
    value.eq_ignore_ascii_case(want)
        || (value.len() > want.len()
            && value[..want.len()].eq_ignore_ascii_case(want)
            && value.as_bytes()[want.len()] == b'-')
}

fn sibling_index<E: Element>(element: &E, of_type: bool) -> i32 {
    let mut n = 1;
    let mut cur = element.prev_sibling();
    while let Some(sib) = cur {
        if !of_type || sib.tag_name() == element.tag_name() {
            n += 1;
        }
        cur = sib.prev_sibling();
    }
    n
}

fn sibling_index_reverse<E: Element>(element: &E, of_type: bool) -> i32 {
    let mut n = 1;
    let mut cur = element.next_sibling();
    while let Some(sib) = cur {
        if !of_type || sib.tag_name() == element.tag_name() {
            n += 1;
        }
        cur = sib.next_sibling();
    }
    n
}

/// `:has(R)` — bounded DFS/walk from `element` per the combinator in `R`'s head (§4.9).
/// `Combinator::None` is redesigned to behave as `Descendant`, per §9's resolution of the
/// source's ambiguous early-return for that case.
fn has_matches<E: Element>(combinator: Combinator, list: &[ComplexSelector], element: &E) -> bool {
    list.iter().any(|selector| has_matches_one(combinator, selector, element))
}

fn has_matches_one<E: Element>(combinator: Combinator, selector: &ComplexSelector, element: &E) -> bool {
    match combinator {
        Combinator::Child => children(element).any(|child| matches(selector, &child, PseudoQuery::None)),
        Combinator::DirectAdjacent => next_sibling_matches(element, selector, false),
        Combinator::IndirectAdjacent => next_sibling_matches(element, selector, true),
        Combinator::Descendant | Combinator::None => descendant_matches(element, selector),
    }
}

fn next_sibling_matches<E: Element>(element: &E, selector: &ComplexSelector, indirect: bool) -> bool {
    let mut cur = element.next_sibling();
    while let Some(sib) = cur {
        if matches(selector, &sib, PseudoQuery::None) {
            return true;
        }
        if !indirect {
            break;
        }
        cur = sib.next_sibling();
    }
    false
}

/// Full descendant DFS: every child, and recursively every descendant of every child.
fn descendant_matches<E: Element>(element: &E, selector: &ComplexSelector) -> bool {
    children(element).any(|child| matches(selector, &child, PseudoQuery::None) || descendant_matches(&child, selector))
}

fn children<E: Element>(element: &E) -> impl Iterator<Item = E> {
    let mut cur = element.first_child();
    std::iter::from_fn(move || {
        let next = cur.take();
        if let Some(ref n) = next {
            cur = n.next_sibling();
        }
        next
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct TestNode {
        tag: &'static str,
        id: Option<&'static str>,
        classes: Vec<String>,
        parent: Option<Box<TestNode>>,
        first_child: Option<Box<TestNode>>,
        prev: Option<Box<TestNode>>,
        next: Option<Box<TestNode>>,
        attrs: Vec<(&'static str, &'static str)>,
    }

    impl Element for TestNode {
        fn parent(&self) -> Option<Self> {
            self.parent.as_deref().cloned()
        }
        fn first_child(&self) -> Option<Self> {
            self.first_child.as_deref().cloned()
        }
        fn prev_sibling(&self) -> Option<Self> {
            self.prev.as_deref().cloned()
        }
        fn next_sibling(&self) -> Option<Self> {
            self.next.as_deref().cloned()
        }
        fn namespace_uri(&self) -> Option<&str> {
            None
        }
        fn tag_name(&self) -> &str {
            self.tag
        }
        fn id(&self) -> Option<&str> {
            self.id
        }
        fn class_names(&self) -> &[String] {
            &self.classes
        }
        fn find_attribute(&self, name: &str, _ci: bool) -> Option<&str> {
            self.attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
        }
        fn lang(&self) -> Option<&str> {
            None
        }
        fn is_case_sensitive(&self) -> bool {
            true
        }
    }

    fn leaf(tag: &'static str) -> TestNode {
        TestNode {
            tag,
            id: None,
            classes: vec![],
            parent: None,
            first_child: None,
            prev: None,
            next: None,
            attrs: vec![],
        }
    }

    #[test]
    fn matches_simple_type() {
        let sel = super::super::parser::parse_selector_list("div").unwrap();
        assert!(matches(&sel.selectors[0], &leaf("div"), PseudoQuery::None));
        assert!(!matches(&sel.selectors[0], &leaf("span"), PseudoQuery::None));
    }

    #[test]
    fn matches_child_combinator() {
        let parent = leaf("div");
        let mut child = leaf("span");
        child.parent = Some(Box::new(parent));
        let sel = super::super::parser::parse_selector_list("div > span").unwrap();
        assert!(matches(&sel.selectors[0], &child, PseudoQuery::None));
    }

    #[test]
    fn matches_direct_adjacent() {
        let prev = leaf("div");
        let mut cur = leaf("span");
        cur.prev = Some(Box::new(prev));
        let sel = super::super::parser::parse_selector_list("div + span").unwrap();
        assert!(matches(&sel.selectors[0], &cur, PseudoQuery::None));
    }

    #[test]
    fn matches_not() {
        let sel = super::super::parser::parse_selector_list(":not(div)").unwrap();
        assert!(!matches(&sel.selectors[0], &leaf("div"), PseudoQuery::None));
        assert!(matches(&sel.selectors[0], &leaf("span"), PseudoQuery::None));
    }

    #[test]
    fn has_child_combinator_matches_pb_on_p_containing_b() {
        // <p><b>x</b></p> — `:has(> b)` matches `p` (§8 end-to-end scenario).
        let mut p = leaf("p");
        let b = leaf("b");
        p.first_child = Some(Box::new(b));
        let sel = super::super::parser::parse_selector_list("p:has(> b)").unwrap();
        assert!(matches(&sel.selectors[0], &p, PseudoQuery::None));
    }

    #[test]
    fn has_descendant_matches_through_grandchildren() {
        let mut inner = leaf("b");
        inner.first_child = None;
        let mut span = leaf("span");
        span.first_child = Some(Box::new(inner));
        let mut p = leaf("p");
        p.first_child = Some(Box::new(span));
        let sel = super::super::parser::parse_selector_list("p:has(b)").unwrap();
        assert!(matches(&sel.selectors[0], &p, PseudoQuery::None));
    }
}
