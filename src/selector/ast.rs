//! The selector data model from §3/§4.4.

use crate::values::nth::NthPattern;

/// Relation between two compound selectors in a complex selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// The leftmost compound in a complex selector has no combinator before it.
    None,
    Descendant,
    Child,
    DirectAdjacent,
    IndirectAdjacent,
}

/// A case sensitivity flag for attribute-value comparisons, carried per §4.4's trailing
/// `i` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrCaseSensitivity {
    Sensitive,
    Insensitive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrSelector {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
    pub case: AttrCaseSensitivity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PseudoElement {
    Before,
    After,
    Marker,
    FirstLetter,
    FirstLine,
}

/// One simple selector. `:is/:not/:where` carry a nested selector list; `:has` additionally
/// carries the combinator that introduces its relative selector (`:has(> b)` vs `:has(b)`,
/// per §4.9 — `None` is treated as `Descendant` per the redesigned behavior in §9's open
/// question).
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleSelector {
    Universal,
    Namespace(Option<String>),
    Type(String),
    Id(String),
    Class(String),
    AttrHas(AttrSelector),
    AttrEquals(AttrSelector),
    AttrIncludes(AttrSelector),
    AttrDashMatch(AttrSelector),
    AttrPrefix(AttrSelector),
    AttrSuffix(AttrSelector),
    AttrSubstring(AttrSelector),
    Root,
    Empty,
    FirstChild,
    LastChild,
    OnlyChild,
    NthChild(NthPattern),
    NthLastChild(NthPattern),
    NthOfType(NthPattern),
    NthLastOfType(NthPattern),
    Link,
    Lang(String),
    Is(Vec<ComplexSelector>),
    Not(Vec<ComplexSelector>),
    Where(Vec<ComplexSelector>),
    Has(Combinator, Vec<ComplexSelector>),
    PseudoElement(PseudoElement),
}

/// A non-empty sequence of simple selectors with no combinator between them (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelector {
    pub simples: Vec<SimpleSelector>,
}

impl CompoundSelector {
    pub fn pseudo_element(&self) -> Option<&PseudoElement> {
        self.simples.iter().find_map(|s| match s {
            SimpleSelector::PseudoElement(p) => Some(p),
            _ => None,
        })
    }
}

/// A non-empty sequence of `(combinator, compound)` pairs, read left to right; the first
/// pair's combinator is always `Combinator::None` (§3).
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    pub compounds: Vec<(Combinator, CompoundSelector)>,
}

impl ComplexSelector {
    pub fn rightmost(&self) -> &CompoundSelector {
        &self.compounds.last().expect("selector is non-empty").1
    }
}

/// A comma-separated selector list (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}
