//! Specificity: the 24-bit packed triple from §3/§8.

use super::ast::{ComplexSelector, CompoundSelector, SimpleSelector};

/// A specificity value, packed as `id*0x10000 + classlike*0x100 + typelike*1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32);

impl Specificity {
    pub const ZERO: Specificity = Specificity(0);

    pub fn new(ids: u32, classes: u32, types: u32) -> Self {
        Specificity(ids * 0x10000 + classes * 0x100 + types)
    }

    fn add(self, other: Specificity) -> Specificity {
        Specificity(self.0 + other.0)
    }

    fn max(self, other: Specificity) -> Specificity {
        Specificity(self.0.max(other.0))
    }
}

pub fn complex_specificity(selector: &ComplexSelector) -> Specificity {
    selector
        .compounds
        .iter()
        .map(|(_, compound)| compound_specificity(compound))
        .fold(Specificity::ZERO, Specificity::add)
}

fn compound_specificity(compound: &CompoundSelector) -> Specificity {
    compound
        .simples
        .iter()
        .map(simple_specificity)
        .fold(Specificity::ZERO, Specificity::add)
}

fn simple_specificity(simple: &SimpleSelector) -> Specificity {
    match simple {
        SimpleSelector::Id(_) => Specificity::new(1, 0, 0),
        SimpleSelector::Class(_)
        | SimpleSelector::AttrHas(_)
        | SimpleSelector::AttrEquals { .. }
        | SimpleSelector::AttrIncludes { .. }
        | SimpleSelector::AttrDashMatch { .. }
        | SimpleSelector::AttrPrefix { .. }
        | SimpleSelector::AttrSuffix { .. }
        | SimpleSelector::AttrSubstring { .. }
        | SimpleSelector::NthChild(_)
        | SimpleSelector::NthLastChild(_)
        | SimpleSelector::NthOfType(_)
        | SimpleSelector::NthLastOfType(_)
        | SimpleSelector::Lang(_)
        | SimpleSelector::Link
        | SimpleSelector::Root
        | SimpleSelector::Empty
        | SimpleSelector::FirstChild
        | SimpleSelector::LastChild
        | SimpleSelector::OnlyChild => Specificity::new(0, 1, 0),
        SimpleSelector::Type(_) | SimpleSelector::PseudoElement(_) => Specificity::new(0, 0, 1),
        SimpleSelector::Namespace(_) | SimpleSelector::Universal => Specificity::ZERO,
        // :is()/:not()/:has() contribute the max specificity among their sub-selectors;
        // :where() contributes zero (§3/§8).
        SimpleSelector::Is(list) | SimpleSelector::Not(list) | SimpleSelector::Has(_, list) => list
            .iter()
            .map(complex_specificity)
            .fold(Specificity::ZERO, Specificity::max),
        SimpleSelector::Where(_) => Specificity::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parser::parse_selector_list;

    fn spec(src: &str) -> u32 {
        let list = parse_selector_list(src).unwrap();
        complex_specificity(&list.selectors[0]).0
    }

    #[test]
    fn id_dominates() {
        assert!(spec("#foo") > spec(".a.b.c.d"));
    }

    #[test]
    fn class_beats_type() {
        assert!(spec(".a") > spec("div"));
    }

    #[test]
    fn where_contributes_zero() {
        assert_eq!(spec(":where(#foo)"), 0);
    }

    #[test]
    fn is_takes_max_of_subselectors() {
        assert_eq!(spec(":is(.a, #b)"), spec("#b"));
    }
}
