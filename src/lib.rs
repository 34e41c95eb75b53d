//! The CSS engine core of a print-oriented document rendering system: a CSS tokenizer and
//! parser with the full selector grammar, the at-rules needed for paged media (`@media`,
//! `@import`, `@page`, `@font-face`, `@counter-style`), CSS custom properties with
//! cycle-safe `var()` substitution, unit-aware `calc()`, a selector engine covering
//! complex/compound selectors and functional pseudo-classes (`:is`, `:not`, `:has`,
//! `:nth-*`), a cascade that respects origin, specificity, declaration order and
//! `!important`, and a counter-style engine with `extends`/fallback cycle resolution.
//!
//! # Basic usage
//!
//! Parse one or more stylesheets with [`Stylesheet::parse`], then resolve a computed style
//! for each element with [`style_for_element`] — walking the document tree root-first so
//! each element's parent [`ComputedValues`] is available for inheritance:
//!
//! ```no_run
//! use css_engine::{style_for_element, Origin, PseudoQuery, Session, Stylesheet};
//!
//! # fn no_imports(_: &str) -> Option<String> { None }
//! # #[derive(Clone, Default)] struct MyElement;
//! # impl css_engine::Element for MyElement {
//! #     fn parent(&self) -> Option<Self> { None }
//! #     fn first_child(&self) -> Option<Self> { None }
//! #     fn prev_sibling(&self) -> Option<Self> { None }
//! #     fn next_sibling(&self) -> Option<Self> { None }
//! #     fn namespace_uri(&self) -> Option<&str> { None }
//! #     fn tag_name(&self) -> &str { "div" }
//! #     fn id(&self) -> Option<&str> { None }
//! #     fn class_names(&self) -> &[String] { &[] }
//! #     fn find_attribute(&self, _: &str, _: bool) -> Option<&str> { None }
//! #     fn lang(&self) -> Option<&str> { None }
//! #     fn is_case_sensitive(&self) -> bool { true }
//! # }
//! let session = Session::new();
//! let (sheet, _next_position) = Stylesheet::parse(
//!     "p { color: green; }",
//!     Origin::Author,
//!     &session,
//!     0,
//!     &no_imports,
//! );
//!
//! let root = MyElement::default();
//! let viewport = css_engine::Viewport::default();
//! let computed = style_for_element(
//!     &session,
//!     &root,
//!     &[(&sheet, Origin::Author)],
//!     &viewport,
//!     PseudoQuery::None,
//!     &[],
//!     &[],
//!     None,
//!     16.0,
//! );
//! ```
//!
//! [`ComputedValues`]: crate::properties::ComputedValues

#![warn(nonstandard_style, rust_2018_idioms, unused)]
#![warn(renamed_and_removed_lints)]
#![warn(trivial_casts, trivial_numeric_casts)]

mod cascade;
mod counter;
mod error;
mod interning;
mod media;
mod page;
mod parsers;
mod properties;
mod property_defs;
mod property_macros;
mod resolver;
mod rules;
mod selector;
mod session;
mod stylesheet;
mod tokenizer;
mod values;

use std::collections::HashMap;

pub use crate::cascade::{cascade_for_element, compute_style, CascadedDeclarations};
pub use crate::counter::{CounterStyle, CounterStyleTable, DEFAULT_STYLE_NAME};
pub use crate::error::{CounterError, ParseError, StylesheetError, ValueErrorKind};
pub use crate::media::{Feature, MediaQuery, MediaQueryList, MediaType, Orientation, Restrictor, Viewport};
pub use crate::page::{matches as page_selector_matches, style_for_page, style_for_page_margin, PageQuery};
pub use crate::properties::{ComputedValues, ParsedProperty, PropertyId, SpecifiedValues};
pub use crate::resolver::{
    synthesize_feature_settings, AxisRange, FontDescription, FontFaceCache, FontSelectionDescription,
    SegmentedFontFace,
};
pub use crate::rules::{Declaration, MarginBoxType, PageSelector};
pub use crate::selector::{matches as selector_matches, ComplexSelector, Element, PseudoElementQuery, PseudoQuery};
pub use crate::session::Session;
pub use crate::stylesheet::{Origin, PageRuleData, RuleData, Stylesheet};
pub use crate::values::color;
pub use crate::values::length::{Length, LengthContext, LengthUnit};
pub use crate::values::variables::CustomProperties;

/// §6's `styleForElement`: resolves one element's computed style against every applicable
/// stylesheet, in increasing precedence order (user-agent, then user, then author), plus
/// any inline `style="..."` and presentation-attribute declarations. `parent` is the
/// already-computed style of the element's parent (`None` only for the document root, in
/// which case `root_font_size_px` seeds both the root's own font size and the `rem` basis
/// for the whole document).
#[allow(clippy::too_many_arguments)]
pub fn style_for_element<E: Element>(
    session: &Session,
    element: &E,
    sheets: &[(&Stylesheet, Origin)],
    viewport: &Viewport,
    pseudo: PseudoQuery,
    inline_style: &[Declaration],
    presentation_attrs: &[Declaration],
    parent: Option<&ComputedValues>,
    root_font_size_px: f64,
) -> ComputedValues {
    let parent_custom_properties = parent.map(|p| &p.custom_properties);
    let cascaded = cascade_for_element(
        element,
        sheets,
        viewport,
        pseudo,
        inline_style,
        presentation_attrs,
        parent_custom_properties,
    );
    compute_style(session, &cascaded, parent, root_font_size_px)
}

/// §6's `pseudoStyleForElement`: the computed style of one of an element's pseudo-elements
/// (`::before`, `::marker`, ...), or `None` if no rule in any sheet targets it — a
/// pseudo-element with no matching declarations at all does not exist, unlike a real
/// element (which always has *some* computed style, even if every property is at its
/// initial value).
#[allow(clippy::too_many_arguments)]
pub fn pseudo_style_for_element<E: Element>(
    session: &Session,
    element: &E,
    pseudo_element: PseudoElementQuery,
    sheets: &[(&Stylesheet, Origin)],
    viewport: &Viewport,
    parent: &ComputedValues,
    root_font_size_px: f64,
) -> Option<ComputedValues> {
    let cascaded = cascade_for_element(
        element,
        sheets,
        viewport,
        PseudoQuery::Element(pseudo_element),
        &[],
        &[],
        Some(&parent.custom_properties),
    );
    if cascaded.winners.is_empty() {
        return None;
    }
    Some(compute_style(session, &cascaded, Some(parent), root_font_size_px))
}

/// Builds the process-wide font-face cache from every stylesheet's `@font-face` rules
/// (§5's note that font-face data is the one cache this engine shares across lookups).
/// A rule nested under an `@media`/`@import` condition that doesn't match `viewport` is
/// excluded, same as an ordinary style rule (§4.6).
pub fn build_font_face_cache(sheets: &[&Stylesheet], viewport: &Viewport) -> FontFaceCache {
    let rules: Vec<Vec<Declaration>> = sheets
        .iter()
        .flat_map(|s| &s.font_face_rules)
        .filter(|(_, media)| media.iter().all(|m| m.matches(viewport)))
        .map(|(declarations, _)| declarations.clone())
        .collect();
    FontFaceCache::build(&rules)
}

/// Builds the resolved `@counter-style` table from every stylesheet's `@counter-style`
/// rules, in increasing precedence order (a later sheet's style of the same name replaces
/// an earlier one, same as any other at-rule in §4.8).
pub fn build_counter_style_table(sheets: &[&Stylesheet], viewport: &Viewport) -> CounterStyleTable {
    let mut by_name: HashMap<String, Vec<Declaration>> = HashMap::new();
    for sheet in sheets {
        for (name, declarations, media) in &sheet.counter_style_rules {
            if !media.iter().all(|m| m.matches(viewport)) {
                continue;
            }
            by_name.insert(name.clone(), declarations.clone());
        }
    }
    let styles = by_name
        .into_iter()
        .map(|(name, declarations)| CounterStyle::from_declarations(&name, &declarations))
        .collect();
    CounterStyleTable::build(styles)
}

/// §6's `getCounterText`.
pub fn get_counter_text(table: &CounterStyleTable, style_name: &str, value: i64) -> String {
    table.get_counter_text(style_name, value)
}

/// §6's `getMarkerText`.
pub fn get_marker_text(table: &CounterStyleTable, style_name: &str, value: i64) -> String {
    table.get_marker_text(style_name, value)
}
