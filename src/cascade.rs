//! C8: the cascade resolver, per §4.8. Collects matching declarations from every
//! stylesheet, collapses them by precedence, resolves `var()` references against the
//! winning custom-property environment, and hands the survivors to [`crate::properties`]
//! for `initial`/`inherit`/`unset` resolution and per-property computation.

use std::collections::HashMap;

use crate::media::Viewport;
use crate::properties::{self, ComputedValues, SpecifiedValues};
use crate::rules::Declaration;
use crate::selector::{self, Element, PseudoQuery};
use crate::session::{session_log, Session};
use crate::stylesheet::{Origin, Stylesheet};
use crate::values::variables::{expand_variables, CustomProperties};

/// The precedence tuple declarations are sorted by (§4.8 step 4): `!important` inverts the
/// usual UA/User-over-Author ordering, so we store two origin ranks and pick the one that
/// applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Precedence {
    pub(crate) important: bool,
    pub(crate) origin_rank: u8,
    pub(crate) specificity: u32,
    pub(crate) position: u32,
}

/// Shared with `page.rs`, which cascades `@page`/margin-box declarations with the same
/// origin/importance ordering as ordinary style rules.
pub(crate) fn origin_rank(origin: Origin, important: bool) -> u8 {
    // Normal order (lowest to highest): UserAgent < User < Author < Inline < Presentation
    // (spec.md's origin ordering). `!important` reverses UA/User vs Author/Inline
    // (CSS2.1 §6.4.1); Presentation has no `!important` concept of its own and always
    // outranks every other origin, important or not.
    match (origin, important) {
        (Origin::UserAgent, false) => 0,
        (Origin::User, false) => 1,
        (Origin::Author, false) => 2,
        (Origin::Inline, false) => 3,
        (Origin::Author, true) => 4,
        (Origin::Inline, true) => 5,
        (Origin::User, true) => 6,
        (Origin::UserAgent, true) => 7,
        (Origin::Presentation, _) => 8,
    }
}

struct Candidate {
    declaration: Declaration,
    precedence: Precedence,
}

/// One element's worth of winning raw declarations plus the custom-property environment
/// needed to resolve any `var()` references left in their values.
pub struct CascadedDeclarations {
    pub winners: HashMap<String, Declaration>,
    pub custom_properties: CustomProperties,
}

/// Runs steps 1-5 of §4.8 for a single element against a set of stylesheets in increasing
/// precedence (caller passes UA, then user, then author sheets, in that order so origin
/// ties break correctly via `origin_rank`).
pub fn cascade_for_element<E: Element>(
    element: &E,
    sheets: &[(&Stylesheet, Origin)],
    viewport: &Viewport,
    pseudo: PseudoQuery,
    inline_style: &[Declaration],
    presentation_attrs: &[Declaration],
    parent_custom_properties: Option<&CustomProperties>,
) -> CascadedDeclarations {
    let mut candidates: Vec<Candidate> = Vec::new();

    let id = element.id();
    let classes = element.class_names();
    // Attribute name candidate lookup: the index only needs to know a name is present, not
    // its value, so we don't attempt to enumerate every attribute name generically here;
    // callers index by the small fixed set of attribute selectors that occur in the
    // stylesheet (already flattened into the stylesheet's own buckets).
    let attr_names: Vec<String> = Vec::new();

    let wants_pseudo_element = matches!(pseudo, PseudoQuery::Element(_));

    for (sheet, origin) in sheets {
        let tag = element.tag_name();
        for rule_data in sheet.candidates(id.as_deref(), classes, &attr_names, tag, wants_pseudo_element, viewport) {
            if selector::matches(&rule_data.selector, element, pseudo) {
                let specificity = rule_data.specificity.0;
                for decl in &rule_data.declarations {
                    candidates.push(Candidate {
                        declaration: decl.clone(),
                        precedence: Precedence {
                            important: decl.important,
                            origin_rank: origin_rank(*origin, decl.important),
                            specificity,
                            position: rule_data.position,
                        },
                    });
                }
            }
        }
    }

    for decl in presentation_attrs {
        candidates.push(Candidate {
            declaration: decl.clone(),
            precedence: Precedence {
                important: false,
                origin_rank: origin_rank(Origin::Presentation, false),
                specificity: 0,
                position: 0,
            },
        });
    }

    for decl in inline_style {
        candidates.push(Candidate {
            declaration: decl.clone(),
            precedence: Precedence {
                important: decl.important,
                origin_rank: origin_rank(Origin::Inline, decl.important),
                specificity: 0,
                position: u32::MAX,
            },
        });
    }

    // Step 4: collapse by property name, highest precedence wins.
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

    // Build the custom-property environment before resolving var() references, inheriting
    // the parent's custom properties first (§4.8's note that custom properties are always
    // in the inherited subset).
    let mut custom_properties = parent_custom_properties.cloned().unwrap_or_default();
    for (name, candidate) in &winners {
        if candidate.declaration.is_custom_property() {
            custom_properties.insert(name.clone(), candidate.declaration.raw_value.clone());
        }
    }

    let mut resolved_winners = HashMap::new();
    for (name, candidate) in winners {
        if candidate.declaration.is_custom_property() {
            resolved_winners.insert(name, candidate.declaration);
            continue;
        }
        match expand_variables(&candidate.declaration.raw_value, &custom_properties) {
            Some(expanded) => {
                resolved_winners.insert(
                    name,
                    Declaration {
                        raw_value: expanded,
                        ..candidate.declaration
                    },
                );
            }
            None => {
                // Failed variable resolution drops the property entirely (§4.10); it falls
                // back to whatever `initial`/`inherit` resolution produces downstream.
            }
        }
    }

    CascadedDeclarations {
        winners: resolved_winners,
        custom_properties,
    }
}

/// Steps 6-7 of §4.8: parse each winning declaration's raw text into a typed
/// `ParsedProperty` and fold it into the table that [`properties::SpecifiedValues::
/// to_computed_values`] resolves against the parent's (or the root's) computed style.
/// Declarations that fail to parse their property's grammar are dropped, the same as a
/// malformed declaration is dropped during parsing (§4.2).
pub fn compute_style(
    session: &Session,
    cascaded: &CascadedDeclarations,
    parent: Option<&ComputedValues>,
    root_font_size_px: f64,
) -> ComputedValues {
    let mut computed = match parent {
        Some(p) => p.clone(),
        None => {
            let mut root = ComputedValues::default();
            root.root_font_size_px = root_font_size_px;
            root
        }
    };
    computed.custom_properties = cascaded.custom_properties.clone();

    let mut specified = SpecifiedValues::default();
    for (name, decl) in &cascaded.winners {
        match properties::parse_value(name, &decl.raw_value) {
            Ok(prop) => specified.set_property(prop),
            Err(e) => session_log!(session, "dropping declaration '{}: {}' ({})", name, decl.raw_value, e),
        }
    }

    specified.to_computed_values(&mut computed);
    computed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    #[derive(Debug, Clone, Default)]
    struct LeafNode {
        tag: String,
        id: Option<String>,
        classes: Vec<String>,
    }

    impl LeafNode {
        fn leaf(tag: &str) -> LeafNode {
            LeafNode {
                tag: tag.to_string(),
                ..Default::default()
            }
        }
    }

    impl Element for LeafNode {
        fn parent(&self) -> Option<Self> {
            None
        }
        fn first_child(&self) -> Option<Self> {
            None
        }
        fn prev_sibling(&self) -> Option<Self> {
            None
        }
        fn next_sibling(&self) -> Option<Self> {
            None
        }
        fn namespace_uri(&self) -> Option<&str> {
            None
        }
        fn tag_name(&self) -> &str {
            &self.tag
        }
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
        fn class_names(&self) -> &[String] {
            &self.classes
        }
        fn find_attribute(&self, _name: &str, _ci: bool) -> Option<&str> {
            None
        }
        fn lang(&self) -> Option<&str> {
            None
        }
        fn is_case_sensitive(&self) -> bool {
            false
        }
    }

    fn no_imports(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn author_beats_user_agent() {
        let session = Session::quiet();
        let (ua, _) = Stylesheet::parse("p { color: blue; }", Origin::UserAgent, &session, 0, &no_imports);
        let (author, _) = Stylesheet::parse("p { color: red; }", Origin::Author, &session, 0, &no_imports);

        let node = LeafNode::leaf("p");
        let cascaded = cascade_for_element(
            &node,
            &[(&ua, Origin::UserAgent), (&author, Origin::Author)],
            &Viewport::default(),
            PseudoQuery::None,
            &[],
            &[],
            None,
        );
        assert_eq!(cascaded.winners["color"].raw_value, "red");
    }

    #[test]
    fn important_user_agent_beats_normal_author() {
        let session = Session::quiet();
        let (ua, _) = Stylesheet::parse(
            "p { color: blue !important; }",
            Origin::UserAgent,
            &session,
            0,
            &no_imports,
        );
        let (author, _) = Stylesheet::parse("p { color: red; }", Origin::Author, &session, 0, &no_imports);

        let node = LeafNode::leaf("p");
        let cascaded = cascade_for_element(
            &node,
            &[(&ua, Origin::UserAgent), (&author, Origin::Author)],
            &Viewport::default(),
            PseudoQuery::None,
            &[],
            &[],
            None,
        );
        assert_eq!(cascaded.winners["color"].raw_value, "blue");
    }

    #[test]
    fn higher_specificity_wins_within_same_origin() {
        let session = Session::quiet();
        let (author, _) =
            Stylesheet::parse("p { color: red; } #x { color: green; }", Origin::Author, &session, 0, &no_imports);

        let mut node = LeafNode::leaf("p");
        node.id = Some("x".to_string());
        let cascaded = cascade_for_element(&node, &[(&author, Origin::Author)], &Viewport::default(), PseudoQuery::None, &[], &[], None);
        assert_eq!(cascaded.winners["color"].raw_value, "green");
    }

    #[test]
    fn inline_style_beats_author_stylesheet() {
        let session = Session::quiet();
        let (author, _) = Stylesheet::parse("p { color: red; }", Origin::Author, &session, 0, &no_imports);
        let node = LeafNode::leaf("p");
        let inline = vec![Declaration {
            name: "color".to_string(),
            raw_value: "green".to_string(),
            important: false,
        }];
        let cascaded =
            cascade_for_element(&node, &[(&author, Origin::Author)], &Viewport::default(), PseudoQuery::None, &inline, &[], None);
        assert_eq!(cascaded.winners["color"].raw_value, "green");
    }

    #[test]
    fn presentation_attribute_beats_important_inline_style() {
        let session = Session::quiet();
        let (author, _) = Stylesheet::parse("p { color: red; }", Origin::Author, &session, 0, &no_imports);
        let node = LeafNode::leaf("p");
        let inline = vec![Declaration {
            name: "color".to_string(),
            raw_value: "green".to_string(),
            important: true,
        }];
        let presentation = vec![Declaration {
            name: "color".to_string(),
            raw_value: "yellow".to_string(),
            important: false,
        }];
        let cascaded = cascade_for_element(
            &node,
            &[(&author, Origin::Author)],
            &Viewport::default(),
            PseudoQuery::None,
            &inline,
            &presentation,
            None,
        );
        assert_eq!(cascaded.winners["color"].raw_value, "yellow");
    }

    #[test]
    fn custom_property_variable_is_substituted_before_winning() {
        let session = Session::quiet();
        let (author, _) = Stylesheet::parse(
            "p { --c: teal; color: var(--c); }",
            Origin::Author,
            &session,
            0,
            &no_imports,
        );
        let node = LeafNode::leaf("p");
        let cascaded = cascade_for_element(&node, &[(&author, Origin::Author)], &Viewport::default(), PseudoQuery::None, &[], &[], None);
        assert_eq!(cascaded.winners["color"].raw_value, "teal");
    }

    #[test]
    fn compute_style_inherits_color_from_parent_when_unspecified() {
        let session = Session::quiet();
        let parent_computed = {
            let (author, _) = Stylesheet::parse("p { color: green; }", Origin::Author, &session, 0, &no_imports);
            let node = LeafNode::leaf("p");
            let cascaded =
                cascade_for_element(&node, &[(&author, Origin::Author)], &Viewport::default(), PseudoQuery::None, &[], &[], None);
            compute_style(&session, &cascaded, None, 16.0)
        };
        assert_eq!(
            parent_computed.color,
            crate::properties::CssColor(cssparser::Color::RGBA(cssparser::RGBA::new(0, 128, 0, 255)))
        );

        let (author, _) = Stylesheet::parse("span { }", Origin::Author, &session, 0, &no_imports);
        let child = LeafNode::leaf("span");
        let cascaded = cascade_for_element(&child, &[(&author, Origin::Author)], &Viewport::default(), PseudoQuery::None, &[], &[], None);
        let child_computed = compute_style(&session, &cascaded, Some(&parent_computed), 16.0);
        assert_eq!(child_computed.color, parent_computed.color);
    }

    #[test]
    fn compute_style_resolves_em_font_size_against_parent() {
        let session = Session::quiet();
        let mut parent_computed = ComputedValues::default();
        parent_computed.font_size = crate::properties::FontSize(crate::values::length::Length::new(
            20.0,
            crate::values::length::LengthUnit::Px,
        ));
        parent_computed.font_size_px = 20.0;

        let (author, _) = Stylesheet::parse("span { font-size: 2em; }", Origin::Author, &session, 0, &no_imports);
        let node = LeafNode::leaf("span");
        let cascaded = cascade_for_element(&node, &[(&author, Origin::Author)], &Viewport::default(), PseudoQuery::None, &[], &[], None);
        let computed = compute_style(&session, &cascaded, Some(&parent_computed), 16.0);
        assert_eq!(computed.font_size_px, 40.0);
    }
}
