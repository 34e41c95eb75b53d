//! CSS properties, specified values, computed values — the same three-layer split as
//! `librsvg::properties`: a property's parsed-but-uncascaded form (`ParsedProperty`), the
//! per-element table of them (`SpecifiedValues`), and the final, fully-inherited table
//! (`ComputedValues`) that the rest of the engine reads.
//!
//! To add a property: define its type in `property_defs.rs`, then add one line to the
//! `make_properties!` invocation below.

use std::collections::HashMap;

use cssparser::{ParseErrorKind, Parser, ParserInput};

use crate::error::ValueErrorKind;
use crate::parsers::Parse;
use crate::property_macros::Property;
use crate::values::length::DEFAULT_FONT_SIZE_PX;
use crate::values::variables::CustomProperties;

pub use crate::property_defs::*;

include!(concat!(env!("OUT_DIR"), "/property_ids.rs"));

/// A single property's value as written by the author, before cascade: either not given at
/// all (the surrounding `SpecifiedValues` simply has no entry), one of the three CSS-wide
/// keywords, or a concrete parsed value.
#[derive(Clone)]
pub enum SpecifiedValue<T>
where
    T: Property + Clone + Default,
{
    Initial,
    Inherit,
    Unset,
    Specified(T),
}

impl<T> SpecifiedValue<T>
where
    T: Property + Clone + Default,
{
    /// Resolves to a computed `T`, given `src` (the parent's already-computed value of the
    /// same property) and `src_values` (the in-progress `ComputedValues`, so properties like
    /// `font-size` can read sibling fields computed earlier in the fixed processing order).
    fn compute(&self, src: &T, src_values: &ComputedValues) -> T {
        let value = match self {
            SpecifiedValue::Initial => Default::default(),
            SpecifiedValue::Inherit => src.clone(),
            SpecifiedValue::Unset => {
                if <T as Property>::inherits_automatically() {
                    src.clone()
                } else {
                    Default::default()
                }
            }
            SpecifiedValue::Specified(v) => v.clone(),
        };
        value.compute(src_values)
    }
}

/// Generates `PropertyId`, `ParsedProperty`, `ComputedValues`, and the `parse_value`
/// dispatch from a flat `"css-name" => (field_name: Type)` list (§4.8's property set,
/// trimmed from the teacher's shorthand/markup5ever-aware version since this engine
/// dispatches on a plain property-name string rather than a `QualName`).
macro_rules! make_properties {
    { $($str_name:tt => ($field:ident : $name:ident),)+ } => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum PropertyId {
            $($name,)+
        }

        impl PropertyId {
            pub fn name(self) -> &'static str {
                match self {
                    $(PropertyId::$name => $str_name,)+
                }
            }

            pub fn from_name(s: &str) -> Option<PropertyId> {
                PROPERTY_IDS.get(s).copied()
            }
        }

        #[derive(Clone)]
        pub enum ParsedProperty {
            $($name(SpecifiedValue<$name>),)+
        }

        impl ParsedProperty {
            fn property_id(&self) -> PropertyId {
                match self {
                    $(ParsedProperty::$name(_) => PropertyId::$name,)+
                }
            }
        }

        /// Parses the raw CSS text of one declaration into its typed, property-specific
        /// `ParsedProperty`, handling the three CSS-wide keywords generically before
        /// dispatching to the property's own `Parse` impl (§4.8 step 7). Returns an owned
        /// error so a caller holding only the declaration's text (no live `Parser`) can
        /// still report why a property was dropped.
        pub fn parse_value(name: &str, raw_value: &str) -> Result<ParsedProperty, ValueErrorKind> {
            let id = PropertyId::from_name(name).ok_or(ValueErrorKind::UnknownProperty)?;

            let trimmed = raw_value.trim();
            if trimmed.eq_ignore_ascii_case("initial") {
                return Ok(wide_keyword(id, CssWideKeyword::Initial));
            }
            if trimmed.eq_ignore_ascii_case("inherit") {
                return Ok(wide_keyword(id, CssWideKeyword::Inherit));
            }
            if trimmed.eq_ignore_ascii_case("unset") {
                return Ok(wide_keyword(id, CssWideKeyword::Unset));
            }

            match id {
                $(
                    PropertyId::$name => {
                        let mut owned_input = ParserInput::new(raw_value);
                        let mut parser = Parser::new(&mut owned_input);
                        let v = parser
                            .parse_entirely(<$name as Parse>::parse)
                            .map_err(|e| match e.kind {
                                ParseErrorKind::Basic(b) => ValueErrorKind::from(b),
                                ParseErrorKind::Custom(c) => c,
                            })?;
                        Ok(ParsedProperty::$name(SpecifiedValue::Specified(v)))
                    }
                )+
            }
        }

        enum CssWideKeyword {
            Initial,
            Inherit,
            Unset,
        }

        fn wide_keyword(id: PropertyId, kw: CssWideKeyword) -> ParsedProperty {
            match id {
                $(
                    PropertyId::$name => ParsedProperty::$name(match kw {
                        CssWideKeyword::Initial => SpecifiedValue::Initial,
                        CssWideKeyword::Inherit => SpecifiedValue::Inherit,
                        CssWideKeyword::Unset => SpecifiedValue::Unset,
                    }),
                )+
            }
        }

        /// The computed style of an element: one field per CSS property, plus the
        /// custom-property environment and the font-size cache that `em`/`ex`/`ch`/`rem`
        /// resolution on *other* properties needs once `font-size` itself has been computed.
        #[derive(Debug, Clone)]
        pub struct ComputedValues {
            $(pub $field: $name,)+

            pub custom_properties: CustomProperties,

            /// This element's own resolved font size in pixels, filled in by
            /// `to_computed_values` before any other property is computed.
            pub font_size_px: f64,

            /// The document root's resolved font size in pixels, for `rem`. Carried forward
            /// unchanged by `Clone` from parent to child; only the root-element caller sets it.
            pub root_font_size_px: f64,
        }

        impl Default for ComputedValues {
            fn default() -> ComputedValues {
                ComputedValues {
                    $($field: Default::default(),)+
                    custom_properties: CustomProperties::default(),
                    font_size_px: DEFAULT_FONT_SIZE_PX,
                    root_font_size_px: DEFAULT_FONT_SIZE_PX,
                }
            }
        }

        impl ComputedValues {
            $(
                pub fn $field(&self) -> $name {
                    self.$field.clone()
                }
            )+
        }

        /// The per-element table of declarations that survived cascade collapse, keyed by
        /// property id so a later declaration for the same property overwrites the earlier
        /// one (the cascade itself already picked the single winner per property name).
        #[derive(Default, Clone)]
        pub struct SpecifiedValues {
            props: HashMap<PropertyId, ParsedProperty>,
        }

        impl SpecifiedValues {
            pub fn set_property(&mut self, prop: ParsedProperty) {
                self.props.insert(prop.property_id(), prop);
            }

            fn get(&self, id: PropertyId) -> Option<&ParsedProperty> {
                self.props.get(&id)
            }

            /// §4.8 steps 6-7: resolves every property against `computed`, which the caller
            /// has already initialized to either a clone of the parent's computed values
            /// (normal inheritance) or `ComputedValues::default()` with `root_font_size_px`
            /// set (the document root). `font-size` runs first so later `em`/`ex`/`ch`
            /// resolution on other properties can read the element's own resolved size via
            /// `computed.font_size_px`.
            pub fn to_computed_values(&self, computed: &mut ComputedValues) {
                if let Some(ParsedProperty::FontSize(s)) = self.get(PropertyId::FontSize) {
                    let src = computed.font_size();
                    computed.font_size = s.compute(&src, computed);
                    computed.font_size_px = computed.font_size.0.value;
                }

                $(
                    if !matches!(PropertyId::$name, PropertyId::FontSize) {
                        if let Some(prop) = self.get(PropertyId::$name) {
                            if let ParsedProperty::$name(s) = prop {
                                let src = computed.$field();
                                computed.$field = s.compute(&src, computed);
                            }
                        }
                    }
                )+
            }
        }
    };
}

make_properties! {
    "color" => (color: CssColor),
    "background-color" => (background_color: BackgroundColor),
    "direction" => (direction: Direction),
    "font-style" => (font_style: FontStyle),
    "font-weight" => (font_weight: FontWeight),
    "font-family" => (font_family: FontFamily),
    "font-size" => (font_size: FontSize),
    "font-variant-ligatures" => (font_variant_ligatures: FontVariantLigatures),
    "font-variant-caps" => (font_variant_caps: FontVariantCaps),
    "font-variant-numeric" => (font_variant_numeric: FontVariantNumeric),
    "font-variant-east-asian" => (font_variant_east_asian: FontVariantEastAsian),
    "font-kerning" => (font_kerning: FontKerning),
    "text-align" => (text_align: TextAlign),
    "text-transform" => (text_transform: TextTransform),
    "visibility" => (visibility: Visibility),
    "white-space" => (white_space: WhiteSpace),
    "writing-mode" => (writing_mode: WritingMode),
    "display" => (display: Display),
    "position" => (position: Position),
    "letter-spacing" => (letter_spacing: LetterSpacing),
    "word-spacing" => (word_spacing: WordSpacing),
    "line-height" => (line_height: LineHeight),
    "text-indent" => (text_indent: TextIndent),
    "widows" => (widows: Widows),
    "list-style-type" => (list_style_type: ListStyleType),
    "width" => (width: Width),
    "height" => (height: Height),
    "margin-top" => (margin_top: MarginTop),
    "margin-right" => (margin_right: MarginRight),
    "margin-bottom" => (margin_bottom: MarginBottom),
    "margin-left" => (margin_left: MarginLeft),
    "padding-top" => (padding_top: PaddingTop),
    "padding-right" => (padding_right: PaddingRight),
    "padding-bottom" => (padding_bottom: PaddingBottom),
    "padding-left" => (padding_left: PaddingLeft),
    "z-index" => (z_index: ZIndex),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::length::{Length, LengthUnit};

    #[test]
    fn inherited_property_copies_parent_when_unspecified() {
        let mut parent = ComputedValues::default();
        parent.color = CssColor(cssparser::Color::RGBA(cssparser::RGBA::new(10, 20, 30, 255)));

        let specified = SpecifiedValues::default();
        let mut computed = parent.clone();
        specified.to_computed_values(&mut computed);
        assert_eq!(computed.color, parent.color);
    }

    #[test]
    fn explicit_unset_resets_non_inherited_property() {
        let mut parent = ComputedValues::default();
        parent.display = Display::Block;

        let mut specified = SpecifiedValues::default();
        specified.set_property(parse_value("display", "unset").unwrap());
        let mut computed = parent.clone();
        specified.to_computed_values(&mut computed);
        assert_eq!(computed.display, Display::default());
    }

    #[test]
    fn explicit_value_overrides_inheritance() {
        let parent = ComputedValues::default();
        let mut specified = SpecifiedValues::default();
        specified.set_property(parse_value("color", "rgb(1, 2, 3)").unwrap());
        let mut computed = parent.clone();
        specified.to_computed_values(&mut computed);
        assert_eq!(
            computed.color,
            CssColor(cssparser::Color::RGBA(cssparser::RGBA::new(1, 2, 3, 255)))
        );
    }

    #[test]
    fn font_size_em_resolves_against_parent_size() {
        let mut parent = ComputedValues::default();
        parent.font_size = FontSize(Length::new(20.0, LengthUnit::Px));
        parent.font_size_px = 20.0;

        let mut specified = SpecifiedValues::default();
        specified.set_property(parse_value("font-size", "2em").unwrap());
        let mut computed = parent.clone();
        specified.to_computed_values(&mut computed);
        assert_eq!(computed.font_size_px, 40.0);
    }

    #[test]
    fn unknown_property_is_rejected() {
        assert!(parse_value("not-a-real-property", "red").is_err());
    }
}
