//! Macros to define CSS properties, the same shape as `librsvg::property_macros`, pared
//! down to the two property shapes this crate actually needs: plain identifier enums and
//! newtypes around an existing `Parse`-able type.

/// Trait every CSS property type implements.
pub trait Property {
    /// Whether the property's computed value inherits from parent to child elements. The
    /// CSS spec says this per property; see §4.8's inherited-subset list.
    fn inherits_automatically() -> bool;

    /// Derives the computed value from the parent's [`ComputedValues`][crate::properties::ComputedValues]
    /// and `self`. The default (via [`impl_property!`]) is to clone; properties whose
    /// computed value depends on context (e.g. `font-size: larger`) override this.
    fn compute(&self, _: &crate::properties::ComputedValues) -> Self;
}

/// Generates an identifier-valued property type: an enum plus `Default`, `Property`, and
/// `Parse` implementations.
#[macro_export]
macro_rules! make_property {
    ($(#[$attr:meta])*
     $name: ident,
     default: $default: ident,
     inherits_automatically: $inherits_automatically: expr,
     identifiers:
     $($str_prop: expr => $variant: ident,)+
    ) => {
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl_default!($name, $name::$default);
        impl_property!($name, $inherits_automatically);

        impl crate::parsers::Parse for $name {
            fn parse<'i>(parser: &mut ::cssparser::Parser<'i, '_>) -> Result<$name, crate::error::ParseError<'i>> {
                Ok($crate::parse_identifiers!(
                    parser,
                    $($str_prop => $name::$variant,)+
                )?)
            }
        }
    };

    ($(#[$attr:meta])*
     $name: ident,
     default: $default: expr,
     inherits_automatically: $inherits_automatically: expr,
     newtype: $type: ty,
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub $type);

        impl_default!($name, $name($default));
        impl_property!($name, $inherits_automatically);

        impl crate::parsers::Parse for $name {
            fn parse<'i>(parser: &mut ::cssparser::Parser<'i, '_>) -> Result<$name, crate::error::ParseError<'i>> {
                Ok($name(<$type as crate::parsers::Parse>::parse(parser)?))
            }
        }
    };

    ($(#[$attr:meta])*
     $name: ident,
     default: $default: expr,
     newtype: $type: ty,
     property_impl: { $prop: item },
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub $type);

        impl_default!($name, $name($default));

        $prop

        impl crate::parsers::Parse for $name {
            fn parse<'i>(parser: &mut ::cssparser::Parser<'i, '_>) -> Result<$name, crate::error::ParseError<'i>> {
                Ok($name(<$type as crate::parsers::Parse>::parse(parser)?))
            }
        }
    };
}

#[macro_export]
macro_rules! impl_default {
    ($name:ident, $default:expr) => {
        impl Default for $name {
            fn default() -> $name {
                $default
            }
        }
    };
}

#[macro_export]
macro_rules! impl_property {
    ($name:ident, $inherits_automatically:expr) => {
        impl crate::property_macros::Property for $name {
            fn inherits_automatically() -> bool {
                $inherits_automatically
            }

            fn compute(&self, _v: &crate::properties::ComputedValues) -> Self {
                self.clone()
            }
        }
    };
}
