//! C4: recursive-descent selector parsing.

use cssparser::{match_ignore_ascii_case, Parser, ParserInput, Token};

use super::ast::{
    AttrCaseSensitivity, AttrSelector, Combinator, ComplexSelector, CompoundSelector, PseudoElement, SelectorList,
    SimpleSelector,
};
use crate::error::{ParseError, ValueErrorKind};
use crate::values::nth::parse_nth;

pub fn parse_selector_list(src: &str) -> Result<SelectorList, ParseError<'_>> {
    let mut input = ParserInput::new(src);
    let mut parser = Parser::new(&mut input);
    parser.parse_entirely(parse_selector_list_from_parser)
}

pub fn parse_selector_list_from_parser<'i>(input: &mut Parser<'i, '_>) -> Result<SelectorList, ParseError<'i>> {
    let mut selectors = Vec::new();
    loop {
        input.skip_whitespace();
        selectors.push(parse_complex_selector(input)?);
        input.skip_whitespace();
        if input.try_parse(|p| p.expect_comma()).is_err() {
            break;
        }
    }
    Ok(SelectorList { selectors })
}

/// A complex selector is a sequence of compound selectors separated by combinators, per
/// §4.4. Whitespace between compounds is a descendant combinator unless it is immediately
/// followed by `+`, `~`, `>`.
fn parse_complex_selector<'i>(input: &mut Parser<'i, '_>) -> Result<ComplexSelector, ParseError<'i>> {
    let mut compounds = Vec::new();
    let first = parse_compound_selector(input)?;
    compounds.push((Combinator::None, first));

    loop {
        let had_whitespace = skip_whitespace_tracking(input);
        let combinator = match input.try_parse(peek_combinator_delim) {
            Ok(c) => {
                input.skip_whitespace();
                Some(c)
            }
            Err(_) => {
                if had_whitespace && !at_selector_boundary(input) {
                    Some(Combinator::Descendant)
                } else {
                    None
                }
            }
        };

        match combinator {
            Some(c) => {
                let compound = parse_compound_selector(input)?;
                compounds.push((c, compound));
            }
            None => break,
        }
    }

    Ok(ComplexSelector { compounds })
}

fn skip_whitespace_tracking<'i>(input: &mut Parser<'i, '_>) -> bool {
    let before = input.position();
    input.skip_whitespace();
    input.position() != before
}

fn at_selector_boundary<'i>(input: &mut Parser<'i, '_>) -> bool {
    input.is_exhausted() || input.try_parse(|p| p.expect_comma()).map(|_| true).unwrap_or(false)
}

fn peek_combinator_delim<'i>(input: &mut Parser<'i, '_>) -> Result<Combinator, ParseError<'i>> {
    match input.next_including_whitespace()?.clone() {
        Token::Delim('>') => Ok(Combinator::Child),
        Token::Delim('+') => Ok(Combinator::DirectAdjacent),
        Token::Delim('~') => Ok(Combinator::IndirectAdjacent),
        _ => Err(input.new_custom_error(ValueErrorKind::parse_error("not a combinator"))),
    }
}

fn parse_compound_selector<'i>(input: &mut Parser<'i, '_>) -> Result<CompoundSelector, ParseError<'i>> {
    let mut simples = Vec::new();

    if let Ok(tag) = input.try_parse(parse_tag_or_namespace) {
        simples.push(tag);
    }

    loop {
        match input.try_parse(parse_simple_selector) {
            Ok(s) => simples.push(s),
            Err(_) => break,
        }
    }

    if simples.is_empty() {
        return Err(input.new_custom_error(ValueErrorKind::parse_error("empty compound selector")));
    }

    Ok(CompoundSelector { simples })
}

fn parse_tag_or_namespace<'i>(input: &mut Parser<'i, '_>) -> Result<SimpleSelector, ParseError<'i>> {
    // `*`, `name`, `ns|name`, `ns|*`, `|name`, `*|name`
    let loc = input.current_source_location();
    let first = input.next_including_whitespace()?.clone();
    match first {
        Token::Delim('*') => {
            if input.try_parse(|p| p.expect_delim('|')).is_ok() {
                let local = expect_ident_or_star(input)?;
                Ok(tag_with_namespace(Some("*".to_string()), local))
            } else {
                Ok(SimpleSelector::Universal)
            }
        }
        Token::Delim('|') => {
            let local = expect_ident_or_star(input)?;
            Ok(tag_with_namespace(None, local))
        }
        Token::Ident(ref name) => {
            let name = name.to_string();
            if input.try_parse(|p| p.expect_delim('|')).is_ok() {
                let local = expect_ident_or_star(input)?;
                Ok(tag_with_namespace(Some(name), local))
            } else {
                Ok(SimpleSelector::Type(name))
            }
        }
        _ => Err(loc.new_custom_error(ValueErrorKind::parse_error("expected a tag name"))),
    }
}

fn tag_with_namespace(ns: Option<String>, local: Option<String>) -> SimpleSelector {
    match local {
        None => SimpleSelector::Namespace(ns),
        Some(name) => SimpleSelector::Type(match ns {
            Some(ns) => format!("{ns}|{name}"),
            None => name,
        }),
    }
}

fn expect_ident_or_star<'i>(input: &mut Parser<'i, '_>) -> Result<Option<String>, ParseError<'i>> {
    match input.next_including_whitespace()?.clone() {
        Token::Delim('*') => Ok(None),
        Token::Ident(ref s) => Ok(Some(s.to_string())),
        _ => Err(input.new_custom_error(ValueErrorKind::parse_error("expected identifier or *"))),
    }
}

fn parse_simple_selector<'i>(input: &mut Parser<'i, '_>) -> Result<SimpleSelector, ParseError<'i>> {
    let loc = input.current_source_location();
    match input.next_including_whitespace()?.clone() {
        Token::IDHash(ref s) => Ok(SimpleSelector::Id(s.to_string())),
        Token::Delim('.') => {
            let ident = input.expect_ident()?.to_string();
            Ok(SimpleSelector::Class(ident))
        }
        Token::SquareBracketBlock => input.parse_nested_block(parse_attribute_selector),
        Token::Colon => {
            if input.try_parse(|p| p.expect_colon()).is_ok() {
                parse_pseudo_element(input)
            } else {
                parse_pseudo_class(input)
            }
        }
        _ => Err(loc.new_custom_error(ValueErrorKind::parse_error("expected a simple selector"))),
    }
}

fn parse_attribute_selector<'i>(input: &mut Parser<'i, '_>) -> Result<SimpleSelector, ParseError<'i>> {
    input.skip_whitespace();
    let (namespace, name) = match input.try_parse(parse_tag_or_namespace) {
        Ok(SimpleSelector::Type(full)) => match full.split_once('|') {
            Some((ns, n)) => (Some(ns.to_string()), n.to_string()),
            None => (None, full),
        },
        Ok(SimpleSelector::Namespace(ns)) => {
            let name = input.expect_ident()?.to_string();
            (ns, name)
        }
        _ => {
            let name = input.expect_ident()?.to_string();
            (None, name)
        }
    };
    input.skip_whitespace();

    let op = input.try_parse(|p| -> Result<&'static str, ParseError<'i>> {
        p.skip_whitespace();
        let t = p.next_including_whitespace()?.clone();
        match t {
            Token::Delim('=') => Ok("="),
            Token::IncludeMatch => Ok("~="),
            Token::DashMatch => Ok("|="),
            Token::PrefixMatch => Ok("^="),
            Token::SuffixMatch => Ok("$="),
            Token::SubstringMatch => Ok("*="),
            _ => Err(p.new_custom_error(ValueErrorKind::parse_error("expected an attribute operator"))),
        }
    });

    let op = match op {
        Ok(op) => op,
        Err(_) => {
            return Ok(SimpleSelector::AttrHas(AttrSelector {
                namespace,
                name,
                value: String::new(),
                case: AttrCaseSensitivity::Sensitive,
            }))
        }
    };

    input.skip_whitespace();
    let value = match input.next_including_whitespace()?.clone() {
        Token::QuotedString(ref s) => s.to_string(),
        Token::Ident(ref s) => s.to_string(),
        _ => return Err(input.new_custom_error(ValueErrorKind::parse_error("expected an attribute value"))),
    };
    input.skip_whitespace();

    let case = input
        .try_parse(|p| -> Result<(), ParseError<'i>> {
            match p.next_including_whitespace()?.clone() {
                Token::Ident(ref s) if s.eq_ignore_ascii_case("i") => Ok(()),
                _ => Err(p.new_custom_error(ValueErrorKind::parse_error("expected i flag"))),
            }
        })
        .map(|_| AttrCaseSensitivity::Insensitive)
        .unwrap_or(AttrCaseSensitivity::Sensitive);

    let attr = AttrSelector {
        namespace,
        name,
        value,
        case,
    };

    Ok(match op {
        "=" => SimpleSelector::AttrEquals(attr),
        "~=" => SimpleSelector::AttrIncludes(attr),
        "|=" => SimpleSelector::AttrDashMatch(attr),
        "^=" => SimpleSelector::AttrPrefix(attr),
        "$=" => SimpleSelector::AttrSuffix(attr),
        "*=" => SimpleSelector::AttrSubstring(attr),
        _ => unreachable!(),
    })
}

fn parse_pseudo_class<'i>(input: &mut Parser<'i, '_>) -> Result<SimpleSelector, ParseError<'i>> {
    let loc = input.current_source_location();
    if let Ok(name) = input.try_parse(|p| p.expect_ident().map(|s| s.to_string())) {
        return match_ignore_ascii_case! { &name,
            "root" => Ok(SimpleSelector::Root),
            "scope" => Ok(SimpleSelector::Root),
            "empty" => Ok(SimpleSelector::Empty),
            "first-child" => Ok(SimpleSelector::FirstChild),
            "last-child" => Ok(SimpleSelector::LastChild),
            "only-child" => Ok(SimpleSelector::OnlyChild),
            "link" | "any-link" => Ok(SimpleSelector::Link),
            "before" => Ok(SimpleSelector::PseudoElement(PseudoElement::Before)),
            "after" => Ok(SimpleSelector::PseudoElement(PseudoElement::After)),
            "first-letter" => Ok(SimpleSelector::PseudoElement(PseudoElement::FirstLetter)),
            "first-line" => Ok(SimpleSelector::PseudoElement(PseudoElement::FirstLine)),
            _ => Err(loc.new_custom_error(ValueErrorKind::value_error(&format!("unknown pseudo-class :{name}")))),
        };
    }

    let name = input.expect_function()?.to_string();
    input.parse_nested_block(|p| {
        match_ignore_ascii_case! { &name,
            "is" => Ok(SimpleSelector::Is(parse_selector_list_from_parser(p)?.selectors)),
            "where" => Ok(SimpleSelector::Where(parse_selector_list_from_parser(p)?.selectors)),
            "not" => Ok(SimpleSelector::Not(parse_selector_list_from_parser(p)?.selectors)),
            "has" => parse_has(p),
            "lang" => {
                let ident = p.expect_ident()?.to_string();
                Ok(SimpleSelector::Lang(ident))
            },
            "nth-child" => Ok(SimpleSelector::NthChild(parse_nth(p)?)),
            "nth-last-child" => Ok(SimpleSelector::NthLastChild(parse_nth(p)?)),
            "nth-of-type" => Ok(SimpleSelector::NthOfType(parse_nth(p)?)),
            "nth-last-of-type" => Ok(SimpleSelector::NthLastOfType(parse_nth(p)?)),
            _ => Err(loc.new_custom_error(ValueErrorKind::value_error(&format!(":{name}() is not supported")))),
        }
    })
}

/// `:has(R)` — `R` may start with a combinator (`:has(> b)`); a bare relative selector
/// with no leading combinator is treated as `Descendant` per §9's redesign note resolving
/// the source's ambiguous-early-return behavior.
fn parse_has<'i>(input: &mut Parser<'i, '_>) -> Result<SimpleSelector, ParseError<'i>> {
    input.skip_whitespace();
    let combinator = input.try_parse(peek_combinator_delim).unwrap_or(Combinator::Descendant);
    input.skip_whitespace();
    let list = parse_selector_list_from_parser(input)?;
    Ok(SimpleSelector::Has(combinator, list.selectors))
}

fn parse_pseudo_element<'i>(input: &mut Parser<'i, '_>) -> Result<SimpleSelector, ParseError<'i>> {
    let loc = input.current_source_location();
    let name = input.expect_ident()?.to_string();
    let pe = match_ignore_ascii_case! { &name,
        "before" => PseudoElement::Before,
        "after" => PseudoElement::After,
        "marker" => PseudoElement::Marker,
        "first-letter" => PseudoElement::FirstLetter,
        "first-line" => PseudoElement::FirstLine,
        _ => return Err(loc.new_custom_error(ValueErrorKind::value_error(&format!("unknown pseudo-element ::{name}")))),
    };
    Ok(SimpleSelector::PseudoElement(pe))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_type_selector() {
        let list = parse_selector_list("div").unwrap();
        assert_eq!(list.selectors.len(), 1);
        assert_eq!(list.selectors[0].compounds.len(), 1);
    }

    #[test]
    fn parses_descendant_and_child_combinators() {
        let list = parse_selector_list("div p > span").unwrap();
        let sel = &list.selectors[0];
        assert_eq!(sel.compounds.len(), 3);
        assert_eq!(sel.compounds[1].0, Combinator::Descendant);
        assert_eq!(sel.compounds[2].0, Combinator::Child);
    }

    #[test]
    fn parses_compound_with_id_class_attr() {
        let list = parse_selector_list("a#id.cls[href]").unwrap();
        let compound = &list.selectors[0].compounds[0].1;
        assert_eq!(compound.simples.len(), 4);
    }

    #[test]
    fn parses_comma_separated_list() {
        let list = parse_selector_list("a, b, c").unwrap();
        assert_eq!(list.selectors.len(), 3);
    }

    #[test]
    fn parses_nth_child() {
        let list = parse_selector_list(":nth-child(2n+1)").unwrap();
        match &list.selectors[0].compounds[0].1.simples[0] {
            SimpleSelector::NthChild(p) => assert_eq!((p.a, p.b), (2, 1)),
            _ => panic!("expected NthChild"),
        }
    }

    #[test]
    fn parses_has_with_child_combinator() {
        let list = parse_selector_list(":has(> b)").unwrap();
        match &list.selectors[0].compounds[0].1.simples[0] {
            SimpleSelector::Has(Combinator::Child, _) => (),
            other => panic!("unexpected {other:?}"),
        }
    }
}
