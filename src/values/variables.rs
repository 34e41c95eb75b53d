//! Custom properties (`--foo: …`) and `var()` substitution with cycle detection (C10).
//!
//! Custom property values are stored verbatim as their original CSS text (§3: "stored
//! verbatim as token lists, never expanded") and only resolved once the cascade has
//! assembled the full custom-property environment for an element. Cycle detection follows
//! §9's recipe: a visited-set of names is threaded through the recursive expansion, and
//! re-entering a name already on the stack aborts the whole substitution, which the
//! cascade then treats as the property's initial value (§4.8 step 5, §8 "Variable cycle").

use std::collections::{HashMap, HashSet};

use cssparser::{Parser, ParserInput, ToCss, Token};

/// Is `name` a legal custom property name? `--[^\s]+` with length > 2, i.e. at least one
/// character after the leading `--` (§3).
pub fn is_custom_property_name(name: &str) -> bool {
    name.len() > 2 && name.starts_with("--") && !name[2..].chars().any(|c| c.is_whitespace())
}

/// The custom-property environment visible to one element during cascade: name (without
/// the leading `--`) to raw, unexpanded CSS text.
#[derive(Debug, Clone, Default)]
pub struct CustomProperties(HashMap<String, String>);

impl CustomProperties {
    pub fn new() -> Self {
        CustomProperties(HashMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, raw_value: impl Into<String>) {
        self.0.insert(name.into(), raw_value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Expands every `var(--name[, fallback])` in `text` against `env`, returning the fully
/// substituted CSS text, or `None` if a referenced name is undefined with no fallback, or
/// a cycle is detected — either of which means the whole declaration resolves to the
/// property's initial value per §4.8/§7.
pub fn expand_variables(text: &str, env: &CustomProperties) -> Option<String> {
    let mut visited = HashSet::new();
    expand_with_visited(text, env, &mut visited)
}

fn expand_with_visited(text: &str, env: &CustomProperties, visited: &mut HashSet<String>) -> Option<String> {
    let mut input_holder = ParserInput::new(text);
    let mut parser = Parser::new(&mut input_holder);
    let mut out = String::new();
    expand_tokens(&mut parser, env, visited, &mut out)?;
    Some(out)
}

fn expand_tokens<'i>(
    parser: &mut Parser<'i, '_>,
    env: &CustomProperties,
    visited: &mut HashSet<String>,
    out: &mut String,
) -> Option<()> {
    loop {
        let token = match parser.next_including_whitespace() {
            Ok(t) => t.clone(),
            Err(_) => return Some(()),
        };

        if let Token::Function(ref name) = token {
            if name.eq_ignore_ascii_case("var") {
                let expanded = parser
                    .parse_nested_block(|p| Ok::<_, cssparser::ParseError<'_, ()>>(expand_var_args(p, env, visited)))
                    .ok()??;
                out.push_str(&expanded);
                continue;
            }
        }

        // Any other token (including nested blocks) is re-serialized verbatim, recursing
        // into blocks so `var()` can appear anywhere, not just at the top level.
        match token {
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                token.to_css(out).ok()?;
                parser
                    .parse_nested_block(|p| -> Result<(), cssparser::ParseError<'_, ()>> {
                        expand_tokens(p, env, visited, out).ok_or_else(|| p.new_custom_error(()))
                    })
                    .ok()?;
                let close = match token {
                    Token::Function(_) | Token::ParenthesisBlock => ")",
                    Token::SquareBracketBlock => "]",
                    _ => "}",
                };
                out.push_str(close);
            }
            other => {
                other.to_css(out).ok()?;
            }
        }
    }
}

fn expand_var_args<'i>(
    parser: &mut Parser<'i, '_>,
    env: &CustomProperties,
    visited: &mut HashSet<String>,
) -> Option<String> {
    parser.skip_whitespace();
    let name_tok = parser.next().ok()?.clone();
    let full_name = match name_tok {
        Token::Ident(ref s) if s.starts_with("--") => s.to_string(),
        _ => return None,
    };
    let has_fallback = parser.try_parse(|p| p.expect_comma()).is_ok();
    let fallback_text = if has_fallback {
        let mut s = String::new();
        loop {
            match parser.next_including_whitespace() {
                Ok(t) => t.to_css(&mut s).ok()?,
                Err(_) => break,
            }
        }
        Some(s)
    } else {
        None
    };

    if visited.contains(&full_name) {
        return None;
    }

    if let Some(raw) = env.get(&full_name) {
        visited.insert(full_name.clone());
        let result = expand_with_visited(raw, env, visited);
        visited.remove(&full_name);
        result
    } else if let Some(fallback) = fallback_text {
        expand_with_visited(&fallback, env, visited)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_substitution() {
        let mut env = CustomProperties::new();
        env.insert("--x", "10px");
        let result = expand_variables("calc(var(--x) * 2)", &env).unwrap();
        assert_eq!(result, "calc(10px * 2)");
    }

    #[test]
    fn undefined_with_no_fallback_fails() {
        let env = CustomProperties::new();
        assert!(expand_variables("var(--missing)", &env).is_none());
    }

    #[test]
    fn undefined_uses_fallback() {
        let env = CustomProperties::new();
        let result = expand_variables("var(--missing, 5px)", &env).unwrap();
        assert_eq!(result, "5px");
    }

    #[test]
    fn cycle_is_detected() {
        let mut env = CustomProperties::new();
        env.insert("--a", "var(--b)");
        env.insert("--b", "var(--a)");
        assert!(expand_variables("var(--a)", &env).is_none());
    }

    #[test]
    fn custom_property_name_validation() {
        assert!(is_custom_property_name("--x"));
        assert!(!is_custom_property_name("--"));
        assert!(!is_custom_property_name("-x"));
        assert!(!is_custom_property_name("color"));
    }
}
