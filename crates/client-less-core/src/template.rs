//! Path template scanning.
//!
//! Placeholders are written `{name}` where `name` is one or more characters
//! drawn from ASCII alphanumerics and `-@:%_+.~#?&/=`. Anything else between
//! braces is not a placeholder and stays literal text.

use crate::bind::PathVariables;

/// One piece of a path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

/// Whether `c` may appear in a placeholder name.
pub fn is_variable_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '-' | '@' | ':' | '%' | '_' | '+' | '.' | '~' | '#' | '?' | '&' | '/' | '='
        )
}

/// Split a template into literal text and placeholders in a single pass.
///
/// A `{` that does not open a well-formed placeholder is kept as literal text
/// and scanning resumes right after it.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'{' {
            pos += 1;
            continue;
        }

        let name_start = pos + 1;
        let name_len = template[name_start..]
            .chars()
            .take_while(|c| is_variable_char(*c))
            .map(char::len_utf8)
            .sum::<usize>();
        let name_end = name_start + name_len;

        if name_len > 0 && bytes.get(name_end) == Some(&b'}') {
            if literal_start < pos {
                tokens.push(Token::Literal(&template[literal_start..pos]));
            }
            tokens.push(Token::Variable(&template[name_start..name_end]));
            pos = name_end + 1;
            literal_start = pos;
        } else {
            pos += 1;
        }
    }

    if literal_start < bytes.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }
    tokens
}

/// Every placeholder name in template order, duplicates included.
pub fn variable_names(template: &str) -> impl Iterator<Item = &str> {
    tokenize(template).into_iter().filter_map(|token| match token {
        Token::Variable(name) => Some(name),
        Token::Literal(_) => None,
    })
}

/// Placeholders of `template` with no entry in `bindings`.
///
/// Names are reported once each, in the order they first appear.
pub fn unbound_variables(template: &str, bindings: &PathVariables) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for name in variable_names(template) {
        if !bindings.contains(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    missing
}
