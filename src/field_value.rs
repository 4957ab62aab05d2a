//! Free text typed into a config form → typed value.
//!
//! [`parse_field_value`] inverts [`emit_expression`](crate::emitter::emit_expression):
//! for every expression the emitter can produce, parsing its rendering
//! yields the same expression.

use crate::ast::Expression;
use once_cell::sync::Lazy;
use regex::Regex;

static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{([\p{L}_][\p{L}\p{N}_]*)\}\}$").expect("valid regex"));
static VAR_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\{([\p{L}_][\p{L}\p{N}_]*)(?:\.([\p{L}_][\p{L}\p{N}_]*))?\}$")
        .expect("valid regex")
});
static PAGE_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\p{Lu}[\p{L}\p{N}_]*)\.([\p{L}_][\p{L}\p{N}_]*)$").expect("valid regex")
});
static BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(true|false)$").expect("valid regex"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid regex"));

/// Derive an expression from raw text, in precedence order:
/// `{{NAME}}`, `{name}` / `{page.name}`, bare `Page.field`, `TRUE`/`FALSE`,
/// a number, and finally a string literal (surrounding quotes removed).
pub fn parse_field_value(raw: &str) -> Expression {
    let text = raw.trim();

    if let Some(caps) = ENV_REF.captures(text) {
        return Expression::Env {
            name: caps[1].to_string(),
        };
    }
    if let Some(caps) = VAR_REF.captures(text) {
        return match caps.get(2) {
            Some(name) => Expression::Variable {
                page: Some(caps[1].to_string()),
                name: name.as_str().to_string(),
            },
            None => Expression::Variable {
                page: None,
                name: caps[1].to_string(),
            },
        };
    }
    if let Some(caps) = PAGE_MEMBER.captures(text) {
        return Expression::Variable {
            page: Some(caps[1].to_string()),
            name: caps[2].to_string(),
        };
    }
    if BOOLEAN.is_match(text) {
        return Expression::Boolean(text.eq_ignore_ascii_case("true"));
    }
    if NUMBER.is_match(text) {
        if let Ok(n) = text.parse::<f64>() {
            return Expression::Number(n);
        }
    }
    Expression::String(strip_quotes(raw))
}

/// Numeric form fields; anything unparseable becomes `0`.
pub fn parse_number_field(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Boolean form fields, case-insensitive.
pub fn parse_bool_field(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("true")
}

/// Remove one pair of surrounding double quotes, undoing the emitter's
/// escaping. Unquoted text is returned as typed.
pub fn strip_quotes(raw: &str) -> String {
    let text = raw.trim();
    match text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => unescape(inner),
        None => raw.to_string(),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(c @ ('"' | '\\')) => out.push(c),
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => out.push('\\'),
        }
    }
    out
}
