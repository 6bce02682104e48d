//! One-dimensional array literals: `{a,b,"c d",NULL}`.
//!
//! Elements are split on commas, surrounding whitespace is ignored, and an
//! unquoted `NULL` (any case) is a null element. Double-quoted elements may
//! contain commas, braces and backslash escapes; a quoted `"NULL"` is text.

use crate::error::{Result, SvecError};

pub fn parse_array_literal(input: &str) -> Result<Vec<Option<String>>> {
    let trimmed = input.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| {
            SvecError::MalformedLiteral(format!("expected {{...}}, got {:?}", trimmed))
        })?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut elements = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let element = if chars.next_if_eq(&'"').is_some() {
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => text.push(escaped),
                        None => return Err(malformed(inner, "dangling escape")),
                    },
                    Some(c) => text.push(c),
                    None => return Err(malformed(inner, "unterminated quoted element")),
                }
            }
            Some(text)
        } else {
            let mut text = String::new();
            while let Some(c) = chars.next_if(|&c| c != ',') {
                if matches!(c, '{' | '}' | '"' | '\\') {
                    return Err(malformed(inner, "unexpected character in element"));
                }
                text.push(c);
            }
            let text = text.trim_end();
            if text.is_empty() {
                return Err(malformed(inner, "empty element"));
            }
            if text.eq_ignore_ascii_case("NULL") {
                None
            } else {
                Some(text.to_string())
            }
        };
        elements.push(element);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return Err(malformed(inner, "expected ',' between elements")),
        }
    }

    Ok(elements)
}

/// Writes `{e1,e2,...}`; elements are emitted verbatim.
pub fn format_array_literal<I, S>(elements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from("{");
    for (i, element) in elements.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(element.as_ref());
    }
    out.push('}');
    out
}

fn malformed(literal: &str, reason: &str) -> SvecError {
    SvecError::MalformedLiteral(format!("{} in {{{}}}", reason, literal))
}
