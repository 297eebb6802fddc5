//! Response Normalization
//!
//! Providers asked for JSON still wrap it in markdown fences, surround it
//! with prose, or interleave grounding citation markers such as `[3]`.
//! `normalize` repairs those artifacts and extracts the first complete JSON
//! value. It never returns a partial or default value.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").expect("fence pattern is valid"));

/// Clean raw provider text and parse the first JSON value in it
pub fn normalize(raw: &str) -> Result<Value, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let unfenced = strip_fences(raw);
    let cleaned = strip_citations(&unfenced);
    if cleaned.len() != unfenced.len() {
        tracing::debug!(
            removed_bytes = unfenced.len() - cleaned.len(),
            "stripped citation markers from provider output"
        );
    }
    let candidate = extract_json(&cleaned)?;

    serde_json::from_str(candidate).map_err(|e| ParseError::Malformed(e.to_string()))
}

/// `normalize`, then deserialize into `T`
pub fn normalize_into<T: DeserializeOwned>(raw: &str) -> Result<T, ParseError> {
    let value = normalize(raw)?;
    serde_json::from_value(value).map_err(|e| ParseError::Shape(e.to_string()))
}

/// Remove markdown code-fence delimiters anywhere in the text
pub fn strip_fences(text: &str) -> String {
    FENCE.replace_all(text, "").into_owned()
}

/// Remove `[n]` citation markers.
///
/// Prose before the first `{` or `[` is not scanned for quotes; markers in
/// it are simply dropped. From there on, inside string literals a marker is
/// always dropped. Outside them it is dropped unless it sits where an array
/// value may begin (after `:`, `,` or `[`, or at the very start of the
/// text), so `{"trend":[5]}` and a bare `[5]` survive.
pub fn strip_citations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        let opens_structure = match ch {
            '{' => true,
            '[' => citation_len(rest).is_none() || out.trim().is_empty(),
            _ => false,
        };
        if opens_structure {
            break;
        }
        if let Some(len) = citation_len(rest) {
            rest = &rest[len..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;

    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            } else if let Some(len) = citation_len(rest) {
                rest = &rest[len..];
                continue;
            }
        } else if ch == '"' {
            in_string = true;
        } else {
            if let Some(len) = citation_len(rest) {
                let value_position = if depth == 0 {
                    out.trim().is_empty()
                } else {
                    array_value_may_start(&out)
                };
                if !value_position {
                    rest = &rest[len..];
                    continue;
                }
            }
            match ch {
                '{' | '[' => depth += 1,
                '}' | ']' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Byte length of a `[digits]` marker at the start of `rest`
fn citation_len(rest: &str) -> Option<usize> {
    let inner = rest.strip_prefix('[')?;
    let digits = inner.bytes().take_while(u8::is_ascii_digit).count();
    (digits > 0 && inner.as_bytes().get(digits) == Some(&b']')).then_some(digits + 2)
}

fn array_value_may_start(preceding: &str) -> bool {
    matches!(preceding.trim_end().chars().last(), Some(':' | ',' | '['))
}

/// Slice out the first balanced JSON object or array
///
/// Starts at the earliest `{` or `[`, so both object-rooted and
/// array-rooted responses are supported.
pub fn extract_json(text: &str) -> Result<&str, ParseError> {
    let start = text.find(['{', '[']).ok_or(ParseError::NoStructure)?;

    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return Err(ParseError::Unbalanced);
                }
                if stack.is_empty() {
                    let end = start + offset + ch.len_utf8();
                    return Ok(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    Err(ParseError::Unbalanced)
}
