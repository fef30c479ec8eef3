//! Whole-token tag substitution.
//!
//! A tag matches only when it is not glued to a longer token: the characters
//! directly before and after the match must not be word characters (letters,
//! digits, `_`). Replacement text is never re-scanned, so mapping entries do
//! not chain into each other.

use serde_json::Value;

use crate::mapping::TagMapping;

/// The tag-bearing value pulled out of a query node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPayload {
    /// A metric/filter query string, matched token-wise.
    Text(String),
    /// A tag list, matched element-wise by equality.
    List(Vec<String>),
}

impl TagPayload {
    /// Reads a string or an array made only of strings.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Text(s) => Value::String(s),
            Self::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        }
    }
}

/// Outcome of one substitution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub value: TagPayload,
    pub changed: bool,
}

pub fn substitute(payload: &TagPayload, mapping: &TagMapping) -> Substitution {
    match payload {
        TagPayload::Text(text) => {
            let (value, changed) = substitute_text(text, mapping);
            Substitution {
                value: TagPayload::Text(value),
                changed,
            }
        }
        TagPayload::List(items) => {
            let mut changed = false;
            let value = items
                .iter()
                .map(|item| match mapping.get(item) {
                    Some(new) if new != item.as_str() => {
                        changed = true;
                        new.to_string()
                    }
                    _ => item.clone(),
                })
                .collect();
            Substitution {
                value: TagPayload::List(value),
                changed,
            }
        }
    }
}

/// Rewrites every token-bounded occurrence of each mapping key in `text`.
///
/// All matches are located in the original text first. When matches from
/// different entries overlap, the entry that comes first in the mapping
/// keeps its span.
pub fn substitute_text(text: &str, mapping: &TagMapping) -> (String, bool) {
    let mut spans: Vec<(usize, usize, &str)> = Vec::new();

    for (old, new) in mapping.iter() {
        for start in token_matches(text, old) {
            let end = start + old.len();
            if spans.iter().any(|&(s, e, _)| start < e && s < end) {
                continue;
            }
            spans.push((start, end, new));
        }
    }

    if spans.is_empty() {
        return (text.to_string(), false);
    }

    spans.sort_unstable_by_key(|&(start, _, _)| start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut changed = false;
    for (start, end, new) in spans {
        out.push_str(&text[cursor..start]);
        out.push_str(new);
        changed |= &text[start..end] != new;
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    (out, changed)
}

/// Byte offsets of every token-bounded occurrence of `needle`.
fn token_matches(haystack: &str, needle: &str) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() {
        return found;
    }

    let mut from = 0;
    while let Some(rel) = haystack[from..].find(needle) {
        let start = from + rel;
        let end = start + needle.len();
        if is_token_bounded(haystack, start, end) {
            found.push(start);
            from = end;
        } else {
            // Step one char so overlapping candidates are still considered.
            let step = haystack[start..].chars().next().map_or(1, char::len_utf8);
            from = start + step;
        }
        if from >= haystack.len() {
            break;
        }
    }
    found
}

fn is_token_bounded(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
