use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Bare `S` / `S12` statement tokens a model left unquoted inside a list,
/// e.g. `"supporters": [S1, S4]`.
static BARE_LIST_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\[,]\s*)(S\d*)\b").expect("bare list token pattern"));

/// A balanced JSON object found in a larger text.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedObject {
    pub value: Value,
    pub start: usize,
    pub end: usize,
}

/// Scan for the first balanced `{...}` at or after `from` and parse it.
///
/// Braces inside string literals are ignored. Returns `None` when no object
/// starts after `from`, when the object is not yet closed (streaming), or
/// when it fails to parse even after the bare-token repair.
pub fn scan_object(text: &str, from: usize) -> Option<ScannedObject> {
    let tail = text.get(from..)?;
    let start = from + tail.find('{')?;
    let end = start + balanced_len(&text[start..])?;

    let candidate = &text[start..end];
    match parse_with_repair(candidate) {
        Some(value) => Some(ScannedObject { value, start, end }),
        None => {
            tracing::debug!(start, end, "balanced region did not parse as JSON");
            None
        }
    }
}

/// Length in bytes of the balanced object that opens at `s[0]`.
fn balanced_len(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `candidate`; on failure quote bare list tokens and try once more.
pub fn parse_with_repair(candidate: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(candidate) {
        return Some(v);
    }
    let repaired = quote_bare_tokens(candidate)?;
    match serde_json::from_str::<Value>(&repaired) {
        Ok(v) => {
            tracing::debug!("parsed JSON after quoting bare list tokens");
            Some(v)
        }
        Err(_) => None,
    }
}

/// Quote bare list tokens in the code between string literals, leaving
/// string contents alone. `None` when there was nothing to quote.
fn quote_bare_tokens(candidate: &str) -> Option<String> {
    let mut out = String::with_capacity(candidate.len() + 8);
    let mut changed = false;
    let mut code_start = 0;

    let end = candidate.len();
    for (start, stop) in string_spans(candidate).into_iter().chain([(end, end)]) {
        let code = &candidate[code_start..start];
        if BARE_LIST_TOKEN_RE.is_match(code) {
            changed = true;
            out.push_str(&BARE_LIST_TOKEN_RE.replace_all(code, "$1\"$2\""));
        } else {
            out.push_str(code);
        }
        out.push_str(&candidate[start..stop]);
        code_start = stop;
    }

    changed.then_some(out)
}

/// Byte spans of string literals, quotes included. An unterminated literal
/// runs to the end.
fn string_spans(s: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match (ch, open) {
            ('\\', Some(_)) => escape_next = true,
            ('"', Some(start)) => {
                spans.push((start, i + 1));
                open = None;
            }
            ('"', None) => open = Some(i),
            _ => {}
        }
    }
    if let Some(start) = open {
        spans.push((start, s.len()));
    }
    spans
}
