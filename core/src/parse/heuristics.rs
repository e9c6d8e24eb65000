//! Section-scoped fallbacks for prose answers.
//!
//! A section is a header line naming it (`## Gap Detection`, `**Gap
//! Detection:**`, `🔍 Gap Detection`) followed by a block that runs until the
//! next header line. Header names are matched case-insensitively.

use once_cell::sync::Lazy;
use regex::Regex;

/// A line that stands alone as a header: markdown heading, a bold line with
/// nothing after it, or an emoji-led title.
static BLOCK_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S.*|\*\*[^*\n]+\*\*:?[ \t]*|\*\*[^*\n]+:\*\*[ \t]*|\p{So}\x{FE0F}?[ \t]*\**[A-Z][^\n]{0,60})$",
    )
    .expect("header line pattern")
});

/// A bold `Label:` lead followed by text on the same line.
static INLINE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*\*\*[^*\n]+(?::\*\*|\*\*:)[ \t]*\S.*$").expect("inline label pattern")
});

static LIST_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?:[-*•]|\d{1,3}[.)])[ \t]+(.+?)[ \t]*$").expect("list item pattern")
});

/// The body of the first section whose header names one of `names`.
///
/// Text on the header line after a colon (`**Gap Detection:** none found`)
/// is part of the body.
pub fn section_block<'a>(text: &'a str, names: &[&str]) -> Option<&'a str> {
    let alternatives = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let header = Regex::new(&format!(
        r"(?mi)^[ \t]*(?:#{{1,6}}[ \t]*)?(?:\p{{So}}\x{{FE0F}}?[ \t]*)?(?:\*\*)?[ \t]*(?:{alternatives})[ \t]*(?:\*\*)?[ \t]*(?::[ \t]*(?:\*\*)?|$)"
    ))
    .ok()?;

    let m = header.find(text)?;
    let body_start = m.end();

    // Under a standalone header, bold `Label:` lines are the block's own
    // fields. Under an inline one (`**Gap Detection:** ...`) they are siblings.
    let inline = text[body_start..]
        .lines()
        .next()
        .is_some_and(|rest| !rest.trim().is_empty());
    let mut body_end = next_boundary(&BLOCK_HEADER_RE, text, body_start);
    if inline {
        body_end = body_end.min(next_boundary(&INLINE_LABEL_RE, text, body_start));
    }

    let body = text[body_start..body_end].trim();
    (!body.is_empty()).then_some(body)
}

/// Start of the first `boundary` line that begins on a later line than `from`.
fn next_boundary(boundary: &Regex, text: &str, from: usize) -> usize {
    boundary
        .find_iter(text)
        .map(|h| h.start())
        .find(|&s| s >= from && text[from..s].contains('\n'))
        .unwrap_or(text.len())
}

/// Bullet or numbered items of a block, with markup left intact.
pub fn list_items(block: &str) -> Vec<String> {
    block
        .lines()
        .filter_map(|line| LIST_ITEM_RE.captures(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// `Label: value` lines inside a block, e.g. `**Issue:** scope is unclear`.
pub fn labeled_value(block: &str, labels: &[&str]) -> Option<String> {
    for line in block.lines() {
        let cleaned = strip_list_marker(line);
        let cleaned = cleaned.trim_start_matches('*').trim_start();
        for label in labels {
            let Some(head) = cleaned.get(..label.len()) else {
                continue;
            };
            if !head.eq_ignore_ascii_case(label) {
                continue;
            }
            let rest = cleaned[label.len()..].trim_start_matches('*').trim_start();
            if let Some(value) = rest.strip_prefix(':') {
                let value = strip_emphasis(value.trim());
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn strip_list_marker(line: &str) -> &str {
    match LIST_ITEM_RE.captures(line).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => line.trim(),
    }
}

/// Remove leading and trailing `*`/`_` emphasis markers.
pub fn strip_emphasis(s: &str) -> &str {
    s.trim_matches(|c| c == '*' || c == '_').trim()
}

/// Split `**Label**: rest` or `Label: rest` into its two halves.
pub fn split_label(item: &str) -> (Option<String>, String) {
    let item = item.trim();
    if let Some(after) = item.strip_prefix("**") {
        if let Some(close) = after.find("**") {
            let label = after[..close].trim().trim_end_matches(':').trim();
            let rest = after[close + 2..]
                .trim_start()
                .trim_start_matches([':', '-', '\u{2014}', '\u{2013}'])
                .trim();
            if !label.is_empty() {
                return (Some(label.to_string()), rest.to_string());
            }
        }
    }
    if let Some(colon) = item.find(':') {
        let label = item[..colon].trim();
        if !label.is_empty() && label.len() <= 48 && !item[colon + 1..].starts_with("//") {
            return (
                Some(strip_emphasis(label).to_string()),
                item[colon + 1..].trim().to_string(),
            );
        }
    }
    (None, item.to_string())
}
