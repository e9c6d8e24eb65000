use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that models emit in place of `=` (fullwidth, box drawing,
/// super/subscript and small-form variants).
const EQUALS_LOOKALIKES: &[char] = &[
    '\u{FF1D}', // ＝
    '\u{2550}', // ═
    '\u{207C}', // ⁼
    '\u{208C}', // ₌
    '\u{A78A}', // ꞊
    '\u{FE66}', // ﹦
];

/// A run of backslashes in front of markdown punctuation the renderer escaped.
static ESCAPED_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\+([=_*\-])").expect("escaped punctuation pattern"));

/// Canonicalize model output before any pattern matching runs.
///
/// Look-alikes are collapsed first so that an escaped look-alike (`\＝`)
/// unescapes in the same pass; this keeps `normalize` idempotent.
pub fn normalize(raw: &str) -> String {
    let collapsed: String = if raw.contains(EQUALS_LOOKALIKES) {
        raw.chars()
            .map(|c| if EQUALS_LOOKALIKES.contains(&c) { '=' } else { c })
            .collect()
    } else {
        raw.to_string()
    };

    if !collapsed.contains('\\') {
        return collapsed;
    }
    ESCAPED_PUNCT_RE.replace_all(&collapsed, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unescapes_markdown_punctuation() {
        assert_eq!(normalize(r"\=\=\= GRAPH\_TOPOLOGY \=\=\="), "=== GRAPH_TOPOLOGY ===");
        assert_eq!(normalize(r"\*\*Options:\*\*"), "**Options:**");
        assert_eq!(normalize(r"a \- b"), "a - b");
    }

    #[test]
    fn test_collapses_lookalikes() {
        assert_eq!(normalize("＝＝＝ GRAPH_TOPOLOGY ═══"), "=== GRAPH_TOPOLOGY ===");
    }

    #[test]
    fn test_escaped_lookalike_unescapes() {
        assert_eq!(normalize("\\＝"), "=");
    }

    #[test]
    fn test_leaves_other_escapes_alone() {
        assert_eq!(normalize(r#"{"a": "x\"y"}"#), r#"{"a": "x\"y"}"#);
        assert_eq!(normalize(r"C:\path\n"), r"C:\path\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalize_is_idempotent_on_escape_heavy_input(s in "[\\\\=_*\\-＝═a ]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
