//! `[variable: option/option]` placeholders in prompt templates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static BRACKET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([A-Za-z_][\w \-]{0,63}?)[ \t]*:[ \t]*([^\[\]\n:]+)\]").expect("bracket pattern")
});

/// A placeholder and its byte span in the template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bracket {
    pub variable: String,
    pub options: Vec<String>,
    pub start: usize,
    pub end: usize,
}

impl Bracket {
    pub fn default_option(&self) -> &str {
        self.options.first().map(String::as_str).unwrap_or_default()
    }
}

/// Placeholders in template order. Brackets with no non-empty option are
/// not placeholders and are skipped.
pub fn parse_brackets(template: &str) -> Vec<Bracket> {
    BRACKET_RE
        .captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let variable = caps.get(1)?.as_str().trim().to_string();
            let options: Vec<String> = caps
                .get(2)?
                .as_str()
                .split('/')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            (!options.is_empty()).then(|| Bracket {
                variable,
                options,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Substitute each bracket span with the selected value for its variable,
/// or its first option when nothing is selected.
///
/// Spans are replaced in one left-to-right pass; spans that overlap an
/// earlier one or fall outside the template are left alone.
pub fn build_prompt(
    template: &str,
    brackets: &[Bracket],
    selections: &HashMap<String, String>,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut cursor = 0;
    for bracket in brackets {
        if bracket.start < cursor
            || bracket.end > template.len()
            || !template.is_char_boundary(bracket.start)
            || !template.is_char_boundary(bracket.end)
        {
            tracing::debug!(variable = %bracket.variable, start = bracket.start, "bracket span skipped");
            continue;
        }
        out.push_str(&template[cursor..bracket.start]);
        let value = selections
            .get(&bracket.variable)
            .map(String::as_str)
            .unwrap_or_else(|| bracket.default_option());
        out.push_str(value);
        cursor = bracket.end;
    }
    out.push_str(&template[cursor..]);
    out
}

pub fn expand_prompt(template: &str, selections: &HashMap<String, String>) -> String {
    build_prompt(template, &parse_brackets(template), selections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_offsets() {
        let brackets = parse_brackets("Use [tone: formal/casual] voice");
        assert_eq!(
            brackets,
            vec![Bracket {
                variable: "tone".into(),
                options: vec!["formal".into(), "casual".into()],
                start: 4,
                end: 25,
            }]
        );
    }

    #[test]
    fn test_selected_and_default() {
        let template = "Write a [length: short/long] [format: list / essay] about [topic: cats]";
        assert_eq!(
            expand_prompt(template, &select(&[("format", "essay")])),
            "Write a short essay about cats"
        );
    }

    #[test]
    fn test_plain_brackets_are_not_placeholders() {
        assert!(parse_brackets("see [1] and [link](https://x.y) and [note: /]").is_empty());
    }

    #[test]
    fn test_stale_spans_are_skipped() {
        let brackets = parse_brackets("A [x: 1/2] B");
        let out = build_prompt("A", &brackets, &HashMap::new());
        assert_eq!(out, "A");
    }
}
