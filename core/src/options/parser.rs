use crate::parse::heuristics::{list_items, split_label, strip_emphasis};
use serde::{Deserialize, Serialize};

const DASH_SEPARATORS: &[&str] = &[" \u{2014} ", " \u{2013} ", " - "];

/// One choice from the options block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOption {
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Read the options block into labelled choices.
///
/// Accepts `- **Label**: description`, `1. Label — description`,
/// `- Label: description` and bare items. A block without list markup is
/// read one option per non-empty line.
pub fn parse_decision_options(block: &str) -> Vec<DecisionOption> {
    let mut items = list_items(block);
    if items.is_empty() {
        items = block
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
    }
    items.iter().filter_map(|item| option_from_item(item)).collect()
}

fn option_from_item(item: &str) -> Option<DecisionOption> {
    let (label, description) = match split_label(item) {
        (Some(label), rest) => (label, rest),
        (None, rest) => split_on_dash(&rest),
    };
    let label = strip_emphasis(&label).to_string();
    if !label.chars().any(char::is_alphanumeric) {
        return None;
    }
    Some(DecisionOption {
        label,
        description: strip_emphasis(&description).to_string(),
    })
}

fn split_on_dash(item: &str) -> (String, String) {
    DASH_SEPARATORS
        .iter()
        .filter_map(|sep| item.find(sep).map(|at| (at, sep.len())))
        .min_by_key(|(at, _)| *at)
        .map(|(at, len)| (item[..at].trim().to_string(), item[at + len..].trim().to_string()))
        .unwrap_or_else(|| (item.trim().to_string(), String::new()))
}
