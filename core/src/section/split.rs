use crate::parse::balanced::scan_object;
use crate::section::locator::SectionLocator;
use crate::section::{options_locator, topology_locator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopologySplit {
    pub narrative: String,
    /// The object following the topology header, if it is complete and parses.
    pub topology: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionsSplit {
    pub narrative: String,
    /// Raw text of the options block, header excluded.
    pub options: Option<String>,
}

/// Cut the topology block out of `text`.
///
/// Once a header is found everything from it on is withheld from the
/// narrative until the object after it closes, so a streaming prefix never
/// shows half a JSON block.
pub fn split_topology(text: &str) -> TopologySplit {
    split_topology_with(topology_locator(), text)
}

pub fn split_topology_with(locator: &SectionLocator, text: &str) -> TopologySplit {
    let Some(span) = locator.locate(text) else {
        return TopologySplit {
            narrative: text.trim().to_string(),
            topology: None,
        };
    };
    let before = &text[..span.start];

    match scan_object(text, span.header_end()) {
        Some(scanned) => TopologySplit {
            narrative: join_parts(before, &text[scanned.end..]),
            topology: Some(scanned.value),
        },
        None => {
            tracing::debug!(header_at = span.start, "topology header without a complete object");
            TopologySplit {
                narrative: before.trim().to_string(),
                topology: None,
            }
        }
    }
}

/// Cut the options block (header to end of text) out of `text`.
pub fn split_options(text: &str) -> OptionsSplit {
    split_options_with(options_locator(), text)
}

pub fn split_options_with(locator: &SectionLocator, text: &str) -> OptionsSplit {
    let Some(span) = locator.locate(text) else {
        return OptionsSplit {
            narrative: text.trim().to_string(),
            options: None,
        };
    };
    let block = text[span.header_end()..].trim();
    OptionsSplit {
        narrative: text[..span.start].trim().to_string(),
        options: (!block.is_empty()).then(|| block.to_string()),
    }
}

fn join_parts(before: &str, after: &str) -> String {
    let before = before.trim();
    let after = after.trim();
    match (before.is_empty(), after.is_empty()) {
        (true, _) => after.to_string(),
        (_, true) => before.to_string(),
        _ => format!("{before}\n{after}"),
    }
}
