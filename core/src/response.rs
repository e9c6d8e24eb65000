use crate::graph::model::ClaimGraph;
use crate::graph::parser::graph_from_value;
use crate::options::{parse_decision_options, DecisionOption};
use crate::section::{split_options, split_topology};
use crate::text::normalize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One accumulated model response split into its parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResponse {
    pub narrative: String,
    /// Raw topology object, whatever its shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<Value>,
    /// The topology object read as a claim graph, when it is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<ClaimGraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options_text: Option<String>,
    #[serde(default)]
    pub options: Vec<DecisionOption>,
}

/// Normalize, split off the topology block, then the options block.
///
/// Safe to call on every streamed chunk: a section whose header has arrived
/// but whose body has not is withheld rather than shown half-formed.
pub fn parse_response(text: &str) -> ParsedResponse {
    let normalized = normalize(text);
    let topology_split = split_topology(&normalized);
    let options_split = split_options(&topology_split.narrative);

    let graph = topology_split.topology.as_ref().and_then(graph_from_value);
    let options = options_split
        .options
        .as_deref()
        .map(parse_decision_options)
        .unwrap_or_default();

    tracing::debug!(
        has_topology = topology_split.topology.is_some(),
        has_graph = graph.is_some(),
        options = options.len(),
        "response parsed"
    );

    ParsedResponse {
        narrative: options_split.narrative,
        topology: topology_split.topology,
        graph,
        options_text: options_split.options,
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_response() {
        let text = format!(
            "{}\n\\=\\=\\= GRAPH\\_TOPOLOGY \\=\\=\\=\n{{\"claims\": [{{\"id\": \"c1\", \"label\": \"Ship\", \"stance\": \"prescriptive\"}}]}}\n{}\n**Options:**\n- **Ship**: release now\n- **Hold**: wait a week\n",
            "The models mostly agree.",
            "Some closing analysis. ".repeat(4)
        );
        let parsed = parse_response(&text);
        assert!(parsed.narrative.starts_with("The models mostly agree.\nSome closing analysis."));
        assert!(!parsed.narrative.contains("Options"));
        assert_eq!(parsed.graph.as_ref().map(|g| g.claims.len()), Some(1));
        assert_eq!(parsed.options.len(), 2);
        assert_eq!(parsed.options[1].label, "Hold");
    }

    #[test]
    fn test_plain_prose() {
        let parsed = parse_response("Nothing structured here.");
        assert_eq!(parsed.narrative, "Nothing structured here.");
        assert!(parsed.topology.is_none());
        assert!(parsed.options.is_empty());
    }
}
