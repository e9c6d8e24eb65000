use extract_core::response::parse_response;
use extract_core::section::{split_options, split_topology};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

const FULL_RESPONSE: &str = "Both models recommend a staged rollout.\n\n\
=== GRAPH_TOPOLOGY ===\n\
{\"claims\": [\
{\"id\": \"c1\", \"label\": \"Stage it\", \"stance\": \"prescriptive\", \"supporters\": [\"s_0_1\", \"s_1_3\"], \"enables\": [\"c2\"]},\
{\"id\": \"c2\", \"label\": \"Measure\", \"stance\": \"assertive\", \"supporters\": [\"s_1_4\"]}\
]}\n\
The remaining disagreement is about timing, which depends on staffing and budget.\n\n\
**Options:**\n\
- **Stage it**: roll out to one region first\n\
- **Big bang**: release everywhere at once\n";

#[test]
fn topology_block_is_cut_from_narrative() {
    let split = split_topology("intro text\n=== GRAPH_TOPOLOGY ===\n{\"nodes\":[1,2]}\nmore text");
    assert_eq!(split.narrative, "intro text\nmore text");
    assert_eq!(split.topology, Some(json!({"nodes": [1, 2]})));
}

#[test]
fn early_quoted_options_label_is_rejected() {
    let text = format!(
        "The user asked \"Options: which is cheaper?\" so we compared both.\n{}\n**Options:**\n- Cheap\n- Fast\n",
        "The comparison covered cost, latency and support. ".repeat(3)
    );
    let split = split_options(&text);
    assert_eq!(split.options.as_deref(), Some("- Cheap\n- Fast"));
    assert!(split.narrative.contains("\"Options: which is cheaper?\""));
}

#[test]
fn escaped_headers_are_normalized_before_splitting() {
    let parsed = parse_response("Intro.\n\\=\\=\\= GRAPH\\_TOPOLOGY \\=\\=\\=\n{\"claims\": []}\nOutro.");
    assert_eq!(parsed.narrative, "Intro.\nOutro.");
    assert_eq!(parsed.graph.map(|g| g.claims.len()), Some(0));
}

#[test]
fn full_response_splits_into_parts() {
    let parsed = parse_response(FULL_RESPONSE);
    assert_eq!(
        parsed.narrative,
        "Both models recommend a staged rollout.\nThe remaining disagreement is about timing, which depends on staffing and budget."
    );
    let graph = parsed.graph.expect("graph");
    assert_eq!(graph.claims.len(), 2);
    assert_eq!(graph.claims[0].enables, vec!["c2".to_string()]);
    let labels: Vec<_> = parsed.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Stage it", "Big bang"]);
}

#[test]
fn growing_prefix_never_exposes_partial_topology() {
    let final_parse = parse_response(FULL_RESPONSE);
    let final_graph = final_parse.graph.clone().expect("graph");

    for (cut, _) in FULL_RESPONSE.char_indices() {
        let prefix = &FULL_RESPONSE[..cut];
        let parsed = parse_response(prefix);
        assert!(
            !parsed.narrative.contains("\"claims\""),
            "raw topology leaked at prefix length {cut}"
        );
        if let Some(graph) = parsed.graph {
            assert_eq!(graph, final_graph, "graph differs at prefix length {cut}");
        }
        for option in &parsed.options {
            assert!(
                final_parse.options.iter().any(|o| o.label.starts_with(&option.label)),
                "option {:?} at prefix length {cut} is not part of the final parse",
                option.label
            );
        }
    }
}

proptest! {
    #[test]
    fn prefix_topology_is_absent_or_final(cut in 0usize..FULL_RESPONSE.len()) {
        let mut cut = cut;
        while !FULL_RESPONSE.is_char_boundary(cut) {
            cut -= 1;
        }
        let split = split_topology(&FULL_RESPONSE[..cut]);
        let full = split_topology(FULL_RESPONSE);
        if let Some(topology) = split.topology {
            prop_assert_eq!(Some(topology), full.topology);
        }
    }
}
