use extract_core::graph::legacy::{ClaimRole, EdgeOrigin, EdgeType};
use extract_core::graph::{
    adapt_to_legacy, detect_graph_schema, parse_claim_graph, restore_current, GraphSchema,
    StatementIndex, TurnMetadata,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const GRAPH_RESPONSE: &str = r#"Here is how the answers relate.

## 🕸️ Graph Topology
```json
{"claims": [
  {"id": "c1", "label": "Use Postgres", "stance": "prescriptive",
   "supporters": ["s_0_2", "s_1_1"], "enables": ["c3"],
   "conflicts": [{"claimId": "c2", "nature": "optimization", "question": "Scale or simplicity?"}]},
  {"id": "c2", "label": "Use DynamoDB", "stance": "cautionary",
   "supporters": ["s_2_1"],
   "conflicts": [{"claimId": "c1", "nature": "contradiction"}]},
  {"id": "c3", "label": "Add read replicas", "stance": "dependent",
   "supporters": [S1],
   "gates": [{"type": "prerequisite", "claimId": "c1", "condition": "Postgres is chosen"}]}
]}
```
"#;

fn turn() -> TurnMetadata {
    TurnMetadata {
        query: "Which database?".into(),
        turn: 2,
        model_count: 3,
    }
}

fn index() -> StatementIndex {
    let mut index: StatementIndex = [("s_0_2", 0), ("s_1_1", 1)].into_iter().collect();
    index.insert("s_2_1", 2);
    assert_eq!(index.len(), 3);
    index
}

#[test]
fn graph_is_scanned_from_topology_section() {
    let graph = parse_claim_graph(GRAPH_RESPONSE).expect("graph");
    let ids: Vec<_> = graph.claims.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    assert_eq!(graph.claims[2].supporters, vec!["S1".to_string()]);
    assert_eq!(graph.claims[2].gates.prerequisites[0].claim_id, "c1");
    assert_eq!(graph.claim("c2").map(|c| c.label.as_str()), Some("Use DynamoDB"));
    assert!(graph.claim("c9").is_none());
}

#[test]
fn adapter_derives_roles_supporters_and_edges() {
    let graph = parse_claim_graph(GRAPH_RESPONSE).expect("graph");
    let out = adapt_to_legacy(&graph, &index(), &turn());
    assert!(out.warnings.is_empty(), "unexpected warnings: {:?}", out.warnings);

    let legacy = &out.graph;
    assert_eq!(legacy.claims[0].supporters, vec![0, 1]);
    assert_eq!(legacy.claims[0].role, Some(ClaimRole::Anchor));
    assert_eq!(legacy.claims[1].role, Some(ClaimRole::Challenger));
    assert_eq!(legacy.claims[1].challenges.as_deref(), Some("c1"));
    assert_eq!(legacy.claims[2].supporters, vec![1]);
    assert_eq!(legacy.claims[2].role, None);

    let edges: Vec<_> = legacy
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str(), e.edge_type))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("c1", "c3", EdgeType::Supports),
            ("c1", "c2", EdgeType::Tradeoff),
            ("c2", "c1", EdgeType::Conflicts),
            ("c1", "c3", EdgeType::Prerequisite),
        ]
    );

    assert_eq!(legacy.edges_of_type(EdgeType::Prerequisite).count(), 1);

    let meta = legacy.meta.as_ref().expect("meta");
    assert_eq!(meta.query, "Which database?");
    assert_eq!(meta.derived_from, "v3");
}

#[test]
fn side_channels_carry_source_data() {
    let graph = parse_claim_graph(GRAPH_RESPONSE).expect("graph");
    let out = adapt_to_legacy(&graph, &index(), &turn());

    for (legacy, current) in out.graph.claims.iter().zip(&graph.claims) {
        assert_eq!(legacy.v3.as_ref(), Some(current));
    }
    match out.graph.edges[1].v3.as_ref() {
        Some(EdgeOrigin::Conflict { claim_id, conflict }) => {
            assert_eq!(claim_id, "c1");
            assert_eq!(conflict, &graph.claims[0].conflicts[0]);
        }
        other => panic!("unexpected edge origin {other:?}"),
    }
    assert_eq!(restore_current(&out.graph), graph);
}

#[test]
fn legacy_graph_survives_serialization() {
    let graph = parse_claim_graph(GRAPH_RESPONSE).expect("graph");
    let out = adapt_to_legacy(&graph, &index(), &turn());
    let stored = serde_json::to_value(&out.graph).expect("serialize");
    assert_eq!(stored["claims"][0]["_v3"]["stance"], json!("prescriptive"));
    assert_eq!(stored["edges"][0]["type"], json!("supports"));

    match detect_graph_schema(&stored) {
        Some(GraphSchema::Legacy(restored)) => {
            assert_eq!(restored, out.graph);
            assert_eq!(restore_current(&restored), graph);
        }
        other => panic!("expected legacy schema, got {other:?}"),
    }
}

#[test]
fn schema_union_converts_either_version() {
    let current = json!({"schemaVersion": "v3", "claims": [
        {"id": "a", "label": "A", "stance": "prescriptive", "supporters": ["s_4"]}
    ]});
    let out = detect_graph_schema(&current)
        .expect("schema")
        .into_legacy(&StatementIndex::new(), &turn());
    assert_eq!(out.graph.claims[0].supporters, vec![4]);

    let old = json!({"claims": [{"id": "a", "label": "A", "supporters": [0, 1], "type": "factual"}], "edges": []});
    let out = detect_graph_schema(&old)
        .expect("schema")
        .into_legacy(&StatementIndex::new(), &turn());
    assert_eq!(out.graph.claims[0].support_count, 0);
    assert_eq!(out.graph.claims[0].supporters, vec![0, 1]);
    assert!(out.graph.meta.is_none());
    assert!(restore_current(&out.graph).claims.is_empty());
}
