use crate::graph::adapter::{adapt_to_legacy, AdapterOutput, StatementIndex};
use crate::graph::legacy::{LegacyGraph, TurnMetadata};
use crate::graph::model::ClaimGraph;
use crate::graph::parser::graph_from_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const VERSION_KEYS: &[&str] = &["schemaVersion", "schema_version", "version"];

/// A claim graph in either schema, discriminated by `schemaVersion`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "schemaVersion")]
pub enum GraphSchema {
    #[serde(rename = "v3")]
    Current(ClaimGraph),
    #[serde(rename = "legacy")]
    Legacy(LegacyGraph),
}

impl GraphSchema {
    /// Legacy view of either variant. Current graphs go through the adapter;
    /// legacy graphs pass through with no warnings.
    pub fn into_legacy(self, index: &StatementIndex, turn: &TurnMetadata) -> AdapterOutput {
        tracing::debug!(version = self.version(), "converting graph to legacy schema");
        match self {
            GraphSchema::Current(graph) => adapt_to_legacy(&graph, index, turn),
            GraphSchema::Legacy(graph) => AdapterOutput {
                graph,
                warnings: Vec::new(),
            },
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            GraphSchema::Current(_) => "v3",
            GraphSchema::Legacy(_) => "legacy",
        }
    }
}

/// Classify a stored graph object.
///
/// An explicit version tag wins. Older recordings carry none, so the shape
/// decides: stance, gates or conflicts mean the current schema; top-level
/// edges, roles or numeric supporters mean legacy.
pub fn detect_graph_schema(value: &Value) -> Option<GraphSchema> {
    let claims = value.get("claims")?.as_array()?;

    let tag = VERSION_KEYS
        .iter()
        .find_map(|k| value.get(*k))
        .and_then(version_tag);
    match tag.as_deref() {
        Some("v3") | Some("3") | Some("current") => return current(value),
        Some("legacy") | Some("v2") | Some("2") | Some("v1") | Some("1") => return legacy(value),
        Some(other) => tracing::debug!(version = other, "unknown graph schema version, using shape"),
        None => {}
    }

    if claims.iter().any(looks_current) {
        return current(value);
    }
    if value.get("edges").is_some() || claims.iter().any(looks_legacy) {
        return legacy(value);
    }
    // Claims with neither marker read the same in both schemas; prefer the
    // current one so nothing gets discarded.
    current(value)
}

fn version_tag(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_ascii_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn looks_current(claim: &Value) -> bool {
    ["stance", "gates", "conflicts", "enables"]
        .iter()
        .any(|k| claim.get(*k).is_some())
}

fn looks_legacy(claim: &Value) -> bool {
    claim.get("role").is_some()
        || claim.get("supportCount").is_some()
        || claim
            .get("supporters")
            .and_then(Value::as_array)
            .is_some_and(|s| !s.is_empty() && s.iter().all(Value::is_u64))
}

fn current(value: &Value) -> Option<GraphSchema> {
    graph_from_value(value).map(GraphSchema::Current)
}

fn legacy(value: &Value) -> Option<GraphSchema> {
    match serde_json::from_value::<LegacyGraph>(value.clone()) {
        Ok(graph) => Some(GraphSchema::Legacy(graph)),
        Err(err) => {
            tracing::debug!(error = %err, "legacy graph did not deserialize");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::Stance;
    use serde_json::json;

    #[test]
    fn test_explicit_tag() {
        let v = json!({"schemaVersion": "legacy", "claims": [{"id": "c1", "stance": "prescriptive"}]});
        assert!(matches!(detect_graph_schema(&v), Some(GraphSchema::Legacy(_))));
    }

    #[test]
    fn test_fingerprint_current() {
        let v = json!({"claims": [{"id": "c1", "label": "A", "stance": "cautionary"}]});
        match detect_graph_schema(&v) {
            Some(GraphSchema::Current(g)) => assert_eq!(g.claims[0].stance, Stance::Cautionary),
            other => panic!("expected current graph, got {other:?}"),
        }
    }

    #[test]
    fn test_fingerprint_legacy() {
        let v = json!({"claims": [{"id": "c1", "label": "A", "supporters": [0, 2]}]});
        match detect_graph_schema(&v) {
            Some(GraphSchema::Legacy(g)) => assert_eq!(g.claims[0].supporters, vec![0, 2]),
            other => panic!("expected legacy graph, got {other:?}"),
        }
    }

    #[test]
    fn test_not_a_graph() {
        assert_eq!(detect_graph_schema(&json!({"nodes": [1, 2]})), None);
        assert_eq!(detect_graph_schema(&json!([1, 2])), None);
    }

    #[test]
    fn test_tagged_serialization() {
        let schema = GraphSchema::Current(ClaimGraph::default());
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"schemaVersion": "v3", "claims": []})
        );
    }

    #[test]
    fn test_legacy_passes_through() {
        let out = GraphSchema::Legacy(LegacyGraph::default())
            .into_legacy(&StatementIndex::new(), &TurnMetadata::default());
        assert_eq!(out, AdapterOutput::default());
    }
}
