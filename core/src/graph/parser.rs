use crate::graph::model::{
    Claim, ClaimGraph, ConditionalGate, Conflict, ConflictNature, Gates, PrerequisiteGate, Stance,
};
use crate::parse::balanced::scan_object;
use crate::parse::tolerant::{get_any, has_fingerprint, parse_structured, str_field, str_list};
use crate::section::topology_locator;
use crate::text::normalize;
use serde_json::Value;

/// Top-level keys that identify a JSON object as a claim graph.
pub const GRAPH_FINGERPRINT: &[&str] = &["claims", "positions"];

const STATEMENT_KEYS: &[&str] = &["sourceStatementIds", "source_statement_ids", "statementIds", "provenance"];

/// Recover a current-schema claim graph from a model response.
///
/// A response that is itself the graph (optionally fenced or string-encoded)
/// is parsed directly; otherwise the object after the topology header is
/// scanned out of the narrative. Returns `None` while the object is absent
/// or still streaming.
pub fn parse_claim_graph(text: &str) -> Option<ClaimGraph> {
    let normalized = normalize(text);

    if let Some(structured) = parse_structured(&normalized) {
        if let Some(graph) = graph_from_value(&structured.value) {
            tracing::debug!(source = ?structured.source, claims = graph.claims.len(), "claim graph parsed from JSON");
            return Some(graph);
        }
    }

    let span = topology_locator().locate(&normalized)?;
    let scanned = scan_object(&normalized, span.header_end())?;
    let graph = graph_from_value(&scanned.value)?;
    tracing::debug!(claims = graph.claims.len(), "claim graph scanned from topology section");
    Some(graph)
}

/// Normalize a JSON object into a [`ClaimGraph`] if it fingerprints as one.
pub fn graph_from_value(value: &Value) -> Option<ClaimGraph> {
    if !has_fingerprint(value, GRAPH_FINGERPRINT) {
        return None;
    }
    let claims = match get_any(value, GRAPH_FINGERPRINT) {
        Some(Value::Array(items)) => items.iter().filter_map(claim_from_value).collect(),
        _ => return None,
    };
    Some(ClaimGraph { claims })
}

fn claim_from_value(item: &Value) -> Option<Claim> {
    if !item.is_object() {
        return None;
    }
    Some(Claim {
        id: str_field(item, &["id", "claimId"]).unwrap_or_default(),
        label: str_field(item, &["label", "title", "name"]).unwrap_or_default(),
        description: str_field(item, &["description", "text", "summary"]).unwrap_or_default(),
        stance: str_field(item, &["stance"])
            .map(|s| Stance::parse(&s))
            .unwrap_or_default(),
        supporters: str_list(item, &["supporters", "sourceStatementIds", "statementIds"]),
        gates: get_any(item, &["gates"]).map(gates_from_value).unwrap_or_default(),
        enables: str_list(item, &["enables"]),
        conflicts: match get_any(item, &["conflicts"]) {
            Some(Value::Array(entries)) => entries.iter().filter_map(conflict_from_value).collect(),
            _ => Vec::new(),
        },
    })
}

/// Gates arrive either map-shaped (`{"prerequisites": [...], "conditionals": [...]}`)
/// or, from older prompts, as one array of `{"type": ..., ...}` entries.
fn gates_from_value(raw: &Value) -> Gates {
    let mut gates = Gates::default();
    match raw {
        Value::Object(_) => {
            if let Some(Value::Array(items)) = get_any(raw, &["prerequisites", "prerequisite"]) {
                gates.prerequisites = items.iter().filter_map(prerequisite_from_value).collect();
            }
            if let Some(Value::Array(items)) = get_any(raw, &["conditionals", "conditional"]) {
                gates.conditionals = items.iter().filter_map(conditional_from_value).collect();
            }
        }
        Value::Array(items) => {
            for item in items {
                let kind = str_field(item, &["type", "kind"])
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                if kind.starts_with("conditional") {
                    gates.conditionals.extend(conditional_from_value(item));
                } else {
                    gates.prerequisites.extend(prerequisite_from_value(item));
                }
            }
        }
        _ => {}
    }
    gates
}

fn prerequisite_from_value(item: &Value) -> Option<PrerequisiteGate> {
    if let Value::String(id) = item {
        let id = id.trim();
        return (!id.is_empty()).then(|| PrerequisiteGate {
            claim_id: id.to_string(),
            condition: String::new(),
            source_statement_ids: Vec::new(),
            question: None,
        });
    }
    Some(PrerequisiteGate {
        claim_id: str_field(item, &["claimId", "requires", "id", "target"])?,
        condition: str_field(item, &["condition", "description"]).unwrap_or_default(),
        source_statement_ids: str_list(item, STATEMENT_KEYS),
        question: str_field(item, &["question"]),
    })
}

fn conditional_from_value(item: &Value) -> Option<ConditionalGate> {
    if let Value::String(condition) = item {
        let condition = condition.trim();
        return (!condition.is_empty()).then(|| ConditionalGate {
            condition: condition.to_string(),
            source_statement_ids: Vec::new(),
            question: None,
        });
    }
    Some(ConditionalGate {
        condition: str_field(item, &["condition", "description", "text"])?,
        source_statement_ids: str_list(item, STATEMENT_KEYS),
        question: str_field(item, &["question"]),
    })
}

fn conflict_from_value(item: &Value) -> Option<Conflict> {
    if let Value::String(id) = item {
        let id = id.trim();
        return (!id.is_empty()).then(|| Conflict {
            claim_id: id.to_string(),
            nature: ConflictNature::Unspecified,
            source_statement_ids: Vec::new(),
            question: None,
        });
    }
    Some(Conflict {
        claim_id: str_field(item, &["claimId", "with", "target", "id"])?,
        nature: str_field(item, &["nature", "type", "kind"])
            .map(|n| ConflictNature::parse(&n))
            .unwrap_or_default(),
        source_statement_ids: str_list(item, STATEMENT_KEYS),
        question: str_field(item, &["question"]),
    })
}
