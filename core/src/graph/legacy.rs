use crate::graph::model::{Claim, Conflict, PrerequisiteGate, Stance};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimRole {
    Challenger,
    Anchor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LegacyClaimType {
    Prescriptive,
    Conditional,
    Contested,
    Speculative,
    #[default]
    #[serde(other)]
    Factual,
}

impl From<Stance> for LegacyClaimType {
    fn from(stance: Stance) -> Self {
        match stance {
            Stance::Prescriptive => LegacyClaimType::Prescriptive,
            Stance::Cautionary => LegacyClaimType::Contested,
            Stance::Prerequisite | Stance::Dependent => LegacyClaimType::Conditional,
            Stance::Uncertain => LegacyClaimType::Speculative,
            Stance::Assertive | Stance::Unspecified => LegacyClaimType::Factual,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyClaim {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub claim_type: LegacyClaimType,
    /// Model indices, ascending and unique.
    #[serde(default)]
    pub supporters: Vec<usize>,
    #[serde(default)]
    pub support_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ClaimRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenges: Option<String>,
    /// The current-schema claim this was derived from. Absent on graphs
    /// recorded before the current schema existed.
    #[serde(rename = "_v3", default, skip_serializing_if = "Option::is_none")]
    pub v3: Option<Claim>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Supports,
    Conflicts,
    Tradeoff,
    Prerequisite,
}

/// The current-schema entry an edge was derived from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum EdgeOrigin {
    #[serde(rename_all = "camelCase")]
    Enables {
        claim_id: String,
        target: String,
        source_statement_ids: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Conflict { claim_id: String, conflict: Conflict },
    #[serde(rename_all = "camelCase")]
    Prerequisite {
        claim_id: String,
        gate: PrerequisiteGate,
    },
}

impl EdgeOrigin {
    pub fn source_statement_ids(&self) -> &[String] {
        match self {
            EdgeOrigin::Enables {
                source_statement_ids,
                ..
            } => source_statement_ids,
            EdgeOrigin::Conflict { conflict, .. } => &conflict.source_statement_ids,
            EdgeOrigin::Prerequisite { gate, .. } => &gate.source_statement_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(rename = "_v3", default, skip_serializing_if = "Option::is_none")]
    pub v3: Option<EdgeOrigin>,
}

/// Turn-level context supplied by the orchestration layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TurnMetadata {
    pub query: String,
    pub turn: u32,
    pub model_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphMeta {
    pub query: String,
    pub turn: u32,
    pub model_count: usize,
    pub derived_from: String,
}

/// Claim graph in the legacy (claim / edge / supporter) schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGraph {
    #[serde(default)]
    pub claims: Vec<LegacyClaim>,
    #[serde(default)]
    pub edges: Vec<LegacyEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<GraphMeta>,
}

impl LegacyGraph {
    pub fn edges_of_type(&self, edge_type: EdgeType) -> impl Iterator<Item = &LegacyEdge> {
        self.edges.iter().filter(move |e| e.edge_type == edge_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claim_type_wire_names() {
        let claim: LegacyClaim =
            serde_json::from_value(json!({"id": "c1", "type": "speculative"})).unwrap();
        assert_eq!(claim.claim_type, LegacyClaimType::Speculative);
        assert_eq!(
            serde_json::to_value(LegacyClaimType::Contested).unwrap(),
            json!("contested")
        );
    }

    #[test]
    fn test_unknown_claim_type_reads_as_factual() {
        let claim: LegacyClaim =
            serde_json::from_value(json!({"id": "c1", "type": "anecdotal"})).unwrap();
        assert_eq!(claim.claim_type, LegacyClaimType::Factual);
        let claim: LegacyClaim = serde_json::from_value(json!({"id": "c2"})).unwrap();
        assert_eq!(claim.claim_type, LegacyClaimType::Factual);
    }
}
