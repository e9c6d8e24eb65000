use crate::graph::legacy::{
    ClaimRole, EdgeOrigin, EdgeType, GraphMeta, LegacyClaim, LegacyClaimType, LegacyEdge,
    LegacyGraph, TurnMetadata,
};
use crate::graph::model::{Claim, ClaimGraph, ConflictNature, Stance};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

pub const DERIVED_FROM_CURRENT: &str = "v3";

/// Maps statement reference ids to the index of the model that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementIndex(HashMap<String, usize>);

impl StatementIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, statement_id: impl Into<String>, model_index: usize) {
        self.0.insert(statement_id.into(), model_index);
    }

    pub fn model_index(&self, statement_id: &str) -> Option<usize> {
        self.0.get(statement_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for StatementIndex {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        StatementIndex(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Non-fatal diagnostic raised while deriving the legacy graph.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivationWarning {
    #[error("claim at position {index} has no id and was skipped")]
    MissingClaimId { index: usize },
    #[error("claim {claim_id}: supporter {reference} resolves to no model index")]
    UnresolvedSupporter { claim_id: String, reference: String },
    #[error("claim {claim_id}: {relation} target {target} is not in the graph")]
    DanglingReference {
        claim_id: String,
        target: String,
        relation: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOutput {
    pub graph: LegacyGraph,
    pub warnings: Vec<DerivationWarning>,
}

/// Translate a current-schema graph into the legacy schema.
///
/// Every legacy claim and edge carries the entry it was derived from in its
/// `_v3` side-channel. A claim that cannot be derived is skipped and reported;
/// the rest of the batch still converts.
pub fn adapt_to_legacy(
    graph: &ClaimGraph,
    index: &StatementIndex,
    turn: &TurnMetadata,
) -> AdapterOutput {
    let known: HashMap<&str, &Claim> = graph
        .claims
        .iter()
        .filter(|c| !c.id.is_empty())
        .map(|c| (c.id.as_str(), c))
        .collect();

    let mut warnings = Vec::new();
    let mut claims = Vec::with_capacity(graph.claims.len());
    let mut edges = Vec::new();

    for (position, claim) in graph.claims.iter().enumerate() {
        match derive_claim(position, claim, index, &mut warnings) {
            Ok(legacy) => {
                edges.extend(derive_edges(claim, &known, &mut warnings));
                claims.push(legacy);
            }
            Err(warning) => {
                tracing::warn!(position, error = %warning, "claim skipped during legacy derivation");
                warnings.push(warning);
            }
        }
    }

    tracing::debug!(
        claims = claims.len(),
        edges = edges.len(),
        warnings = warnings.len(),
        "derived legacy graph"
    );

    AdapterOutput {
        graph: LegacyGraph {
            claims,
            edges,
            meta: Some(GraphMeta {
                query: turn.query.clone(),
                turn: turn.turn,
                model_count: turn.model_count,
                derived_from: DERIVED_FROM_CURRENT.to_string(),
            }),
        },
        warnings,
    }
}

fn derive_claim(
    position: usize,
    claim: &Claim,
    index: &StatementIndex,
    warnings: &mut Vec<DerivationWarning>,
) -> Result<LegacyClaim, DerivationWarning> {
    if claim.id.trim().is_empty() {
        return Err(DerivationWarning::MissingClaimId { index: position });
    }

    let mut supporters = BTreeSet::new();
    for reference in &claim.supporters {
        match resolve_supporter(reference, index) {
            Some(model) => {
                supporters.insert(model);
            }
            None => {
                let warning = DerivationWarning::UnresolvedSupporter {
                    claim_id: claim.id.clone(),
                    reference: reference.clone(),
                };
                tracing::warn!(error = %warning, "supporter dropped");
                warnings.push(warning);
            }
        }
    }
    let supporters: Vec<usize> = supporters.into_iter().collect();

    let (role, challenges) = derive_role(claim);

    Ok(LegacyClaim {
        id: claim.id.clone(),
        label: claim.label.clone(),
        text: claim.description.clone(),
        claim_type: LegacyClaimType::from(claim.stance),
        support_count: supporters.len(),
        supporters,
        role,
        challenges,
        v3: Some(claim.clone()),
    })
}

/// Index lookup first, then the trailing integer of the reference (`s_3` -> 3).
fn resolve_supporter(reference: &str, index: &StatementIndex) -> Option<usize> {
    if let Some(model) = index.model_index(reference) {
        return Some(model);
    }
    let digits_start = reference
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    reference[digits_start..].parse().ok()
}

fn derive_role(claim: &Claim) -> (Option<ClaimRole>, Option<String>) {
    let Some(first) = claim.conflicts.first() else {
        return (None, None);
    };
    if claim.stance == Stance::Cautionary {
        (Some(ClaimRole::Challenger), Some(first.claim_id.clone()))
    } else {
        (Some(ClaimRole::Anchor), None)
    }
}

fn derive_edges(
    claim: &Claim,
    known: &HashMap<&str, &Claim>,
    warnings: &mut Vec<DerivationWarning>,
) -> Vec<LegacyEdge> {
    let mut edges = Vec::new();
    let mut check = |target: &str, relation: &str| {
        if !known.contains_key(target) {
            let warning = DerivationWarning::DanglingReference {
                claim_id: claim.id.clone(),
                target: target.to_string(),
                relation: relation.to_string(),
            };
            tracing::warn!(error = %warning, "edge points outside the graph");
            warnings.push(warning);
        }
    };

    for target in &claim.enables {
        check(target, "enables");
        edges.push(LegacyEdge {
            from: claim.id.clone(),
            to: target.clone(),
            edge_type: EdgeType::Supports,
            question: None,
            v3: Some(EdgeOrigin::Enables {
                claim_id: claim.id.clone(),
                target: target.clone(),
                source_statement_ids: claim.supporters.clone(),
            }),
        });
    }

    for conflict in &claim.conflicts {
        check(&conflict.claim_id, "conflict");
        let both_prescriptive = claim.stance == Stance::Prescriptive
            && known
                .get(conflict.claim_id.as_str())
                .is_some_and(|other| other.stance == Stance::Prescriptive);
        let edge_type = if conflict.nature == ConflictNature::Optimization || both_prescriptive {
            EdgeType::Tradeoff
        } else {
            EdgeType::Conflicts
        };
        edges.push(LegacyEdge {
            from: claim.id.clone(),
            to: conflict.claim_id.clone(),
            edge_type,
            question: conflict.question.clone(),
            v3: Some(EdgeOrigin::Conflict {
                claim_id: claim.id.clone(),
                conflict: conflict.clone(),
            }),
        });
    }

    for gate in &claim.gates.prerequisites {
        check(&gate.claim_id, "prerequisite");
        edges.push(LegacyEdge {
            from: gate.claim_id.clone(),
            to: claim.id.clone(),
            edge_type: EdgeType::Prerequisite,
            question: gate.question.clone(),
            v3: Some(EdgeOrigin::Prerequisite {
                claim_id: claim.id.clone(),
                gate: gate.clone(),
            }),
        });
    }

    edges
}

/// Rebuild the current-schema graph from the `_v3` side-channels.
///
/// Claims without a side-channel (graphs recorded before derivation existed)
/// are left out.
pub fn restore_current(graph: &LegacyGraph) -> ClaimGraph {
    let mut seen = HashSet::new();
    let claims = graph
        .claims
        .iter()
        .filter_map(|c| c.v3.clone())
        .filter(|c| seen.insert(c.id.clone()))
        .collect();
    ClaimGraph { claims }
}
