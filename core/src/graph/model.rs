use serde::{Deserialize, Serialize};

/// Position a claim takes in the current graph schema.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Prescriptive,
    Cautionary,
    Prerequisite,
    Dependent,
    Assertive,
    Uncertain,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl Stance {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "prescriptive" | "recommendation" => Stance::Prescriptive,
            "cautionary" | "caution" | "warning" => Stance::Cautionary,
            "prerequisite" => Stance::Prerequisite,
            "dependent" | "conditional" => Stance::Dependent,
            "assertive" | "factual" | "assertion" => Stance::Assertive,
            "uncertain" | "speculative" => Stance::Uncertain,
            _ => Stance::Unspecified,
        }
    }
}

/// A claim that only holds once another claim holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteGate {
    pub claim_id: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub source_statement_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

/// A claim that only holds when a situational fact is true.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalGate {
    pub condition: String,
    #[serde(default)]
    pub source_statement_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Gates {
    #[serde(default)]
    pub prerequisites: Vec<PrerequisiteGate>,
    #[serde(default)]
    pub conditionals: Vec<ConditionalGate>,
}

impl Gates {
    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty() && self.conditionals.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictNature {
    /// Both sides are valid; choosing one trades off against the other.
    Optimization,
    /// The claims cannot both hold.
    Contradiction,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl ConflictNature {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimization" | "optimisation" | "tradeoff" | "trade-off" => {
                ConflictNature::Optimization
            }
            "contradiction" | "exclusive" | "mutually_exclusive" | "mutually exclusive" => {
                ConflictNature::Contradiction
            }
            _ => ConflictNature::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub claim_id: String,
    #[serde(default)]
    pub nature: ConflictNature,
    #[serde(default)]
    pub source_statement_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub stance: Stance,
    /// Statement ids that back the claim.
    #[serde(default)]
    pub supporters: Vec<String>,
    #[serde(default)]
    pub gates: Gates,
    /// Claim ids this claim makes possible.
    #[serde(default)]
    pub enables: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
}

/// Claim graph in the current (stance / gate / conflict) schema.
///
/// References between claims are not validated; a gate or conflict may name
/// an id that is not in `claims`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClaimGraph {
    pub claims: Vec<Claim>,
}

impl ClaimGraph {
    pub fn claim(&self, id: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.id == id)
    }
}
