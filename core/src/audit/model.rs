use serde::{Deserialize, Serialize};

pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GapCategory {
    Foundational,
    Tactical,
    #[default]
    #[serde(other)]
    Uncategorized,
}

impl GapCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "foundational" | "foundation" => Some(GapCategory::Foundational),
            "tactical" => Some(GapCategory::Tactical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub category: GapCategory,
    pub title: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Divergence,
    Overclaim,
    Gap,
    BlindSpot,
}

impl SignalKind {
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "divergence" | "disagreement" => Some(SignalKind::Divergence),
            "overclaim" | "overclaimed" => Some(SignalKind::Overclaim),
            "gap" | "missing" => Some(SignalKind::Gap),
            "blindspot" => Some(SignalKind::BlindSpot),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignalPriority {
    Blocker,
    #[default]
    Risk,
    Enhancement,
}

impl SignalPriority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocker" | "critical" | "high" => Some(SignalPriority::Blocker),
            "risk" | "medium" | "warning" => Some(SignalPriority::Risk),
            "enhancement" | "low" | "nice-to-have" => Some(SignalPriority::Enhancement),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub kind: SignalKind,
    pub priority: SignalPriority,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

/// How faithfully the upstream synthesis carried the source answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisAccuracy {
    #[serde(default)]
    pub preserved: Vec<String>,
    #[serde(default)]
    pub overclaimed: Vec<String>,
    #[serde(default)]
    pub missed: Vec<String>,
}

impl SynthesisAccuracy {
    pub fn is_empty(&self) -> bool {
        self.preserved.is_empty() && self.overclaimed.is_empty() && self.missed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationTrigger {
    pub claim: String,
    #[serde(default)]
    pub why: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reframe {
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub better_question: String,
    #[serde(default)]
    pub unlocks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum HonestAssessment {
    #[serde(rename_all = "camelCase")]
    Structured {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reliability_summary: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        biggest_risk: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        recommended_next_step: Option<String>,
    },
    Freeform(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnlistedOption {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Options the mapping step should have surfaced but did not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MapperAudit {
    pub complete: bool,
    #[serde(default)]
    pub unlisted_options: Vec<UnlistedOption>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Normalized from a JSON object in the response.
    Structured,
    /// Assembled from section headers in prose.
    #[default]
    Heuristic,
}

/// Reliability audit of a synthesized answer. Every field is optional;
/// consumers render whatever is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<String>,
    #[serde(default)]
    pub gaps: Vec<Gap>,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub synthesis_accuracy: SynthesisAccuracy,
    #[serde(default)]
    pub verification_triggers: Vec<VerificationTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reframe: Option<Reframe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honest_assessment: Option<HonestAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapper_audit: Option<MapperAudit>,
    #[serde(default)]
    pub source: ReportSource,
}

impl Default for AuditReport {
    fn default() -> Self {
        AuditReport {
            confidence: NEUTRAL_CONFIDENCE,
            reliability: None,
            gaps: Vec::new(),
            signals: Vec::new(),
            synthesis_accuracy: SynthesisAccuracy::default(),
            verification_triggers: Vec::new(),
            reframe: None,
            honest_assessment: None,
            mapper_audit: None,
            source: ReportSource::default(),
        }
    }
}

impl AuditReport {
    /// Signals at blocker priority, in report order.
    pub fn blockers(&self) -> impl Iterator<Item = &Signal> {
        self.signals
            .iter()
            .filter(|s| s.priority == SignalPriority::Blocker)
    }

    /// True when nothing beyond the neutral defaults was recovered.
    pub fn is_empty(&self) -> bool {
        self.reliability.is_none()
            && self.gaps.is_empty()
            && self.signals.is_empty()
            && self.synthesis_accuracy.is_empty()
            && self.verification_triggers.is_empty()
            && self.reframe.is_none()
            && self.honest_assessment.is_none()
            && self.mapper_audit.is_none()
    }
}
