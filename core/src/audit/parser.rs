use crate::audit::model::{
    AuditReport, Gap, GapCategory, HonestAssessment, MapperAudit, Reframe, ReportSource, Signal,
    SignalKind, SignalPriority, SynthesisAccuracy, UnlistedOption, VerificationTrigger,
};
use crate::parse::heuristics::{labeled_value, list_items, section_block, split_label, strip_emphasis};
use crate::parse::tolerant::{
    clamp_confidence, confidence_field, confidence_value, get_any, has_fingerprint, object_list,
    parse_structured, str_field, str_list,
};
use crate::text::normalize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Top-level keys that identify a JSON object as an audit report.
pub const AUDIT_FINGERPRINT: &[&str] = &[
    "confidence",
    "overallConfidence",
    "reliabilitySummary",
    "gaps",
    "signals",
    "synthesisAccuracy",
    "verificationTriggers",
    "reframe",
    "honestAssessment",
    "mapperAudit",
];

static CONFIDENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)confidence\b[^\n\d]{0,40}?(\d{1,3}(?:\.\d+)?)[ \t]*(%)?")
        .expect("confidence pattern")
});

static PRIORITY_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*[\[(]?\s*(blocker|critical|risk|enhancement)\b\s*[\])]?\s*[:\-\u{2014}]?\s*")
        .expect("priority tag pattern")
});

static SOURCE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*\((?:source(?: type)?|verify via)\s*:\s*([^)]+)\)\s*$")
        .expect("source suffix pattern")
});

/// Parse a reliability audit from a model response.
///
/// Tries a JSON object first; if none carries an audit fingerprint, every
/// field is recovered independently from its named prose section. Never
/// fails: text with no recognizable structure yields `AuditReport::default()`.
pub fn parse_audit_report(text: &str) -> AuditReport {
    let normalized = normalize(text);

    if let Some(structured) = parse_structured(&normalized) {
        if has_fingerprint(&structured.value, AUDIT_FINGERPRINT) {
            tracing::debug!(source = ?structured.source, "audit report parsed from JSON");
            return report_from_value(&structured.value);
        }
        tracing::debug!("JSON object lacks audit fingerprint, using section heuristics");
    }

    report_from_sections(&normalized)
}

/// Normalize a JSON audit object field by field.
pub fn report_from_value(value: &Value) -> AuditReport {
    AuditReport {
        confidence: clamp_confidence(confidence_field(
            value,
            &["confidence", "overallConfidence", "confidenceScore"],
        )),
        reliability: str_field(value, &["reliabilitySummary", "reliability"]),
        gaps: gaps_from_value(value),
        signals: signals_from_value(value),
        synthesis_accuracy: accuracy_from_value(value),
        verification_triggers: triggers_from_value(value),
        reframe: get_any(value, &["reframe", "reframing"]).and_then(reframe_from_value),
        honest_assessment: get_any(value, &["honestAssessment", "honest_assessment"])
            .and_then(assessment_from_value),
        mapper_audit: get_any(value, &["mapperAudit", "mapper_audit"]).map(mapper_audit_from_value),
        source: ReportSource::Structured,
    }
}

fn gaps_from_value(value: &Value) -> Vec<Gap> {
    let Some(raw) = get_any(value, &["gaps", "gapDetection"]) else {
        return Vec::new();
    };
    match raw {
        Value::Array(items) => items.iter().filter_map(gap_from_item).collect(),
        // Older outputs grouped gaps by category: {"foundational": [...], "tactical": [...]}
        Value::Object(groups) => groups
            .iter()
            .flat_map(|(key, items)| {
                let category = GapCategory::parse(key).unwrap_or_default();
                items
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(gap_from_item)
                    .map(move |mut gap| {
                        if gap.category == GapCategory::Uncategorized {
                            gap.category = category;
                        }
                        gap
                    })
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn gap_from_item(item: &Value) -> Option<Gap> {
    match item {
        Value::String(s) => gap_from_text(s),
        Value::Object(_) => {
            let title = str_field(item, &["title", "gap", "name", "description"])?;
            let explanation = str_field(item, &["explanation", "why", "detail"]).unwrap_or_default();
            let category = str_field(item, &["category", "type"])
                .and_then(|c| GapCategory::parse(&c))
                .unwrap_or_default();
            Some(Gap {
                category,
                title,
                explanation,
            })
        }
        _ => None,
    }
}

fn signals_from_value(value: &Value) -> Vec<Signal> {
    let Some(raw) = get_any(value, &["signals", "criticalSignals"]) else {
        return Vec::new();
    };
    match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| signal_from_object(item, None))
            .collect(),
        // {"divergences": [...], "overclaims": [...], ...}
        Value::Object(groups) => groups
            .iter()
            .flat_map(|(key, items)| {
                let kind = SignalKind::parse(key.trim_end_matches('s'));
                items
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(move |item| signal_from_object(item, kind))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn signal_from_object(item: &Value, kind_hint: Option<SignalKind>) -> Option<Signal> {
    if let Value::String(s) = item {
        let mut signal = signal_from_text(s)?;
        if let Some(kind) = kind_hint {
            signal.kind = kind;
        }
        return Some(signal);
    }
    let content = str_field(item, &["content", "text", "description", "signal"])?;
    let kind = str_field(item, &["type", "kind"])
        .and_then(|k| SignalKind::parse(&k))
        .or(kind_hint)
        .unwrap_or(SignalKind::Gap);
    let priority = str_field(item, &["priority", "severity"])
        .and_then(|p| SignalPriority::parse(&p))
        .unwrap_or_default();
    Some(Signal {
        kind,
        priority,
        content,
        source: str_field(item, &["source"]),
        impact: str_field(item, &["impact"]),
    })
}

fn accuracy_from_value(value: &Value) -> SynthesisAccuracy {
    let Some(raw) = get_any(value, &["synthesisAccuracy", "synthesis_accuracy"]) else {
        return SynthesisAccuracy::default();
    };
    match raw {
        Value::Object(_) => SynthesisAccuracy {
            preserved: str_list(raw, &["preserved"]),
            overclaimed: str_list(raw, &["overclaimed", "overclaims"]),
            missed: str_list(raw, &["missed", "missing"]),
        },
        // [{"status": "missed", "item": "..."}]
        Value::Array(items) => {
            let mut accuracy = SynthesisAccuracy::default();
            for item in items {
                let Some(text) = str_field(item, &["item", "text", "claim"]) else {
                    continue;
                };
                let status = str_field(item, &["status", "type"]).unwrap_or_default();
                if let Some(bucket) = accuracy_bucket(&mut accuracy, &status) {
                    bucket.push(text);
                }
            }
            accuracy
        }
        _ => SynthesisAccuracy::default(),
    }
}

fn accuracy_bucket<'a>(
    accuracy: &'a mut SynthesisAccuracy,
    status: &str,
) -> Option<&'a mut Vec<String>> {
    match status.trim().to_ascii_lowercase().as_str() {
        "preserved" => Some(&mut accuracy.preserved),
        "overclaimed" | "overclaim" => Some(&mut accuracy.overclaimed),
        "missed" | "missing" => Some(&mut accuracy.missed),
        _ => None,
    }
}

fn triggers_from_value(value: &Value) -> Vec<VerificationTrigger> {
    let Some(raw) = get_any(value, &["verificationTriggers", "verification_triggers"]) else {
        return Vec::new();
    };
    let items = match raw {
        Value::Object(_) => object_list(raw, &["items", "triggers"]),
        _ => object_list(value, &["verificationTriggers", "verification_triggers"]),
    };
    items
        .into_iter()
        .filter_map(|item| {
            Some(VerificationTrigger {
                claim: str_field(item, &["claim"])?,
                why: str_field(item, &["why", "reason"]).unwrap_or_default(),
                source_type: str_field(item, &["sourceType", "source_type", "source"]),
            })
        })
        .collect()
}

fn reframe_from_value(raw: &Value) -> Option<Reframe> {
    let reframe = Reframe {
        issue: str_field(raw, &["issue", "problem"]).unwrap_or_default(),
        better_question: str_field(raw, &["betterQuestion", "better_question", "suggestion"])
            .unwrap_or_default(),
        unlocks: str_field(raw, &["unlocks"]).unwrap_or_default(),
    };
    (!reframe.issue.is_empty() || !reframe.better_question.is_empty()).then_some(reframe)
}

fn assessment_from_value(raw: &Value) -> Option<HonestAssessment> {
    match raw {
        Value::String(s) if !s.trim().is_empty() => {
            Some(HonestAssessment::Freeform(s.trim().to_string()))
        }
        Value::Object(_) => {
            let reliability_summary = str_field(raw, &["reliabilitySummary", "reliability"]);
            let biggest_risk = str_field(raw, &["biggestRisk", "biggest_risk"]);
            let recommended_next_step =
                str_field(raw, &["recommendedNextStep", "recommended_next_step", "nextStep"]);
            if reliability_summary.is_none()
                && biggest_risk.is_none()
                && recommended_next_step.is_none()
            {
                return None;
            }
            Some(HonestAssessment::Structured {
                reliability_summary,
                biggest_risk,
                recommended_next_step,
            })
        }
        _ => None,
    }
}

fn mapper_audit_from_value(raw: &Value) -> MapperAudit {
    let unlisted_from = |items: Vec<&Value>| -> Vec<UnlistedOption> {
        items
            .into_iter()
            .filter_map(|item| {
                Some(UnlistedOption {
                    title: str_field(item, &["title", "option", "name"])?,
                    description: str_field(item, &["description", "detail"]).unwrap_or_default(),
                    source: str_field(item, &["source", "sourceModel"]),
                })
            })
            .collect()
    };
    match raw {
        // A bare list of missing options is the older shape.
        Value::Array(items) => {
            let unlisted_options = unlisted_from(items.iter().filter(|v| v.is_object()).collect());
            MapperAudit {
                complete: unlisted_options.is_empty(),
                unlisted_options,
            }
        }
        _ => {
            let unlisted_options =
                unlisted_from(object_list(raw, &["unlistedOptions", "unlisted_options", "missed"]));
            let complete = raw
                .get("complete")
                .and_then(Value::as_bool)
                .unwrap_or(unlisted_options.is_empty());
            MapperAudit {
                complete,
                unlisted_options,
            }
        }
    }
}

/// Assemble a report from prose sections; each field is independent.
pub fn report_from_sections(text: &str) -> AuditReport {
    AuditReport {
        confidence: confidence_from_text(text),
        reliability: section_block(text, &["Reliability Summary", "Overall Reliability", "Reliability"])
            .map(first_paragraph),
        gaps: section_block(text, &["Gap Detection", "Gaps"])
            .map(|block| list_items(block).iter().filter_map(|i| gap_from_text(i)).collect())
            .unwrap_or_default(),
        signals: section_block(text, &["Critical Signals", "Signals"])
            .map(|block| list_items(block).iter().filter_map(|i| signal_from_text(i)).collect())
            .unwrap_or_default(),
        synthesis_accuracy: section_block(text, &["Synthesis Accuracy"])
            .map(accuracy_from_text)
            .unwrap_or_default(),
        verification_triggers: section_block(text, &["Verification Triggers", "Verify Before Acting"])
            .map(|block| list_items(block).iter().filter_map(|i| trigger_from_text(i)).collect())
            .unwrap_or_default(),
        reframe: section_block(text, &["Reframe", "Reframing", "Reframing Suggestion"])
            .and_then(reframe_from_text),
        honest_assessment: section_block(text, &["Honest Assessment"]).map(assessment_from_text),
        mapper_audit: section_block(text, &["Mapper Audit", "Mapper Completeness", "Missed Options"])
            .map(mapper_audit_from_text),
        source: ReportSource::Heuristic,
    }
}

/// A figure that runs to the end of the text may still be growing (`7` of
/// `72%`), so it is not read until something follows it.
fn confidence_from_text(text: &str) -> f64 {
    let Some(caps) = CONFIDENCE_RE.captures(text) else {
        return clamp_confidence(None);
    };
    let (Some(number), Some(whole)) = (caps.get(1), caps.get(0)) else {
        return clamp_confidence(None);
    };
    let rest = text[number.end()..].trim_start_matches([' ', '\t']);
    if caps.get(2).is_none() && matches!(rest, "" | ".") {
        tracing::trace!(figure = number.as_str(), "confidence figure may still be streaming");
        return clamp_confidence(None);
    }
    clamp_confidence(confidence_value(&text[number.start()..whole.end()]))
}

fn first_paragraph(block: &str) -> String {
    block
        .split("\n\n")
        .next()
        .unwrap_or(block)
        .trim()
        .to_string()
}

fn gap_from_text(item: &str) -> Option<Gap> {
    let (label, rest) = split_label(item);
    let (category, title, explanation) = match label {
        Some(label) => match GapCategory::parse(&label) {
            Some(category) => {
                let (title, explanation) = split_dash(&rest);
                (category, title, explanation)
            }
            None => (GapCategory::Uncategorized, label, rest),
        },
        None => {
            let (title, explanation) = split_dash(&rest);
            (GapCategory::Uncategorized, title, explanation)
        }
    };
    let title = strip_emphasis(&title).to_string();
    (!title.is_empty()).then_some(Gap {
        category,
        title,
        explanation,
    })
}

/// Split `title — explanation` (em dash, en dash or spaced hyphen).
fn split_dash(s: &str) -> (String, String) {
    for sep in [" \u{2014} ", " \u{2013} ", " - "] {
        if let Some((a, b)) = s.split_once(sep) {
            return (a.trim().to_string(), b.trim().to_string());
        }
    }
    (s.trim().to_string(), String::new())
}

fn signal_from_text(item: &str) -> Option<Signal> {
    let (priority, rest) = match PRIORITY_TAG_RE.captures(item) {
        Some(caps) => (
            caps.get(1).and_then(|m| SignalPriority::parse(m.as_str())),
            &item[caps.get(0).map_or(0, |m| m.end())..],
        ),
        None => (priority_from_marker(item), item),
    };
    let rest = rest.trim_start_matches(|c: char| !c.is_alphanumeric() && c != '*');
    let (label, content) = split_label(rest);
    let (kind, content) = match label {
        Some(label) => match SignalKind::parse(&label) {
            Some(kind) => (kind, content),
            None => (SignalKind::Gap, format!("{label}: {content}")),
        },
        None => (SignalKind::Gap, content),
    };
    let content = content.trim().to_string();
    (!content.is_empty()).then_some(Signal {
        kind,
        priority: priority.unwrap_or_default(),
        content,
        source: None,
        impact: None,
    })
}

fn priority_from_marker(item: &str) -> Option<SignalPriority> {
    let first = item.trim_start().chars().next()?;
    match first {
        '\u{1F534}' | '\u{26D4}' => Some(SignalPriority::Blocker),
        '\u{1F7E1}' | '\u{26A0}' => Some(SignalPriority::Risk),
        '\u{1F7E2}' | '\u{1F4A1}' => Some(SignalPriority::Enhancement),
        _ => None,
    }
}

fn accuracy_from_text(block: &str) -> SynthesisAccuracy {
    let mut accuracy = SynthesisAccuracy::default();
    for item in list_items(block) {
        let (status, text) = match item.trim_start().chars().next() {
            Some('\u{2705}') => ("preserved".to_string(), strip_marker(&item)),
            Some('\u{26A0}') => ("overclaimed".to_string(), strip_marker(&item)),
            Some('\u{274C}') => ("missed".to_string(), strip_marker(&item)),
            _ => match split_label(&item) {
                (Some(label), rest) => (label, rest),
                (None, _) => continue,
            },
        };
        if text.is_empty() {
            continue;
        }
        if let Some(bucket) = accuracy_bucket(&mut accuracy, &status) {
            bucket.push(text);
        }
    }
    accuracy
}

fn strip_marker(item: &str) -> String {
    item.trim_start_matches(|c: char| !c.is_alphanumeric() && c != '*')
        .trim()
        .to_string()
}

fn trigger_from_text(item: &str) -> Option<VerificationTrigger> {
    // "Claim: X | Why: Y | Source: Z"
    if item.contains('|') {
        let mut trigger = VerificationTrigger {
            claim: String::new(),
            why: String::new(),
            source_type: None,
        };
        for part in item.split('|') {
            let (label, value) = split_label(part);
            match label.map(|l| l.to_ascii_lowercase()).as_deref() {
                Some("claim") => trigger.claim = value,
                Some("why") | Some("reason") => trigger.why = value,
                Some("source") | Some("source type") | Some("verify via") => {
                    trigger.source_type = Some(value)
                }
                _ if trigger.claim.is_empty() => trigger.claim = part.trim().to_string(),
                _ => {}
            }
        }
        return (!trigger.claim.is_empty()).then_some(trigger);
    }

    // "X — Y (source: Z)"
    let (body, source_type) = match SOURCE_SUFFIX_RE.captures(item) {
        Some(caps) => (
            &item[..caps.get(0).map_or(item.len(), |m| m.start())],
            caps.get(1).map(|m| m.as_str().trim().to_string()),
        ),
        None => (item, None),
    };
    let (claim, why) = split_dash(body);
    let claim = strip_emphasis(&claim).to_string();
    (!claim.is_empty()).then_some(VerificationTrigger {
        claim,
        why,
        source_type,
    })
}

fn reframe_from_text(block: &str) -> Option<Reframe> {
    let reframe = Reframe {
        issue: labeled_value(block, &["Issue", "Problem"]).unwrap_or_default(),
        better_question: labeled_value(block, &["Better question", "Suggested question", "Ask instead"])
            .unwrap_or_default(),
        unlocks: labeled_value(block, &["Unlocks", "This unlocks"]).unwrap_or_default(),
    };
    (!reframe.issue.is_empty() || !reframe.better_question.is_empty()).then_some(reframe)
}

fn assessment_from_text(block: &str) -> HonestAssessment {
    let reliability_summary = labeled_value(block, &["Reliability summary", "Reliability"]);
    let biggest_risk = labeled_value(block, &["Biggest risk"]);
    let recommended_next_step = labeled_value(block, &["Recommended next step", "Next step"]);
    if reliability_summary.is_none() && biggest_risk.is_none() && recommended_next_step.is_none() {
        return HonestAssessment::Freeform(block.trim().to_string());
    }
    HonestAssessment::Structured {
        reliability_summary,
        biggest_risk,
        recommended_next_step,
    }
}

fn mapper_audit_from_text(block: &str) -> MapperAudit {
    let unlisted_options: Vec<UnlistedOption> = list_items(block)
        .iter()
        .filter_map(|item| {
            let (label, rest) = split_label(item);
            let (title, description) = match label {
                Some(label) => (label, rest),
                None => split_dash(&rest),
            };
            let title = strip_emphasis(&title).to_string();
            (!title.is_empty()).then_some(UnlistedOption {
                title,
                description,
                source: None,
            })
        })
        .collect();
    MapperAudit {
        complete: unlisted_options.is_empty(),
        unlisted_options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_from_text() {
        assert_eq!(confidence_from_text("Overall confidence: 0.8\n"), 0.8);
        assert_eq!(confidence_from_text("**Confidence:** 65%"), 0.65);
        assert_eq!(confidence_from_text("Confidence: 72 overall"), 0.72);
        assert_eq!(confidence_from_text("Confidence: 1.5 (capped)"), 1.0);
        assert_eq!(confidence_from_text("Confidence: 150% sure"), 1.0);
        assert_eq!(confidence_from_text("no number here"), 0.5);
    }

    #[test]
    fn test_trailing_confidence_figure_is_not_read_yet() {
        assert_eq!(confidence_from_text("Confidence: 7"), 0.5);
        assert_eq!(confidence_from_text("Confidence: 72 "), 0.5);
        assert_eq!(confidence_from_text("Confidence: 0."), 0.5);
        assert_eq!(confidence_from_text("Confidence: 72%"), 0.72);
    }

    #[test]
    fn test_gap_from_text() {
        let gap = gap_from_text("**Foundational**: cost data \u{2014} no model priced it").unwrap();
        assert_eq!(gap.category, GapCategory::Foundational);
        assert_eq!(gap.title, "cost data");
        assert_eq!(gap.explanation, "no model priced it");

        let gap = gap_from_text("Timeline: nobody gave dates").unwrap();
        assert_eq!(gap.category, GapCategory::Uncategorized);
        assert_eq!(gap.title, "Timeline");
    }

    #[test]
    fn test_signal_from_text() {
        let s = signal_from_text("[BLOCKER] Divergence: models disagree on scope").unwrap();
        assert_eq!(s.priority, SignalPriority::Blocker);
        assert_eq!(s.kind, SignalKind::Divergence);
        assert_eq!(s.content, "models disagree on scope");

        let s = signal_from_text("\u{1F7E2} **Blind spot**: accessibility").unwrap();
        assert_eq!(s.priority, SignalPriority::Enhancement);
        assert_eq!(s.kind, SignalKind::BlindSpot);
    }

    #[test]
    fn test_trigger_from_text() {
        let t = trigger_from_text("Claim: X is fastest | Why: single benchmark | Source: benchmark").unwrap();
        assert_eq!(t.claim, "X is fastest");
        assert_eq!(t.why, "single benchmark");
        assert_eq!(t.source_type.as_deref(), Some("benchmark"));

        let t = trigger_from_text("**Vendor uptime** \u{2014} only self-reported (source: status page)").unwrap();
        assert_eq!(t.claim, "Vendor uptime");
        assert_eq!(t.why, "only self-reported");
        assert_eq!(t.source_type.as_deref(), Some("status page"));
    }

    #[test]
    fn test_grouped_gaps_collapse_into_list() {
        let v = serde_json::json!({"gaps": {"foundational": ["pricing"], "tactical": [{"title": "rollout"}]}});
        let gaps = gaps_from_value(&v);
        assert_eq!(gaps.len(), 2);
        assert!(gaps.iter().any(|g| g.title == "pricing" && g.category == GapCategory::Foundational));
        assert!(gaps.iter().any(|g| g.title == "rollout" && g.category == GapCategory::Tactical));
    }
}
