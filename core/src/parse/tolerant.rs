//! Structured-first helpers shared by every typed report parser.
//!
//! The typed parsers call [`parse_structured`] and, when it yields an object
//! carrying one of their fingerprint fields, normalize it field by field.
//! Otherwise they fall back to the section heuristics in
//! [`crate::parse::heuristics`].

use crate::parse::balanced::parse_with_repair;
use serde_json::Value;
use std::borrow::Cow;

/// Which structured strategy produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredSource {
    /// The whole text (after unwrapping) was the object.
    WholeText,
    /// The object was decoded from a JSON string literal.
    DoubleEncoded,
    /// The span from the first `{` to the last `}`.
    OuterBraces,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructuredValue {
    pub value: Value,
    pub source: StructuredSource,
}

/// Strip one enclosing markdown code fence (```` ``` ```` or ```` ```json ````).
///
/// An opening fence without a closing one (still streaming) is stripped too.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(nl) if rest[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => &rest[nl + 1..],
        Some(_) => rest,
        None => return trimmed,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Decode one level of string encoding when the model returned the object as
/// a JSON string literal (`"{\"a\": 1}"`).
pub fn decode_double_encoded(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if !(trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"')) {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(inner)) => Some(inner),
        _ => None,
    }
}

/// Run the structured strategies in order and return the first object.
pub fn parse_structured(text: &str) -> Option<StructuredValue> {
    let unfenced = strip_code_fence(text);

    let (body, decoded): (Cow<'_, str>, bool) = match decode_double_encoded(unfenced) {
        Some(inner) => (Cow::Owned(inner), true),
        None => (Cow::Borrowed(unfenced), false),
    };
    let body = strip_code_fence(&body);

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(body) {
        let source = if decoded {
            StructuredSource::DoubleEncoded
        } else {
            StructuredSource::WholeText
        };
        return Some(StructuredValue { value, source });
    }

    let first = body.find('{')?;
    let last = body.rfind('}')?;
    if last <= first {
        return None;
    }
    match parse_with_repair(&body[first..=last]) {
        Some(value @ Value::Object(_)) => {
            tracing::debug!(first, last, "parsed object from outer brace span");
            Some(StructuredValue {
                value,
                source: StructuredSource::OuterBraces,
            })
        }
        _ => None,
    }
}

/// True when `value` is an object with at least one of `fields`.
pub fn has_fingerprint(value: &Value, fields: &[&str]) -> bool {
    value
        .as_object()
        .is_some_and(|obj| fields.iter().any(|f| obj.contains_key(*f)))
}

/// First present key among `keys` (models drift between spellings).
pub fn get_any<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(*k)).filter(|v| !v.is_null())
}

/// String field under any of `keys`, trimmed, non-empty. Numbers and bools
/// are rendered as text.
pub fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    let s = match get_any(value, keys)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// List of strings under any of `keys`. A lone string becomes a one-item list.
pub fn str_list(value: &Value, keys: &[&str]) -> Vec<String> {
    match get_any(value, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Array of objects under any of `keys`; anything else yields nothing.
pub fn object_list<'a>(value: &'a Value, keys: &[&str]) -> Vec<&'a Value> {
    match get_any(value, keys) {
        Some(Value::Array(items)) => items.iter().filter(|v| v.is_object()).collect(),
        _ => Vec::new(),
    }
}

/// Confidence in `[0, 1]`; absent or unparsable values become `0.5`.
///
/// The input is already a fraction: values above 1 clamp to 1. Percent
/// readings go through [`confidence_value`] first.
pub fn clamp_confidence(raw: Option<f64>) -> f64 {
    match raw {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => 0.5,
    }
}

/// Read a confidence figure as a fraction.
///
/// A trailing `%` divides by 100. So does a whole number from 2 to 100
/// written without a decimal point (`72`), the usual shape of an unmarked
/// percentage. Anything else is taken as written.
pub fn confidence_value(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if let Some(pct) = s.strip_suffix('%') {
        return pct.trim().parse::<f64>().ok().map(|v| v / 100.0);
    }
    let v = s.parse::<f64>().ok()?;
    let whole_percent =
        s.bytes().all(|b| b.is_ascii_digit()) && matches!(s.parse::<u32>(), Ok(2..=100));
    Some(if whole_percent { v / 100.0 } else { v })
}

/// Confidence under any of `keys`, as a number or a numeric string.
pub fn confidence_field(value: &Value, keys: &[&str]) -> Option<f64> {
    match get_any(value, keys)? {
        Value::Number(n) if n.is_f64() => n.as_f64(),
        Value::Number(n) => confidence_value(&n.to_string()),
        Value::String(s) => confidence_value(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1"), "{\"a\":1");
        assert_eq!(strip_code_fence("  plain  "), "plain");
    }

    #[test]
    fn test_decode_double_encoded() {
        assert_eq!(
            decode_double_encoded(r#""{\"a\": 1}""#).as_deref(),
            Some(r#"{"a": 1}"#)
        );
        assert!(decode_double_encoded(r#"{"a": 1}"#).is_none());
        assert!(decode_double_encoded("\"").is_none());
    }

    #[test]
    fn test_parse_structured_sources() {
        let whole = parse_structured("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(whole.source, StructuredSource::WholeText);

        let double = parse_structured(r#""{\"a\": 1}""#).unwrap();
        assert_eq!(double.source, StructuredSource::DoubleEncoded);
        assert_eq!(double.value, json!({"a": 1}));

        let outer = parse_structured("Here you go: {\"a\": {\"b\": 2}} hope it helps").unwrap();
        assert_eq!(outer.source, StructuredSource::OuterBraces);
        assert_eq!(outer.value, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_parse_structured_rejects_non_objects() {
        assert!(parse_structured("[1, 2, 3]").is_none());
        assert!(parse_structured("no braces here").is_none());
        assert!(parse_structured("} backwards {").is_none());
    }

    #[test]
    fn test_field_helpers() {
        let v = json!({"a": "  x ", "n": 3, "list": ["p", "", 2], "one": "solo", "nil": null});
        assert_eq!(str_field(&v, &["missing", "a"]).as_deref(), Some("x"));
        assert_eq!(str_field(&v, &["n"]).as_deref(), Some("3"));
        assert!(str_field(&v, &["nil"]).is_none());
        assert_eq!(str_list(&v, &["list"]), vec!["p".to_string(), "2".to_string()]);
        assert_eq!(str_list(&v, &["one"]), vec!["solo".to_string()]);
        assert!(has_fingerprint(&v, &["zzz", "n"]));
        assert!(!has_fingerprint(&json!([1]), &["n"]));
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(None), 0.5);
        assert_eq!(clamp_confidence(Some(f64::NAN)), 0.5);
        assert_eq!(clamp_confidence(Some(0.7)), 0.7);
        assert_eq!(clamp_confidence(Some(1.5)), 1.0);
        assert_eq!(clamp_confidence(Some(-3.0)), 0.0);
    }

    #[test]
    fn test_confidence_value_scales_once() {
        assert_eq!(confidence_value("80%"), Some(0.8));
        assert_eq!(confidence_value("150%"), Some(1.5));
        assert_eq!(confidence_value("72"), Some(0.72));
        assert_eq!(confidence_value("1.5"), Some(1.5));
        assert_eq!(confidence_value("1"), Some(1.0));
        assert_eq!(confidence_value("0.25"), Some(0.25));
        assert_eq!(confidence_value("400"), Some(400.0));
        assert_eq!(confidence_value("high"), None);
    }

    #[test]
    fn test_confidence_field() {
        let v = json!({"c": "150%", "d": 1.5, "e": 72, "f": "high", "g": 0.4});
        assert_eq!(clamp_confidence(confidence_field(&v, &["c"])), 1.0);
        assert_eq!(clamp_confidence(confidence_field(&v, &["d"])), 1.0);
        assert_eq!(clamp_confidence(confidence_field(&v, &["e"])), 0.72);
        assert_eq!(clamp_confidence(confidence_field(&v, &["f"])), 0.5);
        assert_eq!(clamp_confidence(confidence_field(&v, &["g"])), 0.4);
    }
}
