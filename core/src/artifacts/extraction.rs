use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

static ARTIFACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<artifact\b([^>]*)>(.*?)</artifact>").expect("artifact block pattern")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern")
});

static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").expect("blank line run pattern"));

pub const DEFAULT_MIME: &str = "text/plain";

/// A rich-content block lifted out of a narrative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub title: String,
    pub identifier: String,
    pub content: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactExtraction {
    pub narrative: String,
    pub artifacts: Vec<Artifact>,
}

/// Pull `<artifact ...>...</artifact>` blocks out of `text`.
///
/// A trailing `<artifact` tag with no closing tag yet is cut from the
/// narrative along with everything after it.
pub fn extract_artifacts(text: &str) -> ArtifactExtraction {
    let mut artifacts = Vec::new();
    let mut narrative = String::with_capacity(text.len());
    let mut last = 0;

    for caps in ARTIFACT_RE.captures_iter(text) {
        let (Some(whole), Some(attrs), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        narrative.push_str(&text[last..whole.start()]);
        last = whole.end();
        artifacts.push(artifact_from_parts(attrs.as_str(), body.as_str()));
    }

    let rest = &text[last..];
    match rest.find("<artifact") {
        Some(open) => {
            tracing::debug!(offset = last + open, "unterminated artifact tag withheld");
            narrative.push_str(&rest[..open]);
        }
        None => narrative.push_str(rest),
    }

    ArtifactExtraction {
        narrative: BLANK_RUN_RE.replace_all(&narrative, "\n\n").trim().to_string(),
        artifacts,
    }
}

fn artifact_from_parts(attrs: &str, body: &str) -> Artifact {
    let mut title = None;
    let mut identifier = None;
    let mut declared_type = None;
    for caps in ATTR_RE.captures_iter(attrs) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty());
        match caps.get(1).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
            Some("title") => title = value,
            Some("identifier") | Some("id") => identifier = value,
            Some("type") | Some("mime") | Some("mime_type") => declared_type = value,
            _ => {}
        }
    }

    let content = body.trim().to_string();
    let identifier = identifier.unwrap_or_else(|| fallback_identifier(&content));
    let mime_type = declared_type
        .or_else(|| mime_from_extension(&identifier).map(str::to_string))
        .or_else(|| mime_from_content(&content).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MIME.to_string());

    Artifact {
        title: title.unwrap_or_else(|| identifier.clone()),
        identifier,
        content,
        mime_type,
    }
}

/// `artifact-` plus the first 8 hex digits of the content's SHA-256.
fn fallback_identifier(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("artifact-{}", &hex::encode(digest)[..8])
}

fn mime_from_extension(identifier: &str) -> Option<&'static str> {
    let (_, ext) = identifier.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "svg" => Some("image/svg+xml"),
        "html" | "htm" => Some("text/html"),
        "md" | "markdown" => Some("text/markdown"),
        "json" => Some("application/json"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

fn mime_from_content(content: &str) -> Option<&'static str> {
    let head = content.trim_start();
    let lower = head
        .get(..head.len().min(32))
        .unwrap_or(head)
        .to_ascii_lowercase();
    if lower.starts_with("<svg") || (lower.starts_with("<?xml") && content.contains("<svg")) {
        Some("image/svg+xml")
    } else if lower.starts_with("<!doctype html") || lower.starts_with("<html") {
        Some("text/html")
    } else if head.starts_with("```") {
        Some("text/markdown")
    } else {
        None
    }
}
