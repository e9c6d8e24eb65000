use crate::error::{CoreError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One accepted spelling of a section header.
///
/// `min_position` is the fraction of the document (0.0..=1.0) a match must
/// start at or after; `priority` breaks ties between matches at the same
/// position (higher wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeaderPattern {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub min_position: f64,
    #[serde(default)]
    pub priority: u32,
}

/// Byte span of a located section header inside normalized text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionSpan {
    pub start: usize,
    pub length: usize,
}

impl SectionSpan {
    /// Offset of the first byte after the header.
    pub fn header_end(&self) -> usize {
        self.start + self.length
    }
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    name: String,
    regex: Regex,
    min_position: f64,
    priority: u32,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    position: f64,
    priority: u32,
    order: usize,
}

/// Position-scored search over an ordered list of header patterns.
#[derive(Debug, Clone)]
pub struct SectionLocator {
    patterns: Vec<CompiledPattern>,
}

impl SectionLocator {
    pub fn new(patterns: &[HeaderPattern]) -> CoreResult<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for p in patterns {
            if p.pattern.trim().is_empty() {
                return Err(CoreError::InvalidInput(format!("pattern {} is empty", p.name)));
            }
            if !(0.0..=1.0).contains(&p.min_position) {
                return Err(CoreError::Config(format!(
                    "pattern {} has min_position {} outside 0..=1",
                    p.name, p.min_position
                )));
            }
            compiled.push(CompiledPattern {
                name: p.name.clone(),
                regex: Regex::new(&p.pattern)?,
                min_position: p.min_position,
                priority: p.priority,
            });
        }
        Ok(Self { patterns: compiled })
    }

    /// A locator that never finds anything.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }

    /// Find the header with the greatest normalized position among matches
    /// that clear their pattern's minimum position.
    pub fn locate(&self, text: &str) -> Option<SectionSpan> {
        if text.is_empty() {
            return None;
        }
        let doc_len = text.len() as f64;
        let mut best: Option<Candidate> = None;

        for (order, p) in self.patterns.iter().enumerate() {
            for m in p.regex.find_iter(text) {
                let start = line_anchored_start(text, m.start());
                let position = start as f64 / doc_len;
                if position < p.min_position {
                    continue;
                }
                let candidate = Candidate {
                    start,
                    end: m.end(),
                    position,
                    priority: p.priority,
                    order,
                };
                if best.map_or(true, |b| outranks(&candidate, &b)) {
                    best = Some(candidate);
                }
            }
        }

        best.map(|c| {
            tracing::debug!(
                pattern = %self.patterns[c.order].name,
                start = c.start,
                position = c.position,
                "section header located"
            );
            SectionSpan {
                start: c.start,
                length: c.end - c.start,
            }
        })
    }
}

fn outranks(a: &Candidate, b: &Candidate) -> bool {
    if a.start != b.start {
        return a.start > b.start;
    }
    if a.priority != b.priority {
        return a.priority > b.priority;
    }
    a.order < b.order
}

/// Pull a match back to the start of its line when only markup precedes it
/// there (`## `, `**`, an emoji), so overlapping spellings of one header
/// resolve to the same offset.
fn line_anchored_start(text: &str, start: usize) -> usize {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    if text[line_start..start].chars().any(char::is_alphanumeric) {
        start
    } else {
        line_start
    }
}
