use extract_core::audit::parse_audit_report;
use extract_core::error::CoreResult;
use extract_core::graph::parser::graph_from_value;
use extract_core::section::split::{split_options_with, split_topology_with};
use extract_core::section::{LocatorConfig, SectionLocator};
use extract_core::text::normalize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PROBED_EXTENSIONS: &[&str] = &["txt", "md", "json"];

struct Locators {
    topology: SectionLocator,
    options: SectionLocator,
}

#[derive(Debug, Serialize)]
struct SectionHit {
    start: usize,
    position: f64,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    bytes: usize,
    topology: Option<SectionHit>,
    topology_parsed: bool,
    graph_claims: Option<usize>,
    options: Option<SectionHit>,
    audit_confidence: f64,
    audit_fields: usize,
}

#[derive(Debug, Default, Serialize)]
struct ProbeSummary {
    files: usize,
    with_topology: usize,
    with_graph: usize,
    with_options: usize,
    with_audit: usize,
    reports: Vec<FileReport>,
}

fn hit(locator: &SectionLocator, text: &str) -> Option<SectionHit> {
    let span = locator.locate(text)?;
    Some(SectionHit {
        start: span.start,
        position: span.start as f64 / text.len().max(1) as f64,
    })
}

fn probe_text(path: &Path, raw: &str, locators: &Locators) -> FileReport {
    let text = normalize(raw);
    let topology_split = split_topology_with(&locators.topology, &text);
    let graph_claims = topology_split
        .topology
        .as_ref()
        .and_then(graph_from_value)
        .map(|g| g.claims.len());
    let audit = parse_audit_report(&text);
    let audit_fields = [
        audit.reliability.is_some(),
        !audit.gaps.is_empty(),
        !audit.signals.is_empty(),
        !audit.synthesis_accuracy.is_empty(),
        !audit.verification_triggers.is_empty(),
        audit.reframe.is_some(),
        audit.honest_assessment.is_some(),
        audit.mapper_audit.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count();

    FileReport {
        path: path.display().to_string(),
        bytes: raw.len(),
        topology: hit(&locators.topology, &text),
        topology_parsed: topology_split.topology.is_some(),
        graph_claims,
        options: hit(&locators.options, &topology_split.narrative),
        audit_confidence: audit.confidence,
        audit_fields,
    }
}

fn probe_dir(root: &Path, locators: &Locators) -> ProbeSummary {
    let mut summary = ProbeSummary::default();
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| PROBED_EXTENSIONS.contains(&x))
        })
        .collect();
    paths.sort();

    for path in paths {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping file");
                continue;
            }
        };
        let report = probe_text(&path, &raw, locators);
        tracing::debug!(path = %path.display(), topology = report.topology.is_some(), options = report.options.is_some(), "probed");

        summary.files += 1;
        summary.with_topology += usize::from(report.topology.is_some());
        summary.with_graph += usize::from(report.graph_claims.is_some());
        summary.with_options += usize::from(report.options.is_some());
        summary.with_audit += usize::from(report.audit_fields > 0);
        summary.reports.push(report);
    }
    summary
}

fn load_locators(config_path: Option<&str>) -> CoreResult<Locators> {
    let config = match config_path {
        Some(path) => LocatorConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => LocatorConfig::builtin()?,
    };
    Ok(Locators {
        topology: config.topology_locator()?,
        options: config.options_locator()?,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("usage: corpus_probe <dir/with/recorded/outputs> [locator_patterns.json]");
        std::process::exit(2);
    }
    let locators = match load_locators(args.get(2).map(String::as_str)) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("config error ({}): {}", args.get(2).map_or("builtin", String::as_str), e);
            std::process::exit(2);
        }
    };

    tracing::info!(
        topology = ?locators.topology.pattern_names(),
        options = ?locators.options.pattern_names(),
        "locator patterns loaded"
    );
    let summary = probe_dir(Path::new(&args[1]), &locators);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("serialize error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract_core::error::CoreError;

    #[test]
    fn test_probe_dir_counts_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.md"),
            "Intro.\n=== GRAPH_TOPOLOGY ===\n{\"claims\": [{\"id\": \"c1\", \"label\": \"A\"}]}\nTail.",
        )
        .unwrap();
        std::fs::write(dir.path().join("b.txt"), "Plain answer with no sections.").unwrap();
        std::fs::write(dir.path().join("skip.bin"), "=== GRAPH_TOPOLOGY ===").unwrap();

        let locators = load_locators(None).unwrap();
        let summary = probe_dir(dir.path(), &locators);
        assert_eq!(summary.files, 2);
        assert_eq!(summary.with_topology, 1);
        assert_eq!(summary.with_graph, 1);
        assert_eq!(summary.reports[0].graph_claims, Some(1));
        assert_eq!(summary.with_options, 0);
    }

    #[test]
    fn test_bad_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(&path, r#"{"config_version": "other", "topology": [], "options": []}"#).unwrap();
        assert!(matches!(load_locators(path.to_str()), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(load_locators(path.to_str()), Err(CoreError::Io(_))));
    }
}
