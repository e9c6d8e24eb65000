pub mod extraction;

pub use extraction::{extract_artifacts, Artifact, ArtifactExtraction};
