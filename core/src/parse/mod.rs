pub mod balanced;
pub mod heuristics;
pub mod tolerant;

pub use balanced::{scan_object, ScannedObject};
pub use tolerant::{parse_structured, StructuredSource, StructuredValue};
