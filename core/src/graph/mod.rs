pub mod adapter;
pub mod legacy;
pub mod model;
pub mod parser;
pub mod schema;

pub use adapter::{adapt_to_legacy, restore_current, AdapterOutput, DerivationWarning, StatementIndex};
pub use legacy::{LegacyGraph, TurnMetadata};
pub use model::ClaimGraph;
pub use parser::parse_claim_graph;
pub use schema::{detect_graph_schema, GraphSchema};
