pub mod parser;

pub use parser::{parse_decision_options, DecisionOption};
