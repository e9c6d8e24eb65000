pub mod artifacts;
pub mod audit;
pub mod graph;
pub mod options;
pub mod parse;
pub mod prompt;
pub mod response;
pub mod section;
pub mod text;

pub mod error;

pub use response::{parse_response, ParsedResponse};
