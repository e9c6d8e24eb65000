pub mod brackets;

pub use brackets::{build_prompt, expand_prompt, parse_brackets, Bracket};
