//! Command handlers for the grounded CLI.

pub mod explain;
pub mod sentences;

pub use explain::ExplainCommand;
pub use sentences::SentencesCommand;
