//! Synthesis and merge errors

use genkit_artifact::{ParseError, SymbolKey};
use genkit_symbol::TemplateId;

/// Errors producing a fragment for a required symbol
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// A per-method template was asked for without a method
    #[error("template {0:?} requires a method name")]
    MissingMethod(TemplateId),
}

/// Errors merging fragments into an artifact
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// The existing artifact does not parse
    #[error("existing artifact is malformed: {0}")]
    Corrupt(#[source] ParseError),

    /// Rendered fragments do not parse; a template bug
    #[error("synthesized code does not parse: {0}")]
    Candidate(#[source] ParseError),

    /// Fragment synthesis failed
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// A fragment of the other grammar reached this merger
    #[error("fragment for {0} does not match the artifact grammar")]
    GrammarMismatch(SymbolKey),

    /// An rpc fragment names a service absent from the document
    #[error("service `{0}` is not declared in the schema")]
    MissingService(String),
}
