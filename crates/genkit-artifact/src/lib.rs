//! Genkit Artifact Models
//!
//! Symbol-level views of the artifacts generation reads and extends.
//!
//! # Core Concepts
//!
//! - [`ArtifactModel`]: symbol table of one artifact (top-level names keyed
//!   by kind, imports, service interfaces) plus a hash of its text
//! - [`GoParser`]: builds a model from Go source with tree-sitter
//! - [`SchemaDocument`]: proto3 document that can be parsed, extended and
//!   re-rendered by [`SchemaFormatter`]
//! - [`ServiceInterface`]: a service contract read from a Go interface
//!
//! # Example
//!
//! ```rust,ignore
//! use genkit_artifact::{GoParser, SymbolKey};
//!
//! let model = GoParser::new().parse(source)?;
//! if !model.contains(&SymbolKey::function("makePingHandler")) {
//!     // synthesize it
//! }
//! ```

#![warn(unreachable_pub)]

mod error;
mod go;
mod hash;
mod model;
mod service;

/// proto3 documents
pub mod schema;

pub use error::ParseError;
pub use go::GoParser;
pub use hash::ContentHash;
pub use model::{
    guess_package_name, ArtifactKind, ArtifactModel, ImportBlock, ImportSpec, SymbolKey, SymbolKind,
};
pub use schema::{SchemaDocument, SchemaFormatter, SchemaParser};
pub use service::{NamedTypeValue, ServiceInterface, ServiceMethod};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
