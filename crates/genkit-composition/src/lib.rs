//! Genkit Composition
//!
//! Turns required symbols into code and merges it into artifacts without
//! touching what is already there.
//!
//! # Pipeline
//!
//! 1. [`MergeEngine::plan`] tests each required symbol against the parsed
//!    artifact and asks a [`Synthesizer`] for the absent ones
//! 2. Go fragments are rendered by [`GoRenderer`] against the file's import
//!    table, appended, and their imports reconciled by [`ImportReconciler`]
//! 3. Schema fragments are appended to the [`SchemaDocument`]
//!    (rpc entries into their service)
//! 4. The result is re-parsed; anything still absent is reported
//!
//! [`SchemaDocument`]: genkit_artifact::SchemaDocument
//!
//! # Example
//!
//! ```rust
//! use genkit_artifact::ServiceMethod;
//! use genkit_composition::{MergeEngine, ReferencePaths, TemplateSynthesizer};
//! use genkit_symbol::{Deriver, NamingConvention};
//!
//! let synth = TemplateSynthesizer::new(
//!     "user",
//!     NamingConvention::default(),
//!     ReferencePaths::for_project("example.com/shop", "user"),
//! );
//! let required = Deriver::default().routes(&[ServiceMethod::new("Ping")]);
//! let out = MergeEngine::new(&synth).merge_go("", "conf", &required).unwrap();
//! assert!(out.text.contains("var PingReqPattern = \"/ping\""));
//! ```

#![warn(missing_docs)]

pub mod ast;
pub mod engine;
pub mod render;
pub mod templates;

mod error;
mod fragment;
mod reconcile;

pub use engine::{MergeEngine, MergeOutcome, MergePlan, MergeSummary, SchemaOutcome};
pub use error::{MergeError, SynthesisError};
pub use fragment::{Fragment, FragmentBody, ReferencePaths, SchemaFragment, Synthesizer};
pub use reconcile::ImportReconciler;
pub use render::{GoRenderer, ImportTable};
pub use templates::{TemplateSynthesizer, GENERATED_HEADER};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
