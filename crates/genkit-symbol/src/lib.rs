//! Genkit Symbol Policy
//!
//! Decides what generation is driven by and what it must produce.
//!
//! # Overview
//!
//! - **MethodPolicy**: admits service methods matching the handler
//!   contract, rewriting legacy signatures once, then applies an allow-list
//! - **Deriver**: turns kept methods into [`RequiredSymbolSet`]s, one per
//!   artifact, with names from a [`NamingConvention`]
//!
//! # Example
//!
//! ```rust
//! use genkit_artifact::ServiceMethod;
//! use genkit_symbol::{Deriver, MethodPolicy, NamingConvention, Transport};
//!
//! let method = ServiceMethod::new("Ping")
//!     .param("ctx", "context.Context")
//!     .param("req_pb", "pb.PingReq")
//!     .param("rsp_pb", "*pb.PingRsp")
//!     .result("errcode", "int32");
//!
//! let outcome = MethodPolicy::new(NamingConvention::default()).filter(&[method]);
//! let required = Deriver::default().transport(&outcome.kept, Transport::Http);
//! assert_eq!(required.len(), 5);
//! ```

#![warn(missing_docs)]

pub mod derive;
pub mod naming;
pub mod policy;

mod error;
mod transport;

pub use derive::{Deriver, RequiredSymbolSet, SymbolDescriptor, TemplateId};
pub use error::PolicyError;
pub use naming::NamingConvention;
pub use policy::{apply_rewrites, FilterOutcome, MethodPolicy, PolicyViolation, Rejection, SignatureRewrite};
pub use transport::Transport;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
