//! Genkit Core - per-service generation
//!
//! Drives the policy, derivation and merge crates over the artifacts of
//! one service, in a fixed order:
//!
//! ```text
//! service.go → MethodPolicy → {name}.proto → pb records → handlers
//!                                                          → handler base
//!                                                          → route patterns (HTTP)
//! ```
//!
//! # Example
//!
//! ```rust
//! use genkit_core::{GenerateRequest, Generator};
//! use genkit_layer::{GenkitConfig, MemoryStore, PathResolver, PathsConfig};
//!
//! let store = MemoryStore::new().with_file(
//!     "/w/user/pkg/service/service.go",
//!     "package service\n\nimport \"context\"\n\ntype UserService interface {\n\tPing(ctx context.Context) int32\n}\n",
//! );
//! let mut config = GenkitConfig::default();
//! config.project.testing = true;
//! let resolver = PathResolver::with_import_path("/w", "example.com/shop", PathsConfig::default());
//!
//! let report = Generator::new(config, resolver, &store)
//!     .add_transport(&GenerateRequest::new("user", "http"))
//!     .unwrap();
//! assert_eq!(report.kept, ["Ping"]);
//! assert!(store.get("/w/user/pkg/http/handler.go".as_ref()).unwrap().contains("func makePingHandler("));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod pipeline;
pub mod types;

mod stages;

pub use error::GenerateError;
pub use pipeline::Generator;
pub use types::{ArtifactOutcome, GenerateRequest, GenerationReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
