//! Genkit Layer
//!
//! The trusted boundary between generation and the outside world: the
//! filesystem, the Go project layout, external formatters and compilers,
//! and schema documents fetched over the network.
//!
//! # Architecture
//!
//! ```text
//! genkit.toml → GenkitConfig → PathResolver → ServicePaths / ReferencePaths
//!
//! merged text → Normalizer → ArtifactWriter → ArtifactStore
//!                                               ├─ FsStore (atomic replace)
//!                                               ├─ MemoryStore
//!                                               └─ OverlayStore (dry run)
//!
//! schema imports → SchemaImportResolver → SchemaFetcher (reqwest)
//! ```
//!
//! # Example
//!
//! ```rust
//! use genkit_layer::{ArtifactWriter, GoNormalizer, MemoryStore, WriteStatus};
//! use std::path::Path;
//!
//! let store = MemoryStore::new();
//! let writer = ArtifactWriter::new(&store);
//! let status = writer.commit(Path::new("a.go"), "package a\n\n\n", &GoNormalizer::new()).unwrap();
//! assert_eq!(status, WriteStatus::Created);
//! assert_eq!(store.get(Path::new("a.go")).as_deref(), Some("package a\n"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod normalize;
pub mod paths;
pub mod resolve;
pub mod store;
pub mod toolchain;
pub mod writer;

pub use config::{GenkitConfig, PathsConfig, ProjectConfig, SchemaConfig, ToolchainConfig, CONFIG_FILE};
pub use error::{
    ConfigError, FetchError, ImportError, NormalizeError, ResolveError, StoreError, ToolchainError, WriteError,
};
pub use normalize::{go_normalizer, ExternalFormatter, GoNormalizer, Normalizer, SchemaNormalizer};
pub use paths::{PathResolver, ServicePaths};
pub use resolve::{MemoryFetcher, ReqwestFetcher, ResolvedImports, SchemaFetcher, SchemaImportResolver};
pub use store::{ArtifactStore, FsStore, MemoryStore, OverlayStore};
pub use toolchain::{ScriptFlavor, Toolchain};
pub use writer::{ArtifactWriter, WriteStatus};
