//! Error types for genkit generation
//!
//! Every variant aborts generation for the service. Method rejections are
//! not errors; they are reported as [`Rejection`](genkit_symbol::Rejection)
//! values in the [`GenerationReport`](crate::GenerationReport).

use genkit_artifact::ParseError;
use genkit_composition::MergeError;
use genkit_layer::{ImportError, NormalizeError, ResolveError, StoreError, ToolchainError, WriteError};
use std::path::PathBuf;

/// Main generation error type
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Requested transport kind not recognized; nothing was touched
    #[error("transport `{0}` not supported")]
    UnsupportedConfiguration(String),

    /// Service declaration file does not exist
    #[error("service {service} was not found at {path}")]
    ServiceNotFound {
        /// Service name as requested
        service: String,
        /// Expected declaration path
        path: PathBuf,
    },

    /// Service declaration lacks the service interface
    #[error("could not find the service interface `{interface}` in `{path}`")]
    InterfaceNotFound {
        /// Interface name looked up
        interface: String,
        /// Declaration path
        path: PathBuf,
    },

    /// Every method was rejected or filtered out
    #[error("the service `{service}` has no suitable methods, please implement the interface methods")]
    NoSuitableMethods {
        /// Service name as requested
        service: String,
    },

    /// An existing artifact does not parse; it was left untouched
    #[error("artifact {path} is corrupt: {source}")]
    ArtifactCorrupt {
        /// Artifact path
        path: PathBuf,
        /// Parse failure
        #[source]
        source: ParseError,
    },

    /// Project root or import paths cannot be determined
    #[error("reference resolution failed: {0}")]
    ReferenceResolution(#[from] ResolveError),

    /// Synthesized or merged text is invalid
    #[error("synthesis failed for {path}: {source}")]
    Synthesis {
        /// Artifact path
        path: PathBuf,
        /// Merge failure
        #[source]
        source: MergeError,
    },

    /// Canonical formatting failed; the artifact was not written
    #[error("normalizing {path} failed: {source}")]
    Normalize {
        /// Artifact path
        path: PathBuf,
        /// Formatter failure
        #[source]
        source: NormalizeError,
    },

    /// Artifact was edited while the run was merging into it
    #[error("{path} was modified during generation; nothing was written to it")]
    ArtifactChanged {
        /// Artifact path
        path: PathBuf,
    },

    /// External compiler failed
    #[error("toolchain failed: {0}")]
    Toolchain(#[from] ToolchainError),

    /// Schema import could not be resolved
    #[error("schema import failed: {0}")]
    Import(#[from] ImportError),

    /// Artifact store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GenerateError {
    /// Whether generation must stop
    ///
    /// Always true: every failure aborts the service's pipeline.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Artifact the error is about, if any
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::ServiceNotFound { path, .. }
            | Self::InterfaceNotFound { path, .. }
            | Self::ArtifactCorrupt { path, .. }
            | Self::Synthesis { path, .. }
            | Self::Normalize { path, .. }
            | Self::ArtifactChanged { path } => Some(path),
            Self::Store(StoreError::Io { path, .. } | StoreError::NotFound(path) | StoreError::AlreadyExists(path)) => {
                Some(path)
            }
            _ => None,
        }
    }

    /// Map a merge failure on `path`; unparseable input is corruption
    pub(crate) fn merge(path: &std::path::Path, err: MergeError) -> Self {
        match err {
            MergeError::Corrupt(source) => Self::ArtifactCorrupt {
                path: path.to_path_buf(),
                source,
            },
            source => Self::Synthesis {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Map a write failure on `path`
    pub(crate) fn write(path: &std::path::Path, err: WriteError) -> Self {
        match err {
            WriteError::Normalize(source) => Self::Normalize {
                path: path.to_path_buf(),
                source,
            },
            WriteError::Store(e) => Self::Store(e),
            WriteError::Changed { path } => Self::ArtifactChanged { path },
        }
    }
}
