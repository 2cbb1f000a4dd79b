//! Error types for the boundary layer
//!
//! One enum per collaborator: store, path resolution, normalization,
//! toolchains, fetching and configuration. I/O errors always carry the
//! path or command involved.

use genkit_artifact::ParseError;
use std::path::PathBuf;

/// Artifact store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error on a path
    #[error("io error on {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Read of an artifact that does not exist
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    /// Write without overwrite to an existing artifact
    #[error("artifact already exists: {0}")]
    AlreadyExists(PathBuf),
}

impl StoreError {
    /// Create I/O error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reference/path resolution failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No GOPATH entry could be determined
    #[error("GOPATH is not set and no home directory is available")]
    NoGopath,

    /// Working directory is outside every `<gopath>/src`
    #[error("{dir} is not inside any GOPATH source root ({gopath})")]
    OutsideProject {
        /// Project directory
        dir: PathBuf,
        /// GOPATH entries searched, joined by the list separator
        gopath: String,
    },
}

/// Canonical formatting failures
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// Schema text does not parse
    #[error("schema does not parse: {0}")]
    Schema(#[from] ParseError),

    /// External formatter could not be started
    #[error("failed to run formatter `{command}`: {source}")]
    Spawn {
        /// Command line
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// External formatter rejected the text
    #[error("formatter `{command}` exited with {status}: {stderr}")]
    Failed {
        /// Command line
        command: String,
        /// Exit status
        status: String,
        /// Captured stderr
        stderr: String,
    },
}

/// External compiler failures, surfaced verbatim
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// Tool could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Command line
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Tool exited non-zero
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        /// Command line
        command: String,
        /// Exit status
        status: String,
        /// Captured stderr
        stderr: String,
    },
}

/// Schema import fetch failures
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level error
    #[error("request to {url} failed: {source}")]
    Http {
        /// URL requested
        url: String,
        /// Underlying error
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status
    #[error("{url} answered {status}")]
    Status {
        /// URL requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// No document registered for the URL (in-memory fetcher)
    #[error("no document for {0}")]
    Unknown(String),
}

/// Imported schema resolution failures
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Fetched document does not parse
    #[error("imported schema {url} does not parse: {source}")]
    Parse {
        /// URL of the document
        url: String,
        /// Parse failure
        #[source]
        source: ParseError,
    },
}

/// Write failures
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Normalization failed; nothing was written
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Store rejected the write
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Stored text differs from the text the write was derived from
    #[error("{path} changed since it was read")]
    Changed {
        /// Artifact path
        path: PathBuf,
    },
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid TOML or unknown keys
    #[error("invalid config {path}: {source}")]
    Toml {
        /// Config path
        path: PathBuf,
        /// Deserialization failure
        #[source]
        source: toml::de::Error,
    },

    /// A template lacks its `{}` placeholder
    #[error("`{key}` must contain a `{{}}` placeholder, got `{value}`")]
    Template {
        /// Config key
        key: String,
        /// Offending value
        value: String,
    },
}
