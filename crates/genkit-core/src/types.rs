//! Requests and reports

use genkit_composition::{MergeOutcome, MergeSummary, SchemaOutcome};
use genkit_layer::WriteStatus;
use genkit_symbol::{Rejection, Transport};
use serde::Serialize;
use std::path::PathBuf;

/// What to generate for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Service name as given by the operator (`user`, `user_order`)
    pub service: String,
    /// Transport kind as given; validated before anything is read
    pub transport: String,
    /// Mount HTTP handlers on gorilla/mux with CORS
    pub gorilla_mux: bool,
    /// Allow-list of method names; empty keeps every admitted method
    pub methods: Vec<String>,
    /// Persist legacy signature rewrites into the service declaration
    pub rewrite_service_signatures: bool,
}

impl GenerateRequest {
    /// Request for `service` over `transport` with no options
    #[must_use]
    pub fn new(service: impl Into<String>, transport: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            transport: transport.into(),
            gorilla_mux: false,
            methods: Vec::new(),
            rewrite_service_signatures: false,
        }
    }

    /// Restrict generation to these methods
    #[must_use]
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Use gorilla/mux for HTTP handlers
    #[must_use]
    pub fn with_gorilla_mux(mut self, on: bool) -> Self {
        self.gorilla_mux = on;
        self
    }

    /// Write rewritten legacy signatures back to the service declaration
    #[must_use]
    pub fn with_signature_rewrites(mut self, on: bool) -> Self {
        self.rewrite_service_signatures = on;
        self
    }
}

/// What happened to one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactOutcome {
    /// Artifact path
    pub path: PathBuf,
    /// Symbols synthesized in this run
    pub synthesized: Vec<String>,
    /// Imports added to existing text
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imports_added: Vec<String>,
    /// Store result
    pub status: WriteStatus,
    /// Whether the store was touched
    pub written: bool,
    /// Whether the artifact did not exist before
    pub first_generation: bool,
}

impl ArtifactOutcome {
    /// Outcome of an artifact with no symbol-level merge (base files, scripts)
    #[must_use]
    pub fn whole(path: PathBuf, status: WriteStatus, first_generation: bool) -> Self {
        Self {
            path,
            synthesized: Vec::new(),
            imports_added: Vec::new(),
            status,
            written: status.written(),
            first_generation,
        }
    }

    fn merged(path: PathBuf, summary: MergeSummary, status: WriteStatus, first_generation: bool) -> Self {
        Self {
            path,
            synthesized: summary.added,
            imports_added: summary.imports_added,
            status,
            written: status.written(),
            first_generation,
        }
    }

    pub(crate) fn from_merge(path: PathBuf, outcome: &MergeOutcome, status: WriteStatus) -> Self {
        Self::merged(path, outcome.into(), status, outcome.plan.first_generation)
    }

    pub(crate) fn from_schema(path: PathBuf, outcome: &SchemaOutcome, status: WriteStatus) -> Self {
        Self::merged(path, outcome.into(), status, outcome.plan.first_generation)
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Service name as requested
    pub service: String,
    /// Transport generated; `None` for schema-only runs
    pub transport: Option<Transport>,
    /// Methods generation was driven by, in declaration order
    pub kept: Vec<String>,
    /// Methods excluded by the policy
    pub rejections: Vec<Rejection>,
    /// Methods whose legacy signature was rewritten
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rewritten: Vec<String>,
    /// Artifacts in pipeline order
    pub artifacts: Vec<ArtifactOutcome>,
}

impl GenerationReport {
    /// Artifacts the run wrote
    pub fn written(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.artifacts.iter().filter(|a| a.written)
    }

    /// Outcome for `path`
    #[must_use]
    pub fn artifact(&self, path: &std::path::Path) -> Option<&ArtifactOutcome> {
        self.artifacts.iter().find(|a| a.path == path)
    }

    /// Whether a run changed nothing
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.written().next().is_none()
    }
}
