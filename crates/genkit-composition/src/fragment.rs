//! Synthesized fragments and the synthesizer seam

use crate::ast::Decl;
use crate::error::SynthesisError;
use genkit_artifact::schema::{Message, Rpc, Service};
use genkit_artifact::SymbolKey;
use genkit_symbol::SymbolDescriptor;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Schema-side fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaFragment {
    /// New top-level service
    Service(Service),
    /// rpc entry appended to an existing service
    Rpc {
        /// Owning service
        service: String,
        /// Entry
        rpc: Rpc,
    },
    /// New top-level message
    Message(Message),
}

/// Fragment content by grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentBody {
    /// Go declaration
    Go(Decl),
    /// proto3 element
    Schema(SchemaFragment),
}

/// One synthesized, appendable declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Symbol this fragment satisfies
    pub symbol: SymbolKey,
    /// Declaration
    pub body: FragmentBody,
}

impl Fragment {
    /// Go fragment
    #[must_use]
    pub fn go(symbol: SymbolKey, decl: impl Into<Decl>) -> Self {
        Self {
            symbol,
            body: FragmentBody::Go(decl.into()),
        }
    }

    /// Schema fragment
    #[must_use]
    pub fn schema(symbol: SymbolKey, fragment: SchemaFragment) -> Self {
        Self {
            symbol,
            body: FragmentBody::Schema(fragment),
        }
    }

    /// External references the fragment introduces (Go import paths)
    #[must_use]
    pub fn references(&self) -> IndexSet<String> {
        match &self.body {
            FragmentBody::Go(decl) => decl.references(),
            FragmentBody::Schema(_) => IndexSet::new(),
        }
    }
}

/// Produces the fragment for a required symbol
///
/// One template per [`TemplateId`](genkit_symbol::TemplateId); the same
/// descriptor must always produce the same fragment.
pub trait Synthesizer {
    /// Synthesize the declaration for `descriptor`
    ///
    /// # Errors
    /// Returns `SynthesisError` if the template cannot be filled
    fn synthesize(&self, descriptor: &SymbolDescriptor) -> Result<Fragment, SynthesisError>;
}

/// Import paths generated code uses to reach sibling packages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePaths {
    /// Endpoint set package (`Endpoints`)
    pub endpoint: String,
    /// Request/response records package
    pub pb: String,
    /// Route pattern package
    pub conf: String,
    /// Shared HTTP coder package (`DefaultCoder`)
    pub comm_http: String,
    /// Shared record bases package (`ReqBase`, `RspBase`)
    pub comm_pb: String,
}

impl ReferencePaths {
    /// Paths for a service inside a project, using the default layout
    #[must_use]
    pub fn for_project(project: &str, service_dir: &str) -> Self {
        Self {
            endpoint: format!("{project}/{service_dir}/pkg/endpoint"),
            pb: format!("{project}/{service_dir}/pkg/pb"),
            conf: format!("{project}/{service_dir}/pkg/conf"),
            comm_http: format!("{project}/comm/http"),
            comm_pb: format!("{project}/comm/pb"),
        }
    }
}
