//! Synthesis templates, one per required-symbol kind
//!
//! [`TemplateSynthesizer`] dispatches a [`SymbolDescriptor`] to the
//! template named by its [`TemplateId`]. Each template is a plain function
//! building AST, so it can be tested without an artifact.

pub mod grpc;
pub mod http;
pub mod records;
pub mod routes;
pub mod schema;

use crate::error::SynthesisError;
use crate::fragment::{Fragment, ReferencePaths, Synthesizer};
use genkit_symbol::{NamingConvention, SymbolDescriptor, TemplateId};

pub(crate) const CONTEXT: &str = "context";
pub(crate) const ERRORS: &str = "errors";
pub(crate) const NET_HTTP: &str = "net/http";
pub(crate) const KIT_HTTP: &str = "github.com/go-kit/kit/transport/http";
pub(crate) const KIT_GRPC: &str = "github.com/go-kit/kit/transport/grpc";
pub(crate) const GORILLA_MUX: &str = "github.com/gorilla/mux";
pub(crate) const GORILLA_HANDLERS: &str = "github.com/gorilla/handlers";

/// Header of files regenerated whole on every run
pub const GENERATED_HEADER: &str = "THIS FILE IS AUTO GENERATED BY GENKIT DO NOT EDIT!!";

/// Synthesizer backed by the built-in templates
#[derive(Debug, Clone)]
pub struct TemplateSynthesizer {
    pub(crate) service: String,
    pub(crate) naming: NamingConvention,
    pub(crate) refs: ReferencePaths,
    pub(crate) gorilla_mux: bool,
}

impl TemplateSynthesizer {
    /// Templates for one service
    #[must_use]
    pub fn new(service: impl Into<String>, naming: NamingConvention, refs: ReferencePaths) -> Self {
        Self {
            service: service.into(),
            naming,
            refs,
            gorilla_mux: false,
        }
    }

    /// Mount HTTP handlers on `gorilla/mux` with CORS instead of `ServeMux`
    #[must_use]
    pub fn gorilla_mux(mut self, on: bool) -> Self {
        self.gorilla_mux = on;
        self
    }

    /// Schema service name (`user` -> `User`)
    #[must_use]
    pub fn service_name(&self) -> String {
        self.naming.service_name(&self.service)
    }

    /// Naming convention
    #[must_use]
    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Sibling package paths
    #[must_use]
    pub fn refs(&self) -> &ReferencePaths {
        &self.refs
    }
}

impl Synthesizer for TemplateSynthesizer {
    fn synthesize(&self, d: &SymbolDescriptor) -> Result<Fragment, SynthesisError> {
        let method = || d.method.as_deref().ok_or(SynthesisError::MissingMethod(d.template));
        let key = d.key.clone();

        let fragment = match d.template {
            TemplateId::CoderVar => Fragment::go(key, http::coder_var(self)),
            TemplateId::ErrorEncoder => Fragment::go(key, http::error_encoder(self)),
            TemplateId::HttpHandler => Fragment::go(key, http::handler(self, method()?)),
            TemplateId::HttpDecoder => Fragment::go(key, http::decoder(self, method()?)),
            TemplateId::HttpEncoder => Fragment::go(key, http::encoder(self, method()?)),
            TemplateId::GrpcHandler => Fragment::go(key, grpc::handler(self, method()?)),
            TemplateId::GrpcDecoder => Fragment::go(key, grpc::decoder(self, method()?)),
            TemplateId::GrpcEncoder => Fragment::go(key, grpc::encoder(self, method()?)),
            TemplateId::GrpcServerMethod => Fragment::go(key, grpc::server_method(self, method()?)),
            TemplateId::RequestRecord => Fragment::go(key, records::request(self, method()?)),
            TemplateId::ResponseRecord => Fragment::go(key, records::response(self, method()?)),
            TemplateId::RoutePattern => Fragment::go(key, routes::pattern(self, method()?)),
            TemplateId::ServiceEntry => Fragment::schema(key, schema::service(self)),
            TemplateId::RpcEntry => Fragment::schema(key, schema::rpc(self, method()?)),
            TemplateId::RequestMessage => Fragment::schema(key, schema::request(self, method()?)),
            TemplateId::ResponseMessage => Fragment::schema(key, schema::response(self, method()?)),
        };
        Ok(fragment)
    }
}

#[cfg(test)]
pub(crate) fn test_synth() -> TemplateSynthesizer {
    TemplateSynthesizer::new(
        "user",
        NamingConvention::default(),
        ReferencePaths::for_project("example.com/shop", "user"),
    )
}
