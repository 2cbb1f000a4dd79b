//! Required-symbol derivation
//!
//! Computes which declarations must exist in each artifact for a set of
//! kept methods. Output order is methods in declaration order, and within
//! a method a fixed kind order: shared symbols first, then handler,
//! decoder, encoder (and for gRPC the server method).

use crate::naming::NamingConvention;
use crate::transport::Transport;
use genkit_artifact::{ServiceMethod, SymbolKey};
use indexmap::IndexMap;
use serde::Serialize;

/// Synthesis template a required symbol is produced by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    /// `var defaultCoder = http1.DefaultCoder{}`
    CoderVar,
    /// Shared HTTP error encoder
    ErrorEncoder,
    /// `make<M>Handler` mounting on a router
    HttpHandler,
    /// JSON request decoder
    HttpDecoder,
    /// JSON response encoder
    HttpEncoder,
    /// `make<M>Handler` returning a `grpc.Handler`
    GrpcHandler,
    /// Not-implemented gRPC decoder stub
    GrpcDecoder,
    /// Not-implemented gRPC encoder stub
    GrpcEncoder,
    /// `(g *grpcServer) <M>` bridging to the handler
    GrpcServerMethod,
    /// Go request record embedding the schema message
    RequestRecord,
    /// Go response record embedding the schema message
    ResponseRecord,
    /// `<M>ReqPattern` route constant
    RoutePattern,
    /// Schema service entry
    ServiceEntry,
    /// Schema rpc entry
    RpcEntry,
    /// Schema request message
    RequestMessage,
    /// Schema response message
    ResponseMessage,
}

/// A declaration that must exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolDescriptor {
    /// Kind-scoped name
    pub key: SymbolKey,
    /// Template producing it
    pub template: TemplateId,
    /// Method it was derived from; `None` for shared symbols
    pub method: Option<String>,
}

/// Ordered, duplicate-free set of required symbols for one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredSymbolSet {
    name: String,
    symbols: IndexMap<SymbolKey, SymbolDescriptor>,
}

impl RequiredSymbolSet {
    /// Empty set labelled with the artifact it targets
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: IndexMap::new(),
        }
    }

    /// Label
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a descriptor; the first one for a key wins
    pub fn push(&mut self, key: SymbolKey, template: TemplateId, method: Option<&str>) {
        self.symbols.entry(key.clone()).or_insert_with(|| SymbolDescriptor {
            key,
            template,
            method: method.map(str::to_string),
        });
    }

    /// Whether a key is required
    #[must_use]
    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.symbols.contains_key(key)
    }

    /// Descriptors in derivation order
    pub fn iter(&self) -> impl Iterator<Item = &SymbolDescriptor> {
        self.symbols.values()
    }

    /// Keys in derivation order
    pub fn keys(&self) -> impl Iterator<Item = &SymbolKey> {
        self.symbols.keys()
    }

    /// Number of required symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether nothing is required
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<'a> IntoIterator for &'a RequiredSymbolSet {
    type Item = &'a SymbolDescriptor;
    type IntoIter = indexmap::map::Values<'a, SymbolKey, SymbolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.values()
    }
}

/// Derives required symbol sets from kept methods
#[derive(Debug, Clone, Default)]
pub struct Deriver {
    naming: NamingConvention,
}

impl Deriver {
    /// Create a deriver
    #[must_use]
    pub fn new(naming: NamingConvention) -> Self {
        Self { naming }
    }

    /// Naming convention in use
    #[must_use]
    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Handler artifact symbols for a transport
    #[must_use]
    pub fn transport(&self, methods: &[ServiceMethod], transport: Transport) -> RequiredSymbolSet {
        let n = &self.naming;
        let mut set = RequiredSymbolSet::new(format!("{transport} handlers"));

        if transport == Transport::Http && !methods.is_empty() {
            set.push(SymbolKey::variable(&n.coder_var), TemplateId::CoderVar, None);
            set.push(SymbolKey::function(&n.error_encoder), TemplateId::ErrorEncoder, None);
        }

        for m in methods {
            let name = m.name.as_str();
            match transport {
                Transport::Http => {
                    set.push(SymbolKey::function(n.handler(name)), TemplateId::HttpHandler, Some(name));
                    set.push(SymbolKey::function(n.decoder(name)), TemplateId::HttpDecoder, Some(name));
                    set.push(SymbolKey::function(n.encoder(name)), TemplateId::HttpEncoder, Some(name));
                }
                Transport::Grpc => {
                    set.push(SymbolKey::function(n.handler(name)), TemplateId::GrpcHandler, Some(name));
                    set.push(SymbolKey::function(n.decoder(name)), TemplateId::GrpcDecoder, Some(name));
                    set.push(SymbolKey::function(n.encoder(name)), TemplateId::GrpcEncoder, Some(name));
                    set.push(
                        SymbolKey::method(&format!("*{}", n.grpc_server), name),
                        TemplateId::GrpcServerMethod,
                        Some(name),
                    );
                }
            }
        }
        set
    }

    /// Go request/response records in the pb package
    #[must_use]
    pub fn records(&self, methods: &[ServiceMethod]) -> RequiredSymbolSet {
        let mut set = RequiredSymbolSet::new("pb records");
        for m in methods {
            let name = m.name.as_str();
            set.push(SymbolKey::record(self.naming.request_record(name)), TemplateId::RequestRecord, Some(name));
            set.push(SymbolKey::record(self.naming.response_record(name)), TemplateId::ResponseRecord, Some(name));
        }
        set
    }

    /// Route pattern variables
    #[must_use]
    pub fn routes(&self, methods: &[ServiceMethod]) -> RequiredSymbolSet {
        let mut set = RequiredSymbolSet::new("route patterns");
        for m in methods {
            let name = m.name.as_str();
            set.push(SymbolKey::variable(self.naming.route_pattern(name)), TemplateId::RoutePattern, Some(name));
        }
        set
    }

    /// Schema service entry, rpc entries and messages
    #[must_use]
    pub fn schema(&self, service: &str, methods: &[ServiceMethod]) -> RequiredSymbolSet {
        let svc = self.naming.service_name(service);
        let mut set = RequiredSymbolSet::new("schema");
        set.push(SymbolKey::service(&svc), TemplateId::ServiceEntry, None);
        for m in methods {
            let name = m.name.as_str();
            set.push(SymbolKey::rpc(&svc, name), TemplateId::RpcEntry, Some(name));
            set.push(SymbolKey::message(self.naming.request_message(name)), TemplateId::RequestMessage, Some(name));
            set.push(SymbolKey::message(self.naming.response_message(name)), TemplateId::ResponseMessage, Some(name));
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn methods(names: &[&str]) -> Vec<ServiceMethod> {
        names.iter().map(|n| ServiceMethod::new(*n)).collect()
    }

    fn names(set: &RequiredSymbolSet) -> Vec<String> {
        set.keys().map(ToString::to_string).collect()
    }

    #[test]
    fn http_shared_symbols_once_then_per_method_order() {
        let set = Deriver::default().transport(&methods(&["CreateOrder", "CancelOrder"]), Transport::Http);
        assert_eq!(
            names(&set),
            vec![
                "variable:defaultCoder",
                "function:ErrorEncoder",
                "function:makeCreateOrderHandler",
                "function:decodeCreateOrderRequest",
                "function:encodeCreateOrderResponse",
                "function:makeCancelOrderHandler",
                "function:decodeCancelOrderRequest",
                "function:encodeCancelOrderResponse",
            ]
        );
        assert_eq!(set.iter().next().unwrap().method, None);
    }

    #[test]
    fn grpc_includes_server_method() {
        let set = Deriver::default().transport(&methods(&["Ping"]), Transport::Grpc);
        assert_eq!(set.len(), 4);
        assert!(set.contains(&SymbolKey::method("*grpcServer", "Ping")));
        assert!(!set.contains(&SymbolKey::variable("defaultCoder")));
    }

    #[test]
    fn schema_symbols() {
        let set = Deriver::default().schema("user", &methods(&["Ping"]));
        assert_eq!(
            names(&set),
            vec!["service:User", "rpc:User.Ping", "message:PingReq", "message:PingRsp"]
        );
    }

    #[test]
    fn duplicate_methods_collapse() {
        let set = Deriver::default().records(&methods(&["Ping", "Ping"]));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_method_list_requires_nothing() {
        assert!(Deriver::default().transport(&[], Transport::Http).is_empty());
        assert!(Deriver::default().routes(&[]).is_empty());
    }
}
