//! proto3 schema documents
//!
//! A [`SchemaDocument`] is an ordered list of top-level [`Element`]s. The
//! parts generation cares about (syntax, package, imports, services with
//! their rpc entries, messages) are typed; everything else (enums, extend
//! blocks, message bodies) is kept as generic token statements and blocks so
//! that the formatter can re-emit it without loss.
//!
//! Comments directly above an element are attached to it; a comment on the
//! same line after a statement is kept as that statement's inline comment.

mod format;
mod lexer;
mod parser;

pub use format::SchemaFormatter;
pub use parser::SchemaParser;

use crate::hash::ContentHash;
use crate::model::{ArtifactKind, ArtifactModel, ImportSpec, SymbolKey};

/// A `;`-terminated statement kept as tokens
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
    /// Leading comment lines
    pub comments: Vec<String>,
    /// Tokens without the terminating `;`
    pub tokens: Vec<String>,
    /// Trailing same-line comment
    pub inline: Option<String>,
}

/// A `header { items }` block kept generically
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    /// Leading comment lines
    pub comments: Vec<String>,
    /// Tokens before `{` (`message Foo`, `oneof kind`, `enum E`)
    pub header: Vec<String>,
    /// Body items in order
    pub items: Vec<Item>,
    /// Trailing same-line comment after `}`
    pub inline: Option<String>,
}

/// Body item of a generic block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Field, option, reserved range, enum value...
    Statement(Statement),
    /// Nested message, enum, oneof...
    Block(Block),
    /// Comment lines not followed by anything before `}`
    Comment(Vec<String>),
}

/// `rpc Name (Req) returns (Rsp)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rpc {
    /// Leading comment lines
    pub comments: Vec<String>,
    /// Entry name
    pub name: String,
    /// Request message type
    pub request: String,
    /// Client streaming
    pub request_stream: bool,
    /// Response message type
    pub response: String,
    /// Server streaming
    pub response_stream: bool,
    /// Option body; `None` renders the `;` form
    pub body: Option<Vec<Item>>,
    /// Trailing same-line comment
    pub inline: Option<String>,
}

impl Rpc {
    /// Unary rpc without options
    #[must_use]
    pub fn new(name: impl Into<String>, request: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            comments: Vec::new(),
            name: name.into(),
            request: request.into(),
            request_stream: false,
            response: response.into(),
            response_stream: false,
            body: None,
            inline: None,
        }
    }
}

/// Body item of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceItem {
    /// rpc entry
    Rpc(Rpc),
    /// option statement or stray comment
    Other(Item),
}

/// `service Name { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Leading comment lines
    pub comments: Vec<String>,
    /// Service name
    pub name: String,
    /// Body items in order
    pub items: Vec<ServiceItem>,
}

impl Service {
    /// Empty service
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            comments: Vec::new(),
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Attach leading comment lines (without `//`)
    #[must_use]
    pub fn with_comment(mut self, line: &str) -> Self {
        self.comments.push(format!("// {line}"));
        self
    }

    /// rpc entries in order
    pub fn rpcs(&self) -> impl Iterator<Item = &Rpc> {
        self.items.iter().filter_map(|i| match i {
            ServiceItem::Rpc(rpc) => Some(rpc),
            ServiceItem::Other(_) => None,
        })
    }

    /// Whether an rpc with this name exists
    #[must_use]
    pub fn has_rpc(&self, name: &str) -> bool {
        self.rpcs().any(|r| r.name == name)
    }

    /// Append an rpc entry
    pub fn push_rpc(&mut self, rpc: Rpc) {
        self.items.push(ServiceItem::Rpc(rpc));
    }
}

/// `message Name { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Leading comment lines
    pub comments: Vec<String>,
    /// Message name
    pub name: String,
    /// Body items
    pub items: Vec<Item>,
}

impl Message {
    /// Empty message
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            comments: Vec::new(),
            name: name.into(),
            items: Vec::new(),
        }
    }
}

/// Top-level schema element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// `syntax = "proto3";`
    Syntax {
        /// Leading comment lines
        comments: Vec<String>,
        /// Version string without quotes
        value: String,
    },
    /// `package name;`
    Package {
        /// Leading comment lines
        comments: Vec<String>,
        /// Package name
        name: String,
    },
    /// `import [public|weak] "path";`
    Import {
        /// Leading comment lines
        comments: Vec<String>,
        /// `public` or `weak`
        modifier: Option<String>,
        /// Imported file without quotes
        path: String,
    },
    /// `option ...;`
    Option(Statement),
    /// `service`
    Service(Service),
    /// `message`
    Message(Message),
    /// `enum`, `extend` and other blocks
    Other(Block),
    /// Trailing comment lines at end of file
    Comment(Vec<String>),
}

/// A parsed proto3 document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDocument {
    /// Top-level elements in source order
    pub elements: Vec<Element>,
}

impl SchemaDocument {
    /// Empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse proto3 text
    ///
    /// # Errors
    /// Returns `ParseError` on malformed input
    pub fn parse(text: &str) -> Result<Self, crate::ParseError> {
        SchemaParser::new().parse(text)
    }

    /// Declared package name
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.elements.iter().find_map(|e| match e {
            Element::Package { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Imported file paths in order
    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Import { path, .. } => Some(path.as_str()),
            _ => None,
        })
    }

    /// Top-level service by name
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.elements.iter().find_map(|e| match e {
            Element::Service(s) if s.name == name => Some(s),
            _ => None,
        })
    }

    /// Mutable top-level service by name
    pub fn service_mut(&mut self, name: &str) -> Option<&mut Service> {
        self.elements.iter_mut().find_map(|e| match e {
            Element::Service(s) if s.name == name => Some(s),
            _ => None,
        })
    }

    /// Top-level messages in order
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.elements.iter().filter_map(|e| match e {
            Element::Message(m) => Some(m),
            _ => None,
        })
    }

    /// Append an element
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Index the document's top-level declarations
    ///
    /// Services, their rpc entries (scoped by service) and messages become
    /// symbols; imports become references.
    #[must_use]
    pub fn model(&self) -> ArtifactModel {
        let mut model = ArtifactModel::new(ArtifactKind::Schema);
        model.set_source_hash(ContentHash::compute(SchemaFormatter::new().format(self).as_bytes()));
        for element in &self.elements {
            match element {
                Element::Package { name, .. } => model.set_package(name.clone(), 0),
                Element::Import { path, .. } => model.add_import(ImportSpec::new(path.clone())),
                Element::Service(service) => {
                    model.insert(SymbolKey::service(service.name.clone()));
                    for rpc in service.rpcs() {
                        model.insert(SymbolKey::rpc(&service.name, &rpc.name));
                    }
                }
                Element::Message(message) => {
                    model.insert(SymbolKey::message(message.name.clone()));
                }
                _ => {}
            }
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_indexes_services_rpcs_and_messages() {
        let mut doc = SchemaDocument::new();
        let mut svc = Service::new("User");
        svc.push_rpc(Rpc::new("Ping", "PingReq", "PingRsp"));
        doc.push(Element::Package {
            comments: vec![],
            name: "pb".into(),
        });
        doc.push(Element::Service(svc));
        doc.push(Element::Message(Message::new("PingReq")));

        let model = doc.model();
        assert_eq!(model.package(), Some("pb"));
        assert!(model.contains(&SymbolKey::service("User")));
        assert!(model.contains(&SymbolKey::rpc("User", "Ping")));
        assert!(model.contains(&SymbolKey::message("PingReq")));
        assert!(!model.contains(&SymbolKey::message("PingRsp")));
    }

    #[test]
    fn service_lookup_and_rpc_membership() {
        let mut doc = SchemaDocument::new();
        doc.push(Element::Service(Service::new("Order")));
        doc.service_mut("Order")
            .unwrap()
            .push_rpc(Rpc::new("Cancel", "CancelReq", "CancelRsp"));

        assert!(doc.service("Order").unwrap().has_rpc("Cancel"));
        assert!(doc.service("Missing").is_none());
    }
}
