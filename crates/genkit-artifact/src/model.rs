//! Artifact symbol model
//!
//! [`ArtifactModel`] is the parsed state of one artifact: the names it
//! declares, grouped by [`SymbolKind`], plus the import/reference list and
//! the locations the import reconciler needs to insert new references.
//! Membership tests are O(1) and iteration follows declaration order.

use crate::hash::ContentHash;
use crate::service::ServiceInterface;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::ops::Range;

/// Artifact grammar family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Go source file
    Source,
    /// proto3 interface definition
    Schema,
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Schema => write!(f, "schema"),
        }
    }
}

/// Declaration kinds tracked by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Free function
    Function,
    /// Function bound to a receiver; keyed as `receiver.name`
    Method,
    /// Package-level `var` or `const`
    Variable,
    /// Named type (struct or otherwise)
    Record,
    /// Named interface type
    Interface,
    /// Schema `service` declaration
    Service,
    /// Schema `rpc` entry; keyed as `service.rpc`
    RpcEntry,
    /// Schema `message` declaration
    Message,
}

impl Display for SymbolKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Variable => "variable",
            Self::Record => "record",
            Self::Interface => "interface",
            Self::Service => "service",
            Self::RpcEntry => "rpc",
            Self::Message => "message",
        };
        write!(f, "{name}")
    }
}

/// Kind-qualified symbol name; the unit of membership tests
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolKey {
    /// Declaration kind
    pub kind: SymbolKind,
    /// Name within the kind's namespace
    pub name: String,
}

impl SymbolKey {
    /// Create a key
    #[inline]
    #[must_use]
    pub fn new(kind: SymbolKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Free function key
    #[inline]
    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Function, name)
    }

    /// Receiver-bound method key
    #[inline]
    #[must_use]
    pub fn method(receiver: &str, name: &str) -> Self {
        Self::new(SymbolKind::Method, format!("{receiver}.{name}"))
    }

    /// Package-level variable key
    #[inline]
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Variable, name)
    }

    /// Named type key
    #[inline]
    #[must_use]
    pub fn record(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Record, name)
    }

    /// Schema service key
    #[inline]
    #[must_use]
    pub fn service(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Service, name)
    }

    /// Schema rpc key, scoped by its service
    #[inline]
    #[must_use]
    pub fn rpc(service: &str, rpc: &str) -> Self {
        Self::new(SymbolKind::RpcEntry, format!("{service}.{rpc}"))
    }

    /// Schema message key
    #[inline]
    #[must_use]
    pub fn message(name: impl Into<String>) -> Self {
        Self::new(SymbolKind::Message, name)
    }
}

impl Display for SymbolKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// One declared import/reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImportSpec {
    /// Explicit alias (`alias "path"`), if any
    pub alias: Option<String>,
    /// Import path without quotes
    pub path: String,
}

impl ImportSpec {
    /// Unaliased import
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            path: path.into(),
        }
    }

    /// Aliased import
    #[inline]
    #[must_use]
    pub fn aliased(alias: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            path: path.into(),
        }
    }

    /// Name the importing file uses to refer to the package
    #[must_use]
    pub fn local_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| guess_package_name(&self.path))
    }

    /// Render as a Go import spec (`alias "path"` or `"path"`)
    #[must_use]
    pub fn to_go(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{alias} \"{}\"", self.path),
            None => format!("\"{}\"", self.path),
        }
    }
}

/// Location of one import declaration in a source artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBlock {
    /// Byte range of the whole declaration
    pub span: Range<usize>,
    /// `import ( ... )` rather than `import "x"`
    pub grouped: bool,
}

/// Parsed symbol-level state of one artifact
///
/// Reconstructed from scratch on every invocation; never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactModel {
    kind: ArtifactKind,
    package: Option<String>,
    #[serde(skip)]
    package_end: usize,
    imports: Vec<ImportSpec>,
    #[serde(skip)]
    import_blocks: Vec<ImportBlock>,
    symbols: IndexSet<SymbolKey>,
    interfaces: IndexMap<String, ServiceInterface>,
    source_hash: ContentHash,
}

impl ArtifactModel {
    /// Empty model
    #[inline]
    #[must_use]
    pub fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            package: None,
            package_end: 0,
            imports: Vec::new(),
            import_blocks: Vec::new(),
            symbols: IndexSet::new(),
            interfaces: IndexMap::new(),
            source_hash: ContentHash::default(),
        }
    }

    /// Grammar family
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Declared package name
    #[inline]
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Byte offset just past the package clause (0 when absent)
    #[inline]
    #[must_use]
    pub fn package_end(&self) -> usize {
        self.package_end
    }

    /// Set the package name and clause end offset
    pub fn set_package(&mut self, name: impl Into<String>, end: usize) {
        self.package = Some(name.into());
        self.package_end = end;
    }

    /// Hash of the text this model was built from
    ///
    /// Go models hash the raw source; schema models hash their canonical
    /// rendering.
    #[inline]
    #[must_use]
    pub fn source_hash(&self) -> ContentHash {
        self.source_hash
    }

    pub(crate) fn set_source_hash(&mut self, hash: ContentHash) {
        self.source_hash = hash;
    }

    /// Record a declaration; returns false if it was already present
    pub fn insert(&mut self, key: SymbolKey) -> bool {
        self.symbols.insert(key)
    }

    /// Exact-name membership within a kind
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.symbols.contains(key)
    }

    /// Names of one kind, in declaration order
    pub fn names(&self, kind: SymbolKind) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .filter(move |k| k.kind == kind)
            .map(|k| k.name.as_str())
    }

    /// All declarations in declaration order
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolKey> {
        self.symbols.iter()
    }

    /// Number of declarations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// No declarations at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Register an interface and its method set
    pub fn add_interface(&mut self, interface: ServiceInterface) {
        self.symbols
            .insert(SymbolKey::new(SymbolKind::Interface, interface.name.clone()));
        self.interfaces.insert(interface.name.clone(), interface);
    }

    /// Look up an interface by name
    #[inline]
    #[must_use]
    pub fn interface(&self, name: &str) -> Option<&ServiceInterface> {
        self.interfaces.get(name)
    }

    /// All interfaces in declaration order
    pub fn interfaces(&self) -> impl Iterator<Item = &ServiceInterface> {
        self.interfaces.values()
    }

    /// Record an import
    pub fn add_import(&mut self, import: ImportSpec) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Declared imports in order
    #[inline]
    #[must_use]
    pub fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    /// Whether a path is imported (under any alias)
    #[must_use]
    pub fn has_import(&self, path: &str) -> bool {
        self.imports.iter().any(|i| i.path == path)
    }

    /// Record the location of an import declaration
    pub fn add_import_block(&mut self, block: ImportBlock) {
        self.import_blocks.push(block);
    }

    /// Import declaration locations in source order
    #[inline]
    #[must_use]
    pub fn import_blocks(&self) -> &[ImportBlock] {
        &self.import_blocks
    }
}

/// Guess the package name Go would bind for an import path
///
/// Uses the last path element, skipping a trailing major-version element
/// (`/v2`) and dropping a `go-` prefix and characters that are not valid in
/// identifiers.
#[must_use]
pub fn guess_package_name(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let mut last = segments.next().unwrap_or(path);
    let is_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].chars().all(|c| c.is_ascii_digit());
    if is_version {
        if let Some(prev) = segments.next() {
            last = prev;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last.split('.').next().unwrap_or(last);
    let cleaned: String = last
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();
    if cleaned.is_empty() {
        "pkg".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_kind_scoped() {
        let mut model = ArtifactModel::new(ArtifactKind::Source);
        model.insert(SymbolKey::function("ErrorEncoder"));

        assert!(model.contains(&SymbolKey::function("ErrorEncoder")));
        assert!(!model.contains(&SymbolKey::variable("ErrorEncoder")));
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut model = ArtifactModel::new(ArtifactKind::Schema);
        assert!(model.insert(SymbolKey::message("PingReq")));
        assert!(!model.insert(SymbolKey::message("PingReq")));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn names_follow_declaration_order() {
        let mut model = ArtifactModel::new(ArtifactKind::Source);
        model.insert(SymbolKey::function("b"));
        model.insert(SymbolKey::variable("v"));
        model.insert(SymbolKey::function("a"));

        let names: Vec<_> = model.names(SymbolKind::Function).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn method_and_rpc_keys_are_scoped() {
        assert_eq!(SymbolKey::method("*grpcServer", "Ping").name, "*grpcServer.Ping");
        assert_eq!(SymbolKey::rpc("User", "Ping").name, "User.Ping");
        assert_eq!(SymbolKey::rpc("User", "Ping").to_string(), "rpc:User.Ping");
    }

    #[test]
    fn package_name_guessing() {
        assert_eq!(guess_package_name("net/http"), "http");
        assert_eq!(guess_package_name("github.com/go-kit/kit/transport/grpc"), "grpc");
        assert_eq!(guess_package_name("github.com/foo/go-bar"), "bar");
        assert_eq!(guess_package_name("github.com/foo/bar/v2"), "bar");
        assert_eq!(guess_package_name("gopkg.in/yaml.v2"), "yaml");
        assert_eq!(guess_package_name("context"), "context");
    }

    #[test]
    fn import_local_name_prefers_alias() {
        assert_eq!(ImportSpec::new("net/http").local_name(), "http");
        assert_eq!(
            ImportSpec::aliased("http1", "github.com/go-kit/kit/transport/http").local_name(),
            "http1"
        );
        assert_eq!(ImportSpec::aliased("h", "net/http").to_go(), "h \"net/http\"");
    }

    #[test]
    fn add_import_deduplicates() {
        let mut model = ArtifactModel::new(ArtifactKind::Source);
        model.add_import(ImportSpec::new("context"));
        model.add_import(ImportSpec::new("context"));
        assert_eq!(model.imports().len(), 1);
        assert!(model.has_import("context"));
    }
}
