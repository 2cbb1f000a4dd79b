//! Schema import resolution
//!
//! Imports named in `[schema] imports` are fetched by URL and parsed, and
//! their own imports are resolved the same way. Each URL is fetched at most
//! once per resolver. Documents with the same content are expanded once
//! even when reached through different URLs, and nesting stops at
//! `max_import_depth`.

use crate::config::SchemaConfig;
use crate::error::{FetchError, ImportError};
use genkit_artifact::{ContentHash, SchemaDocument, SymbolKey};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Fetches schema text by URL
pub trait SchemaFetcher: Send + Sync + std::fmt::Debug {
    /// Document text at `url`
    ///
    /// # Errors
    /// `FetchError` on transport failure or non-success status
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    /// Fetcher with the given request timeout
    ///
    /// # Errors
    /// `FetchError::Http` if the client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("genkit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl SchemaFetcher for ReqwestFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let http = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().map_err(http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(http)
    }
}

/// Fetcher answering from a fixed URL -> text map
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    documents: BTreeMap<String, String>,
}

impl MemoryFetcher {
    /// Empty fetcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document
    #[must_use]
    pub fn with_document(mut self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(url.into(), text.into());
        self
    }
}

impl SchemaFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Unknown(url.to_string()))
    }
}

/// Documents reached from one schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedImports {
    /// `(url, document)` in resolution order
    pub documents: Vec<(String, SchemaDocument)>,
}

impl ResolvedImports {
    /// Message symbols declared by resolved documents
    #[must_use]
    pub fn messages(&self) -> Vec<SymbolKey> {
        self.documents
            .iter()
            .flat_map(|(_, doc)| doc.messages().map(|m| SymbolKey::message(m.name.clone())))
            .collect()
    }

    /// Whether nothing was resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Resolves configured schema imports
#[derive(Debug)]
pub struct SchemaImportResolver<'f> {
    imports: IndexMap<String, String>,
    max_depth: usize,
    fetcher: &'f dyn SchemaFetcher,
    resolved_urls: HashSet<String>,
    visited: HashSet<ContentHash>,
}

impl<'f> SchemaImportResolver<'f> {
    /// Resolver for the `[schema]` section
    #[must_use]
    pub fn new(config: &SchemaConfig, fetcher: &'f dyn SchemaFetcher) -> Self {
        Self {
            imports: config.imports.clone(),
            max_depth: config.max_import_depth,
            fetcher,
            resolved_urls: HashSet::new(),
            visited: HashSet::new(),
        }
    }

    /// Resolve every configured import `doc` reaches
    ///
    /// # Errors
    /// `ImportError::Fetch` or `ImportError::Parse` for the first failing URL
    pub fn resolve(&mut self, doc: &SchemaDocument) -> Result<ResolvedImports, ImportError> {
        let mut out = ResolvedImports::default();
        self.resolve_into(doc, 1, &mut out)?;
        Ok(out)
    }

    fn resolve_into(&mut self, doc: &SchemaDocument, depth: usize, out: &mut ResolvedImports) -> Result<(), ImportError> {
        let pending: Vec<String> = doc
            .imports()
            .filter_map(|name| self.imports.get(name))
            .filter(|url| !self.resolved_urls.contains(*url))
            .cloned()
            .collect();

        for url in pending {
            if depth > self.max_depth {
                tracing::warn!(%url, max_depth = self.max_depth, "schema import depth exceeded, not resolving");
                continue;
            }
            if !self.resolved_urls.insert(url.clone()) {
                continue;
            }

            let text = self.fetcher.fetch(&url)?;
            let hash = ContentHash::compute(text.as_bytes());
            if !self.visited.insert(hash) {
                tracing::debug!(%url, hash = %hash.short(), "schema import already resolved under another url");
                continue;
            }

            let imported = SchemaDocument::parse(&text).map_err(|source| ImportError::Parse {
                url: url.clone(),
                source,
            })?;
            tracing::debug!(%url, depth, messages = imported.messages().count(), "schema import resolved");

            self.resolve_into(&imported, depth + 1, out)?;
            out.documents.push((url, imported));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)], depth: usize) -> SchemaConfig {
        SchemaConfig {
            max_import_depth: depth,
            imports: pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
        }
    }

    fn doc(text: &str) -> SchemaDocument {
        SchemaDocument::parse(text).unwrap()
    }

    #[test]
    fn unconfigured_imports_are_ignored() {
        let fetcher = MemoryFetcher::new();
        let mut resolver = SchemaImportResolver::new(&config(&[], 8), &fetcher);
        let resolved = resolver.resolve(&doc("syntax = \"proto3\";\nimport \"google/x.proto\";\n")).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn nested_imports_are_resolved_depth_first() {
        let fetcher = MemoryFetcher::new()
            .with_document("u:a", "syntax = \"proto3\";\nimport \"b.proto\";\nmessage A {}\n")
            .with_document("u:b", "syntax = \"proto3\";\nmessage B {}\n");
        let cfg = config(&[("a.proto", "u:a"), ("b.proto", "u:b")], 8);
        let mut resolver = SchemaImportResolver::new(&cfg, &fetcher);

        let resolved = resolver.resolve(&doc("import \"a.proto\";\n")).unwrap();
        let urls: Vec<_> = resolved.documents.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(urls, ["u:b", "u:a"]);
        assert_eq!(resolved.messages(), vec![SymbolKey::message("B"), SymbolKey::message("A")]);
    }

    #[test]
    fn url_cycles_terminate() {
        let fetcher = MemoryFetcher::new()
            .with_document("u:a", "import \"b.proto\";\nmessage A {}\n")
            .with_document("u:b", "import \"a.proto\";\nmessage B {}\n");
        let cfg = config(&[("a.proto", "u:a"), ("b.proto", "u:b")], 8);
        let mut resolver = SchemaImportResolver::new(&cfg, &fetcher);
        assert_eq!(resolver.resolve(&doc("import \"a.proto\";\n")).unwrap().documents.len(), 2);
    }

    #[test]
    fn depth_cap_bounds_distinct_chains() {
        let mut fetcher = MemoryFetcher::new();
        let mut pairs = Vec::new();
        for i in 0..6 {
            fetcher = fetcher.with_document(format!("u:{i}"), format!("import \"{}.proto\";\nmessage M{i} {{}}\n", i + 1));
            pairs.push((format!("{i}.proto"), format!("u:{i}")));
        }
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let cfg = config(&pairs, 3);
        let mut resolver = SchemaImportResolver::new(&cfg, &fetcher);
        assert_eq!(resolver.resolve(&doc("import \"0.proto\";\n")).unwrap().documents.len(), 3);
    }

    #[test]
    fn identical_content_under_two_urls_is_expanded_once() {
        let text = "message Shared {}\n";
        let fetcher = MemoryFetcher::new().with_document("u:1", text).with_document("u:2", text);
        let cfg = config(&[("x.proto", "u:1"), ("y.proto", "u:2")], 8);
        let mut resolver = SchemaImportResolver::new(&cfg, &fetcher);
        let resolved = resolver.resolve(&doc("import \"x.proto\";\nimport \"y.proto\";\n")).unwrap();
        assert_eq!(resolved.documents.len(), 1);
    }

    #[test]
    fn unparseable_import_names_the_url() {
        let fetcher = MemoryFetcher::new().with_document("u:bad", "message {");
        let cfg = config(&[("bad.proto", "u:bad")], 8);
        let mut resolver = SchemaImportResolver::new(&cfg, &fetcher);
        let err = resolver.resolve(&doc("import \"bad.proto\";\n")).unwrap_err();
        assert!(matches!(err, ImportError::Parse { ref url, .. } if url == "u:bad"));
    }
}
