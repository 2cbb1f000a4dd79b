//! Merge engine: add only what is missing
//!
//! For one artifact and one [`RequiredSymbolSet`], the engine tests every
//! required symbol against the parsed artifact and synthesizes fragments
//! for the absent ones. Existing declarations are never modified: Go
//! fragments are appended after the existing text and schema fragments are
//! appended to the document (rpc entries to their service).
//!
//! Merging is monotone and idempotent. A second merge with the same set
//! finds every symbol present and leaves the text unchanged.

use crate::ast::Decl;
use crate::error::{MergeError, SynthesisError};
use crate::fragment::{Fragment, FragmentBody, SchemaFragment, Synthesizer};
use crate::reconcile::ImportReconciler;
use crate::render::GoRenderer;
use genkit_artifact::schema::{Element, SchemaDocument, SchemaFormatter};
use genkit_artifact::{ArtifactKind, ArtifactModel, GoParser, ImportSpec, SymbolKey, SymbolKind};
use genkit_symbol::RequiredSymbolSet;
use serde::Serialize;

/// Fragments to add and symbols already satisfied
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergePlan {
    /// Fragments for absent symbols, in required order
    pub fragments: Vec<Fragment>,
    /// Required symbols the artifact already declares
    pub satisfied: Vec<SymbolKey>,
    /// The artifact had no content
    pub first_generation: bool,
}

impl MergePlan {
    /// Keys of the fragments to add
    pub fn added(&self) -> impl Iterator<Item = &SymbolKey> {
        self.fragments.iter().map(|f| &f.symbol)
    }

    /// Nothing to add
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Result of merging into a Go source artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Complete artifact text after the merge
    pub text: String,
    /// Plan that produced it
    pub plan: MergePlan,
    /// Imports inserted into the existing file
    pub imports_added: Vec<ImportSpec>,
    /// Required symbols still absent after re-parsing
    pub still_missing: Vec<SymbolKey>,
}

/// Result of merging into a schema document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaOutcome {
    /// Document after the merge
    pub document: SchemaDocument,
    /// Canonical text of the document
    pub text: String,
    /// Plan that produced it
    pub plan: MergePlan,
    /// Required symbols still absent after re-indexing
    pub still_missing: Vec<SymbolKey>,
}

/// Per-artifact summary for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Symbols added
    pub added: Vec<String>,
    /// Symbols already present
    pub satisfied: Vec<String>,
    /// Imports inserted
    pub imports_added: Vec<String>,
}

impl From<&MergeOutcome> for MergeSummary {
    fn from(o: &MergeOutcome) -> Self {
        Self {
            added: o.plan.added().map(ToString::to_string).collect(),
            satisfied: o.plan.satisfied.iter().map(ToString::to_string).collect(),
            imports_added: o.imports_added.iter().map(ImportSpec::to_go).collect(),
        }
    }
}

impl From<&SchemaOutcome> for MergeSummary {
    fn from(o: &SchemaOutcome) -> Self {
        Self {
            added: o.plan.added().map(ToString::to_string).collect(),
            satisfied: o.plan.satisfied.iter().map(ToString::to_string).collect(),
            imports_added: Vec::new(),
        }
    }
}

/// Symbol-level merge over one synthesizer
pub struct MergeEngine<'s> {
    synth: &'s dyn Synthesizer,
    parser: GoParser,
    reconciler: ImportReconciler,
}

impl std::fmt::Debug for MergeEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeEngine").finish_non_exhaustive()
    }
}

impl<'s> MergeEngine<'s> {
    /// Engine synthesizing with `synth`
    #[must_use]
    pub fn new(synth: &'s dyn Synthesizer) -> Self {
        Self {
            synth,
            parser: GoParser::new(),
            reconciler: ImportReconciler::new(),
        }
    }

    /// Decide which required symbols need fragments
    ///
    /// A symbol is present if `existing` declares it or an earlier fragment
    /// in this pass already provides it. With no existing model every
    /// symbol is synthesized.
    ///
    /// # Errors
    /// Returns `SynthesisError` if a template cannot be filled
    pub fn plan(
        &self,
        existing: Option<&ArtifactModel>,
        required: &RequiredSymbolSet,
    ) -> Result<MergePlan, SynthesisError> {
        let mut plan = MergePlan {
            first_generation: existing.is_none(),
            ..MergePlan::default()
        };
        let mut present = existing.cloned().unwrap_or_else(|| ArtifactModel::new(ArtifactKind::Source));

        for descriptor in required {
            if present.contains(&descriptor.key) {
                plan.satisfied.push(descriptor.key.clone());
                continue;
            }
            let fragment = self.synth.synthesize(descriptor)?;
            tracing::debug!(symbol = %descriptor.key, set = required.name(), "synthesized fragment");
            present.insert(descriptor.key.clone());
            plan.fragments.push(fragment);
        }
        Ok(plan)
    }

    /// Merge required symbols into Go source
    ///
    /// Empty or whitespace-only text counts as a new file in `package`.
    ///
    /// # Errors
    /// - `MergeError::Corrupt` if `existing` does not parse
    /// - `MergeError::Candidate` if the merged text does not parse
    /// - `MergeError::GrammarMismatch` for a schema fragment
    pub fn merge_go(
        &self,
        existing: &str,
        package: &str,
        required: &RequiredSymbolSet,
    ) -> Result<MergeOutcome, MergeError> {
        let model = if existing.trim().is_empty() {
            None
        } else {
            Some(self.parser.parse(existing).map_err(MergeError::Corrupt)?)
        };

        let plan = self.plan(model.as_ref(), required)?;
        let decls = plan
            .fragments
            .iter()
            .map(|f| match &f.body {
                FragmentBody::Go(decl) => Ok(decl.clone()),
                FragmentBody::Schema(_) => Err(MergeError::GrammarMismatch(f.symbol.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (text, imports_added) = match &model {
            None => {
                let text = GoRenderer::new()
                    .declaring(decls.iter().map(Decl::name))
                    .file(package, None, &decls);
                (text, Vec::new())
            }
            Some(_) if plan.is_noop() => (existing.to_string(), Vec::new()),
            Some(model) => {
                let mut renderer = GoRenderer::with_imports(model.imports())
                    .declaring(top_level_names(model).chain(decls.iter().map(Decl::name)));
                let body = renderer.decls(&decls);
                let missing = self.reconciler.missing(model, &renderer.imports().used());
                let mut text = self.reconciler.insert(existing, model, &missing);
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push('\n');
                text.push_str(&body);
                (text, missing)
            }
        };

        let merged = self.parser.parse(&text).map_err(MergeError::Candidate)?;
        let still_missing = required
            .keys()
            .filter(|k| !merged.contains(k))
            .cloned()
            .collect::<Vec<_>>();
        if !still_missing.is_empty() {
            tracing::warn!(missing = still_missing.len(), set = required.name(), "symbols missing after merge");
        }

        Ok(MergeOutcome {
            text,
            plan,
            imports_added,
            still_missing,
        })
    }

    /// Merge required symbols into a schema document
    ///
    /// `resolved` lists symbols declared by imported documents; they count
    /// as present. A missing or empty document gets `syntax` and `package`
    /// elements first.
    ///
    /// # Errors
    /// - `MergeError::MissingService` for an rpc whose service is absent
    /// - `MergeError::GrammarMismatch` for a Go fragment
    pub fn merge_schema(
        &self,
        existing: Option<SchemaDocument>,
        package: &str,
        resolved: &[SymbolKey],
        required: &RequiredSymbolSet,
    ) -> Result<SchemaOutcome, MergeError> {
        let mut document = existing.filter(|d| !d.elements.is_empty());
        let model = if document.is_none() && resolved.is_empty() {
            None
        } else {
            let mut m = document
                .as_ref()
                .map_or_else(|| ArtifactModel::new(ArtifactKind::Schema), SchemaDocument::model);
            for key in resolved {
                m.insert(key.clone());
            }
            Some(m)
        };

        let mut plan = self.plan(model.as_ref(), required)?;
        plan.first_generation = document.is_none();

        let doc = document.get_or_insert_with(|| {
            let mut d = SchemaDocument::new();
            d.push(Element::Syntax {
                comments: Vec::new(),
                value: "proto3".into(),
            });
            d.push(Element::Package {
                comments: Vec::new(),
                name: package.to_string(),
            });
            d
        });

        for fragment in &plan.fragments {
            let FragmentBody::Schema(body) = &fragment.body else {
                return Err(MergeError::GrammarMismatch(fragment.symbol.clone()));
            };
            match body.clone() {
                SchemaFragment::Service(service) => doc.push(Element::Service(service)),
                SchemaFragment::Rpc { service, rpc } => doc
                    .service_mut(&service)
                    .ok_or(MergeError::MissingService(service.clone()))?
                    .push_rpc(rpc),
                SchemaFragment::Message(message) => doc.push(Element::Message(message)),
            }
        }

        let document = document.unwrap_or_default();
        let merged = document.model();
        let still_missing = required
            .keys()
            .filter(|k| !merged.contains(k) && !resolved.contains(k))
            .cloned()
            .collect();
        let text = SchemaFormatter::new().format(&document);

        Ok(SchemaOutcome {
            document,
            text,
            plan,
            still_missing,
        })
    }
}

/// Package-level identifiers a file declares
fn top_level_names(model: &ArtifactModel) -> impl Iterator<Item = &str> {
    model
        .symbols()
        .filter(|k| matches!(k.kind, SymbolKind::Function | SymbolKind::Variable | SymbolKind::Record | SymbolKind::Interface))
        .map(|k| k.name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::test_synth;
    use genkit_artifact::ServiceMethod;
    use genkit_symbol::{Deriver, Transport};
    use pretty_assertions::assert_eq;

    fn methods(names: &[&str]) -> Vec<ServiceMethod> {
        names.iter().map(|n| ServiceMethod::new(*n)).collect()
    }

    #[test]
    fn first_generation_renders_whole_file() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let required = Deriver::default().routes(&methods(&["Ping"]));
        let out = engine.merge_go("", "conf", &required).unwrap();
        assert_eq!(out.text, "package conf\n\nvar PingReqPattern = \"/ping\"\n");
        assert!(out.plan.first_generation);
        assert!(out.still_missing.is_empty());
    }

    #[test]
    fn appends_only_missing_and_keeps_existing_text() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let existing = "package conf\n\n// hand written\nvar PingReqPattern = \"/custom\"\n";
        let required = Deriver::default().routes(&methods(&["Ping", "Pong"]));
        let out = engine.merge_go(existing, "conf", &required).unwrap();
        assert_eq!(
            out.text,
            "package conf\n\n// hand written\nvar PingReqPattern = \"/custom\"\n\nvar PongReqPattern = \"/pong\"\n"
        );
        assert_eq!(out.plan.satisfied, vec![SymbolKey::variable("PingReqPattern")]);
    }

    #[test]
    fn second_merge_is_a_noop() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let required = Deriver::default().transport(&methods(&["Ping"]), Transport::Http);
        let first = engine.merge_go("", "http", &required).unwrap();
        let second = engine.merge_go(&first.text, "http", &required).unwrap();
        assert!(second.plan.is_noop());
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn appended_fragments_bring_their_imports() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let existing = "package http\n\nimport \"context\"\n\nfunc keep(ctx context.Context) {}\n";
        let required = Deriver::default().transport(&methods(&["Ping"]), Transport::Http);
        let out = engine.merge_go(existing, "http", &required).unwrap();
        let paths: Vec<_> = out.imports_added.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"net/http"));
        assert!(!paths.contains(&"context"));
        assert!(out.text.starts_with("package http\n\nimport \"context\"\nimport "));
        assert!(out.still_missing.is_empty());
    }

    #[test]
    fn import_names_avoid_declared_identifiers() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let existing = "package http\n\nvar conf = \"local\"\n";
        let required = Deriver::default().transport(&methods(&["Ping"]), Transport::Http);
        let out = engine.merge_go(existing, "http", &required).unwrap();
        assert!(out.text.contains("var conf = \"local\"\n"));
        assert!(out.text.contains("conf1.PingReqPattern"));
        assert!(out.imports_added.iter().any(|i| i.local_name() == "conf1"));
        assert!(out.imports_added.iter().any(|i| i.path == "net/http" && i.local_name() == "http"));
    }

    #[test]
    fn corrupt_existing_is_rejected() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let required = Deriver::default().routes(&methods(&["Ping"]));
        let err = engine.merge_go("package conf\nfunc (", "conf", &required).unwrap_err();
        assert!(matches!(err, MergeError::Corrupt(_)));
    }

    #[test]
    fn schema_first_generation_injects_header() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let required = Deriver::default().schema("user", &methods(&["Ping"]));
        let out = engine.merge_schema(None, "pb", &[], &required).unwrap();
        assert_eq!(
            out.text,
            "syntax = \"proto3\";\n\npackage pb;\n\n// The User service definition.\nservice User {\n  rpc Ping (PingReq) returns (PingRsp);\n}\n\nmessage PingReq {}\n\nmessage PingRsp {}\n"
        );
    }

    #[test]
    fn schema_resolved_messages_are_not_redeclared() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let required = Deriver::default().schema("user", &methods(&["Ping"]));
        let out = engine
            .merge_schema(None, "pb", &[SymbolKey::message("PingReq")], &required)
            .unwrap();
        assert_eq!(out.document.messages().count(), 1);
        assert!(out.still_missing.is_empty());
    }

    #[test]
    fn rpc_without_service_fails() {
        let synth = test_synth();
        let engine = MergeEngine::new(&synth);
        let mut required = RequiredSymbolSet::new("schema");
        required.push(SymbolKey::rpc("User", "Ping"), genkit_symbol::TemplateId::RpcEntry, Some("Ping"));
        let doc = SchemaDocument::parse("syntax = \"proto3\";\n").unwrap();
        let err = engine.merge_schema(Some(doc), "pb", &[], &required).unwrap_err();
        assert_eq!(err, MergeError::MissingService("User".into()));
    }
}
