//! Artifact stages
//!
//! Each stage reads one artifact, merges the required symbols for it,
//! normalizes and commits the result, and records an [`ArtifactOutcome`].
//! Base files are regenerated whole instead of merged.

use crate::error::GenerateError;
use crate::pipeline::{Generator, ServiceContext};
use crate::types::{ArtifactOutcome, GenerationReport};
use genkit_artifact::{ContentHash, GoParser, SchemaDocument, SymbolKey};
use genkit_composition::ast::Decl;
use genkit_composition::templates::{grpc, http};
use genkit_composition::{GoRenderer, MergeEngine, MergeError, GENERATED_HEADER};
use genkit_layer::{
    ArtifactWriter, ImportError, Normalizer, ReqwestFetcher, SchemaFetcher, SchemaImportResolver, SchemaNormalizer, ScriptFlavor,
    WriteStatus,
};
use genkit_symbol::{RequiredSymbolSet, Transport};
use std::path::Path;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Go package of a file: its directory name
fn package_of(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Generator<'_> {
    fn commit(&self, path: &Path, text: &str, normalizer: &dyn Normalizer) -> Result<WriteStatus, GenerateError> {
        ArtifactWriter::new(self.store)
            .commit(path, text, normalizer)
            .map_err(|e| GenerateError::write(path, e))
    }

    /// Commit text merged from a read that hashed to `read`
    pub(crate) fn commit_over(
        &self,
        path: &Path,
        text: &str,
        normalizer: &dyn Normalizer,
        read: ContentHash,
    ) -> Result<WriteStatus, GenerateError> {
        ArtifactWriter::new(self.store)
            .commit_over(path, text, normalizer, read)
            .map_err(|e| GenerateError::write(path, e))
    }

    fn log_outcome(&self, outcome: &ArtifactOutcome) {
        let path = self.resolver.relative(&outcome.path).display().to_string();
        if outcome.written {
            tracing::info!(%path, synthesized = outcome.synthesized.len(), status = ?outcome.status, "artifact written");
        } else {
            tracing::debug!(%path, "artifact up to date");
        }
    }

    fn push(&self, report: &mut GenerationReport, outcome: ArtifactOutcome) {
        self.log_outcome(&outcome);
        report.artifacts.push(outcome);
    }

    /// Merge `required` into the Go artifact at `path`
    fn merge_go_artifact(
        &self,
        ctx: &ServiceContext,
        path: &Path,
        required: &RequiredSymbolSet,
        report: &mut GenerationReport,
    ) -> Result<String, GenerateError> {
        let existing = self.store.read_optional(path)?.unwrap_or_default();
        let read = ContentHash::compute(existing.as_bytes());
        let outcome = MergeEngine::new(&ctx.synth)
            .merge_go(&existing, &package_of(path), required)
            .map_err(|e| GenerateError::merge(path, e))?;

        let status = self.commit_over(path, &outcome.text, self.go.as_ref(), read)?;
        let text = outcome.text.clone();
        self.push(report, ArtifactOutcome::from_merge(path.to_path_buf(), &outcome, status));
        Ok(text)
    }

    /// Regenerate a whole Go file from declarations
    fn write_base(&self, path: &Path, decls: &[Decl], report: &mut GenerationReport) -> Result<(), GenerateError> {
        let first = !self.store.exists(path)?;
        let text = GoRenderer::new().file(&package_of(path), Some(GENERATED_HEADER), decls);
        let status = self.commit(path, &text, self.go.as_ref())?;
        self.push(report, ArtifactOutcome::whole(path.to_path_buf(), status, first));
        Ok(())
    }

    /// Message symbols declared by configured imports of `doc`
    fn resolve_imports(&self, doc: &SchemaDocument) -> Result<Vec<SymbolKey>, GenerateError> {
        if self.config.schema.imports.is_empty() || doc.imports().next().is_none() {
            return Ok(Vec::new());
        }
        let owned;
        let fetcher: &dyn SchemaFetcher = match self.fetcher {
            Some(f) => f,
            None => {
                owned = ReqwestFetcher::new(FETCH_TIMEOUT).map_err(ImportError::from)?;
                &owned
            }
        };
        let resolved = SchemaImportResolver::new(&self.config.schema, fetcher).resolve(doc)?;
        tracing::debug!(documents = resolved.documents.len(), "schema imports resolved");
        Ok(resolved.messages())
    }

    /// Schema document, compile step and compile script
    pub(crate) fn schema_stage(&self, ctx: &ServiceContext, report: &mut GenerationReport) -> Result<(), GenerateError> {
        let path = &ctx.paths.schema_file;
        let current = self.store.read_optional(path)?;
        let read = ContentHash::compute(current.as_deref().unwrap_or_default().as_bytes());
        let existing = match current {
            Some(text) => Some(SchemaDocument::parse(&text).map_err(|source| GenerateError::ArtifactCorrupt {
                path: path.clone(),
                source,
            })?),
            None => None,
        };
        let resolved = match &existing {
            Some(doc) => self.resolve_imports(doc)?,
            None => Vec::new(),
        };

        let required = self.deriver.schema(&ctx.service, ctx.kept());
        let outcome = MergeEngine::new(&ctx.synth)
            .merge_schema(existing, &self.config.naming.schema_package, &resolved, &required)
            .map_err(|e| GenerateError::merge(path, e))?;
        if !outcome.still_missing.is_empty() {
            tracing::warn!(missing = outcome.still_missing.len(), "schema symbols missing after merge");
        }

        let status = self.commit_over(path, &outcome.text, &SchemaNormalizer::new(), read)?;
        self.push(report, ArtifactOutcome::from_schema(path.clone(), &outcome, status));

        let relative = path.strip_prefix(&self.cwd).unwrap_or(path);
        self.toolchain.compile_schema(&self.cwd, relative)?;

        let script = &ctx.paths.compile_script;
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let status = ArtifactWriter::new(self.store)
            .create_once(script, &self.toolchain.compile_script(&file_name, ScriptFlavor::host()))
            .map_err(|e| GenerateError::write(script, e))?;
        self.push(
            report,
            ArtifactOutcome::whole(script.clone(), status, status == WriteStatus::Created),
        );
        Ok(())
    }

    /// Go request/response records next to the schema
    pub(crate) fn records_stage(&self, ctx: &ServiceContext, report: &mut GenerationReport) -> Result<(), GenerateError> {
        let required = self.deriver.records(ctx.kept());
        self.merge_go_artifact(ctx, &ctx.paths.records_file, &required, report)?;
        Ok(())
    }

    /// Transport handlers; returns admitted methods whose handler now exists
    pub(crate) fn handlers_stage(
        &self,
        ctx: &ServiceContext,
        transport: Transport,
        report: &mut GenerationReport,
    ) -> Result<Vec<String>, GenerateError> {
        let path = match transport {
            Transport::Http => &ctx.paths.http_file,
            Transport::Grpc => &ctx.paths.grpc_file,
        };
        let required = self.deriver.transport(ctx.kept(), transport);
        let text = self.merge_go_artifact(ctx, path, &required, report)?;

        let model = GoParser::new()
            .parse(&text)
            .map_err(|e| GenerateError::merge(path, MergeError::Candidate(e)))?;
        let naming = &self.config.naming;
        let mounted: Vec<String> = ctx
            .admitted_names()
            .into_iter()
            .filter(|m| model.contains(&SymbolKey::function(naming.handler(m))))
            .collect();
        tracing::debug!(?mounted, "handlers present");
        Ok(mounted)
    }

    /// `NewHTTPHandler`, regenerated whole
    pub(crate) fn http_base_stage(
        &self,
        ctx: &ServiceContext,
        mounted: &[String],
        report: &mut GenerationReport,
    ) -> Result<(), GenerateError> {
        let decls = vec![Decl::from(http::base_handler(&ctx.synth, mounted))];
        self.write_base(&ctx.paths.http_base_file, &decls, report)
    }

    /// `grpcServer` and `NewGRPCServer`, regenerated whole
    pub(crate) fn grpc_base_stage(
        &self,
        ctx: &ServiceContext,
        mounted: &[String],
        report: &mut GenerationReport,
    ) -> Result<(), GenerateError> {
        let decls = grpc::base(&ctx.synth, &ctx.admitted_names(), mounted);
        self.write_base(&ctx.paths.grpc_base_file, &decls, report)
    }

    /// Route pattern variables for mounted methods
    pub(crate) fn routes_stage(
        &self,
        ctx: &ServiceContext,
        mounted: &[String],
        report: &mut GenerationReport,
    ) -> Result<(), GenerateError> {
        let methods: Vec<_> = ctx
            .outcome
            .admitted
            .iter()
            .filter(|m| mounted.contains(&m.name))
            .cloned()
            .collect();
        let required = self.deriver.routes(&methods);
        self.merge_go_artifact(ctx, &ctx.paths.routes_file, &required, report)?;
        Ok(())
    }
}
