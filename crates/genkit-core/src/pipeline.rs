//! Per-service generation pipeline
//!
//! # Workflow
//! 1. Validate the transport kind (before anything is read)
//! 2. Load the service declaration and find its interface
//! 3. Filter methods; fail if none is left
//! 4. Optionally persist legacy signature rewrites
//! 5. Run the artifact stages in order: schema, pb records, transport
//!    handlers, transport base, route patterns
//!
//! A failing stage aborts the run. Artifacts committed by earlier stages
//! stay written.

use crate::error::GenerateError;
use crate::types::{ArtifactOutcome, GenerateRequest, GenerationReport};
use genkit_artifact::{GoParser, ServiceMethod};
use genkit_composition::TemplateSynthesizer;
use genkit_layer::{
    go_normalizer, ArtifactStore, GenkitConfig, GoNormalizer, Normalizer, PathResolver, SchemaFetcher,
    ServicePaths, Toolchain,
};
use genkit_symbol::{apply_rewrites, Deriver, FilterOutcome, MethodPolicy, PolicyError, Transport};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Everything the stages need about one service
#[derive(Debug)]
pub(crate) struct ServiceContext {
    pub(crate) service: String,
    pub(crate) paths: ServicePaths,
    pub(crate) synth: TemplateSynthesizer,
    pub(crate) outcome: FilterOutcome,
}

impl ServiceContext {
    pub(crate) fn admitted_names(&self) -> Vec<String> {
        self.outcome.admitted.iter().map(|m| m.name.clone()).collect()
    }

    pub(crate) fn kept(&self) -> &[ServiceMethod] {
        &self.outcome.kept
    }
}

/// Runs generation for services of one project
pub struct Generator<'a> {
    pub(crate) config: GenkitConfig,
    pub(crate) resolver: PathResolver,
    pub(crate) store: &'a dyn ArtifactStore,
    pub(crate) fetcher: Option<&'a dyn SchemaFetcher>,
    pub(crate) toolchain: Toolchain,
    pub(crate) go: Box<dyn Normalizer>,
    pub(crate) deriver: Deriver,
    pub(crate) cwd: PathBuf,
}

impl std::fmt::Debug for Generator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("root", &self.resolver.root())
            .field("import_path", &self.resolver.import_path())
            .field("toolchain_disabled", &self.toolchain.is_disabled())
            .finish_non_exhaustive()
    }
}

impl<'a> Generator<'a> {
    /// Generator over an already resolved project
    ///
    /// External toolchains run from the project root unless
    /// [`Self::with_working_dir`] says otherwise.
    #[must_use]
    pub fn new(config: GenkitConfig, resolver: PathResolver, store: &'a dyn ArtifactStore) -> Self {
        let testing = config.project.testing;
        let go: Box<dyn Normalizer> = if testing {
            Box::new(GoNormalizer::new())
        } else {
            go_normalizer(&config.toolchain)
        };
        Self {
            toolchain: Toolchain::new(config.toolchain.clone(), testing),
            deriver: Deriver::new(config.naming.clone()),
            cwd: resolver.root().to_path_buf(),
            config,
            resolver,
            store,
            fetcher: None,
            go,
        }
    }

    /// Generator for the project containing `cwd`
    ///
    /// # Errors
    /// `GenerateError::ReferenceResolution` if the project import path
    /// cannot be determined
    pub fn for_project(
        config: GenkitConfig,
        cwd: &Path,
        env_gopath: Option<&str>,
        home: Option<&Path>,
        store: &'a dyn ArtifactStore,
    ) -> Result<Self, GenerateError> {
        let resolver = PathResolver::new(&config, cwd, env_gopath, home)?;
        Ok(Self::new(config, resolver, store).with_working_dir(cwd))
    }

    /// Directory external toolchains run in
    #[must_use]
    pub fn with_working_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Fetcher for configured schema imports; a blocking HTTP client otherwise
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: &'a dyn SchemaFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Skip the schema compiler (dry runs)
    #[must_use]
    pub fn without_toolchain(mut self) -> Self {
        self.toolchain = Toolchain::new(self.config.toolchain.clone(), true);
        self
    }

    /// Path resolver in use
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Artifact paths for `service`
    #[must_use]
    pub fn service_paths(&self, service: &str) -> ServicePaths {
        let dir = self.config.naming.service_dir(service);
        self.resolver.service_paths(service, &dir)
    }

    /// Generate a transport for a service
    ///
    /// # Errors
    /// Any [`GenerateError`]; the transport kind is checked before any
    /// artifact is read
    #[instrument(name = "generator.add_transport", skip(self, request), fields(service = %request.service, transport = %request.transport))]
    pub fn add_transport(&self, request: &GenerateRequest) -> Result<GenerationReport, GenerateError> {
        let transport: Transport = request.transport.parse().map_err(|e| match e {
            PolicyError::UnsupportedTransport(kind) => GenerateError::UnsupportedConfiguration(kind),
            PolicyError::NoSuitableMethods { service } => GenerateError::NoSuitableMethods { service },
        })?;

        let (ctx, mut report) = self.prepare(request)?;
        report.transport = Some(transport);

        self.schema_stage(&ctx, &mut report)?;
        self.records_stage(&ctx, &mut report)?;
        let mounted = self.handlers_stage(&ctx, transport, &mut report)?;
        match transport {
            Transport::Http => {
                self.http_base_stage(&ctx, &mounted, &mut report)?;
                self.routes_stage(&ctx, &mounted, &mut report)?;
            }
            Transport::Grpc => {
                self.grpc_base_stage(&ctx, &mounted, &mut report)?;
                grpc_reminder();
            }
        }

        tracing::info!(written = report.written().count(), "transport generated");
        Ok(report)
    }

    /// Generate only the schema document and pb records for a service
    ///
    /// # Errors
    /// Any [`GenerateError`] except `UnsupportedConfiguration`
    #[instrument(name = "generator.add_schema", skip(self, methods))]
    pub fn add_schema(&self, service: &str, methods: &[String]) -> Result<GenerationReport, GenerateError> {
        let request = GenerateRequest::new(service, "").with_methods(methods.iter().cloned());
        let (ctx, mut report) = self.prepare(&request)?;

        self.schema_stage(&ctx, &mut report)?;
        self.records_stage(&ctx, &mut report)?;

        tracing::info!(written = report.written().count(), "schema generated");
        Ok(report)
    }

    /// Load, filter and optionally rewrite the service declaration
    fn prepare(&self, request: &GenerateRequest) -> Result<(ServiceContext, GenerationReport), GenerateError> {
        let service = request.service.as_str();
        let naming = &self.config.naming;
        let paths = self.service_paths(service);
        let service_file = &paths.service_file;

        let Some(source) = self.store.read_optional(service_file)? else {
            return Err(GenerateError::ServiceNotFound {
                service: service.to_string(),
                path: service_file.clone(),
            });
        };
        let model = GoParser::new()
            .parse(&source)
            .map_err(|source| GenerateError::ArtifactCorrupt {
                path: service_file.clone(),
                source,
            })?;

        let interface_name = naming.interface(service);
        let Some(interface) = model.interface(&interface_name) else {
            return Err(GenerateError::InterfaceNotFound {
                interface: interface_name,
                path: service_file.clone(),
            });
        };

        let outcome = MethodPolicy::new(naming.clone())
            .with_allow_list(request.methods.iter().cloned())
            .filter(&interface.methods);
        outcome.ensure_nonempty(service).map_err(|_| GenerateError::NoSuitableMethods {
            service: service.to_string(),
        })?;
        tracing::debug!(kept = ?outcome.kept_names().collect::<Vec<_>>(), "methods admitted");

        let mut report = GenerationReport {
            service: service.to_string(),
            transport: None,
            kept: outcome.kept_names().map(str::to_string).collect(),
            rejections: outcome.rejections.clone(),
            rewritten: outcome.rewrites.iter().map(|r| r.method.clone()).collect(),
            artifacts: Vec::new(),
        };

        if request.rewrite_service_signatures && !outcome.rewrites.is_empty() {
            let text = apply_rewrites(&source, &outcome.rewrites);
            let status = self.commit_over(service_file, &text, self.go.as_ref(), model.source_hash())?;
            tracing::info!(
                path = %self.resolver.relative(service_file).display(),
                rewrites = outcome.rewrites.len(),
                "service signatures rewritten"
            );
            report.artifacts.push(ArtifactOutcome::whole(service_file.clone(), status, false));
        } else if !outcome.rewrites.is_empty() {
            tracing::debug!(rewrites = outcome.rewrites.len(), "legacy signatures rewritten in memory only");
        }

        let dir = naming.service_dir(service);
        let synth = TemplateSynthesizer::new(service, naming.clone(), self.resolver.references(&dir))
            .gorilla_mux(request.gorilla_mux);

        Ok((
            ServiceContext {
                service: service.to_string(),
                paths,
                synth,
                outcome,
            },
            report,
        ))
    }
}

fn grpc_reminder() {
    tracing::warn!("===============================================================");
    tracing::warn!("The GRPC implementation is not finished you need to update your");
    tracing::warn!(" service proto buffer and run the compile script.");
    tracing::warn!("---------------------------------------------------------------");
    tracing::warn!("You also need to implement the Encoders and Decoders!");
    tracing::warn!("===============================================================");
}
