//! Artifact paths and Go import paths
//!
//! The project root is the working directory, plus `project.folder` when
//! set. Its import path is the root relative to the first GOPATH entry
//! whose `src` directory contains it, unless configured explicitly.

use crate::config::{GenkitConfig, PathsConfig};
use crate::error::ResolveError;
use genkit_composition::ReferencePaths;
use genkit_symbol::naming::fill;
use std::path::{Path, PathBuf};

/// Files generation touches for one service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePaths {
    /// Service declaration
    pub service_file: PathBuf,
    /// HTTP handlers
    pub http_file: PathBuf,
    /// HTTP base, regenerated whole
    pub http_base_file: PathBuf,
    /// Route patterns
    pub routes_file: PathBuf,
    /// gRPC handlers
    pub grpc_file: PathBuf,
    /// gRPC base, regenerated whole
    pub grpc_base_file: PathBuf,
    /// proto3 schema
    pub schema_file: PathBuf,
    /// Go records
    pub records_file: PathBuf,
    /// Schema compile script
    pub compile_script: PathBuf,
}

/// Resolves file locations and import paths for services
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    import_path: String,
    paths: PathsConfig,
}

impl PathResolver {
    /// Resolver for a project rooted at `cwd`
    ///
    /// `env_gopath` is the value of `$GOPATH` and `home` the user's home
    /// directory; both are only consulted when the config leaves the
    /// GOPATH (or the import path) unset.
    ///
    /// # Errors
    /// - `ResolveError::NoGopath` if no GOPATH can be determined
    /// - `ResolveError::OutsideProject` if the root is not under any `<gopath>/src`
    pub fn new(
        config: &GenkitConfig,
        cwd: &Path,
        env_gopath: Option<&str>,
        home: Option<&Path>,
    ) -> Result<Self, ResolveError> {
        let root = match config.project.folder.as_deref() {
            Some(folder) if !folder.is_empty() => cwd.join(folder),
            _ => cwd.to_path_buf(),
        };

        let import_path = match &config.project.import_path {
            Some(path) => path.trim_matches('/').to_string(),
            None => {
                let gopath = config
                    .project
                    .gopath
                    .clone()
                    .or_else(|| env_gopath.filter(|g| !g.is_empty()).map(str::to_string))
                    .or_else(|| home.map(|h| h.join("go").to_string_lossy().into_owned()))
                    .ok_or(ResolveError::NoGopath)?;
                project_import_path(&root, &gopath)?
            }
        };

        tracing::debug!(root = %root.display(), import_path, "project resolved");
        Ok(Self {
            root,
            import_path,
            paths: config.paths.clone(),
        })
    }

    /// Resolver with an explicit root and import path
    #[must_use]
    pub fn with_import_path(root: impl Into<PathBuf>, import_path: impl Into<String>, paths: PathsConfig) -> Self {
        Self {
            root: root.into(),
            import_path: import_path.into(),
            paths,
        }
    }

    /// Project root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project import path
    #[must_use]
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    fn dir(&self, template: &str, service_dir: &str) -> PathBuf {
        self.root.join(fill(template, service_dir))
    }

    fn import(&self, template: &str, service_dir: &str) -> String {
        let rel = fill(template, service_dir).replace('\\', "/");
        format!("{}/{}", self.import_path, rel.trim_matches('/'))
    }

    /// Every artifact path for a service directory name
    #[must_use]
    pub fn service_paths(&self, service: &str, service_dir: &str) -> ServicePaths {
        let p = &self.paths;
        let pb = self.dir(&p.pb, service_dir);
        ServicePaths {
            service_file: self.dir(&p.service, service_dir).join(&p.service_file),
            http_file: self.dir(&p.http, service_dir).join(&p.http_file),
            http_base_file: self.dir(&p.http, service_dir).join(&p.http_base_file),
            routes_file: self.dir(&p.conf, service_dir).join(&p.http_routes_file),
            grpc_file: self.dir(&p.grpc, service_dir).join(&p.grpc_file),
            grpc_base_file: self.dir(&p.grpc, service_dir).join(&p.grpc_base_file),
            schema_file: pb.join(fill(&p.schema_file, service)),
            records_file: pb.join(fill(&p.records_file, service)),
            compile_script: pb.join(&p.compile_script),
        }
    }

    /// Import paths of the sibling packages generated code refers to
    #[must_use]
    pub fn references(&self, service_dir: &str) -> ReferencePaths {
        let comm = self.import(&self.paths.comm, service_dir);
        ReferencePaths {
            endpoint: self.import(&self.paths.endpoint, service_dir),
            pb: self.import(&self.paths.pb, service_dir),
            conf: self.import(&self.paths.conf, service_dir),
            comm_http: format!("{comm}/http"),
            comm_pb: format!("{comm}/pb"),
        }
    }

    /// `path` relative to the project root, for display and toolchains
    #[must_use]
    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Import path of `root` under one of the `gopath` entries
fn project_import_path(root: &Path, gopath: &str) -> Result<String, ResolveError> {
    for entry in std::env::split_paths(gopath) {
        let src = entry.join("src");
        if let Ok(rel) = root.strip_prefix(&src) {
            let parts: Vec<String> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            if !parts.is_empty() {
                return Ok(parts.join("/"));
            }
        }
    }
    Err(ResolveError::OutsideProject {
        dir: root.to_path_buf(),
        gopath: gopath.to_string(),
    })
}
