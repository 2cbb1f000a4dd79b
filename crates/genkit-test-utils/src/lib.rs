//! Testing utilities for the genkit workspace
//!
//! Shared fixtures: service declarations, an in-memory project and a test
//! configuration with toolchains disabled.

#![allow(missing_docs)]

use genkit_artifact::ServiceMethod;
use genkit_layer::{GenkitConfig, MemoryStore, PathResolver, PathsConfig, ServicePaths};
use std::path::{Path, PathBuf};

pub const ROOT: &str = "/work";
pub const IMPORT_PATH: &str = "example.com/shop";

/// Declaration text of `<Svc>Service` with the given method lines
pub fn service_source(service_type: &str, methods: &[&str]) -> String {
    let mut out = String::from("package service\n\nimport \"context\"\n\n");
    out.push_str(&format!("// {service_type}Service describes the service.\n"));
    out.push_str(&format!("type {service_type}Service interface {{\n"));
    for m in methods {
        out.push('\t');
        out.push_str(m);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

/// Method line following the three-argument contract
pub fn conforming(name: &str) -> String {
    format!("{name}(ctx context.Context, req_pb pb.{name}Req, rsp_pb *pb.{name}Rsp) (errcode int32)")
}

/// Method line with the legacy single-context signature
pub fn legacy(name: &str) -> String {
    format!("{name}(ctx context.Context) int32")
}

/// `ServiceMethod` following the three-argument contract
pub fn conforming_method(name: &str) -> ServiceMethod {
    ServiceMethod::new(name)
        .param("ctx", "context.Context")
        .param("req_pb", &format!("pb.{name}Req"))
        .param("rsp_pb", &format!("*pb.{name}Rsp"))
        .result("errcode", "int32")
}

/// Configuration with external toolchains disabled
pub fn test_config() -> GenkitConfig {
    let mut config = GenkitConfig::default();
    config.project.testing = true;
    config.project.import_path = Some(IMPORT_PATH.to_string());
    config
}

pub fn resolver() -> PathResolver {
    PathResolver::with_import_path(ROOT, IMPORT_PATH, PathsConfig::default())
}

/// In-memory project holding one service declaration
#[derive(Debug)]
pub struct TestProject {
    pub service: String,
    pub store: MemoryStore,
    pub paths: ServicePaths,
}

impl TestProject {
    /// Project for `service` (snake case) whose interface declares `methods`
    pub fn new(service: &str, service_type: &str, methods: &[&str]) -> Self {
        let paths = resolver().service_paths(service, service);
        let store = MemoryStore::new().with_file(paths.service_file.clone(), service_source(service_type, methods));
        Self {
            service: service.to_string(),
            store,
            paths,
        }
    }

    /// Text at `path`; panics if absent
    pub fn read(&self, path: &Path) -> String {
        self.store
            .get(path)
            .unwrap_or_else(|| panic!("{} was not written", path.display()))
    }

    /// Replace the service declaration
    pub fn set_service(&self, service_type: &str, methods: &[&str]) {
        use genkit_layer::ArtifactStore;
        self.store
            .write(&self.paths.service_file, &service_source(service_type, methods), true)
            .unwrap();
    }

    /// Every artifact path except the service declaration
    pub fn generated(&self) -> Vec<PathBuf> {
        self.store
            .paths()
            .into_iter()
            .filter(|p| *p != self.paths.service_file)
            .collect()
    }
}
