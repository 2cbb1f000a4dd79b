//! genkit configuration
//!
//! Loaded from `genkit.toml`; every section and key is optional. The struct
//! is passed explicitly to whatever needs it, there is no global lookup.
//!
//! ```toml
//! [project]
//! folder = "services"
//! testing = false
//!
//! [paths]
//! http = "{}/pkg/transport/http"
//!
//! [naming]
//! handler = "new{}Handler"
//!
//! [schema]
//! imports = { "common.proto" = "https://example.com/proto/common.proto" }
//! ```

use crate::error::ConfigError;
use genkit_symbol::NamingConvention;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory
pub const CONFIG_FILE: &str = "genkit.toml";

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenkitConfig {
    /// Project location
    pub project: ProjectConfig,
    /// Directory and file layout
    pub paths: PathsConfig,
    /// Generated symbol names
    pub naming: NamingConvention,
    /// External tools
    pub toolchain: ToolchainConfig,
    /// Schema import resolution
    pub schema: SchemaConfig,
}

/// `[project]`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// GOPATH entries; `$GOPATH`, then `$HOME/go` when unset
    pub gopath: Option<String>,
    /// Sub-folder of the working directory holding the services
    pub folder: Option<String>,
    /// Import path of the project root; derived from GOPATH when unset
    pub import_path: Option<String>,
    /// Skip external toolchains
    pub testing: bool,
}

/// `[paths]`: directory templates take the snake-case service name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Service declaration directory
    pub service: String,
    /// Endpoint set directory
    pub endpoint: String,
    /// HTTP transport directory
    pub http: String,
    /// gRPC transport directory
    pub grpc: String,
    /// Schema and record directory
    pub pb: String,
    /// Route pattern directory
    pub conf: String,
    /// Shared packages directory, relative to the project root
    pub comm: String,
    /// Service declaration file
    pub service_file: String,
    /// HTTP handlers file
    pub http_file: String,
    /// HTTP base file, regenerated whole
    pub http_base_file: String,
    /// Route patterns file
    pub http_routes_file: String,
    /// gRPC handlers file
    pub grpc_file: String,
    /// gRPC base file, regenerated whole
    pub grpc_base_file: String,
    /// Schema file; `{}` is the service name
    pub schema_file: String,
    /// Go records file; `{}` is the service name
    pub records_file: String,
    /// Schema compile script, next to the schema
    pub compile_script: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            service: "{}/pkg/service".into(),
            endpoint: "{}/pkg/endpoint".into(),
            http: "{}/pkg/http".into(),
            grpc: "{}/pkg/grpc".into(),
            pb: "{}/pkg/pb".into(),
            conf: "{}/pkg/conf".into(),
            comm: "comm".into(),
            service_file: "service.go".into(),
            http_file: "handler.go".into(),
            http_base_file: "handler_gen.go".into(),
            http_routes_file: "router_map.go".into(),
            grpc_file: "handler.go".into(),
            grpc_base_file: "handler_gen.go".into(),
            schema_file: "{}.proto".into(),
            records_file: "{}.go".into(),
            compile_script: if cfg!(windows) { "compile.bat" } else { "compile.sh" }.into(),
        }
    }
}

/// `[toolchain]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Go formatter command line reading stdin (e.g. `gofmt`); built-in when unset
    pub go_formatter: Option<String>,
    /// Schema compiler
    pub protoc: String,
    /// Extra arguments after the schema path
    pub protoc_args: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            go_formatter: None,
            protoc: "protoc".into(),
            protoc_args: vec!["--go_out=plugins=grpc:.".into()],
        }
    }
}

/// `[schema]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Bound on nested import resolution
    pub max_import_depth: usize,
    /// Import file name -> URL to fetch it from
    pub imports: IndexMap<String, String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_import_depth: 8,
            imports: IndexMap::new(),
        }
    }
}

impl GenkitConfig {
    /// Parse TOML text; `origin` is only used in errors
    ///
    /// # Errors
    /// `ConfigError::Toml` on malformed input, `ConfigError::Template` on a
    /// template without placeholder
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    ///
    /// # Errors
    /// `ConfigError::Io` if unreadable, otherwise as [`Self::from_toml`]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// `explicit` if given, else `genkit.toml` in `cwd`, else defaults
    ///
    /// Returns the file actually loaded alongside the config.
    ///
    /// # Errors
    /// As [`Self::load`]
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        let local = cwd.join(CONFIG_FILE);
        if local.is_file() {
            return Ok((Self::load(&local)?, Some(local)));
        }
        tracing::debug!("no {CONFIG_FILE} found, using defaults");
        Ok((Self::default(), None))
    }

    /// Check every per-name template has its placeholder
    ///
    /// # Errors
    /// `ConfigError::Template` naming the first offending key
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = &self.naming;
        let p = &self.paths;
        let templates = [
            ("naming.decoder", &n.decoder),
            ("naming.encoder", &n.encoder),
            ("naming.handler", &n.handler),
            ("naming.request_record", &n.request_record),
            ("naming.response_record", &n.response_record),
            ("naming.request_message", &n.request_message),
            ("naming.response_message", &n.response_message),
            ("naming.route_pattern", &n.route_pattern),
            ("naming.interface", &n.interface),
            ("naming.endpoint", &n.endpoint),
            ("paths.service", &p.service),
            ("paths.endpoint", &p.endpoint),
            ("paths.http", &p.http),
            ("paths.grpc", &p.grpc),
            ("paths.pb", &p.pb),
            ("paths.conf", &p.conf),
        ];
        for (key, value) in templates {
            if !value.contains("{}") {
                return Err(ConfigError::Template {
                    key: key.to_string(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}
