//! External schema compiler
//!
//! `protoc` runs once per schema generation from the working directory with
//! the schema path relative to it. With `project.testing` set nothing is
//! spawned. The compile script placed next to the schema is only text; it
//! is written once by the pipeline and never overwritten.

use crate::config::ToolchainConfig;
use crate::error::ToolchainError;
use std::path::Path;
use std::process::Command;

/// Flavor of the compile script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFlavor {
    /// `cmd.exe` batch file
    Batch,
    /// sh script with Homebrew instructions
    Darwin,
    /// sh script with apt instructions
    Posix,
}

impl ScriptFlavor {
    /// Flavor for the host operating system
    #[must_use]
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Batch
        } else if cfg!(target_os = "macos") {
            Self::Darwin
        } else {
            Self::Posix
        }
    }
}

const BATCH_PREAMBLE: &str = ":: Install proto3.
:: https://github.com/google/protobuf/releases
:: Update protoc Go bindings via
::  go get -u github.com/golang/protobuf/proto
::  go get -u github.com/golang/protobuf/protoc-gen-go
::
:: See also
::  https://github.com/grpc/grpc-go/tree/master/examples
";

const DARWIN_PREAMBLE: &str = "#!/usr/bin/env sh

# Install proto3 from source macOS only.
#  brew install autoconf automake libtool
#  git clone https://github.com/google/protobuf
#  ./autogen.sh ; ./configure ; make ; make install
#
# Update protoc Go bindings via
#  go get -u github.com/golang/protobuf/{proto,protoc-gen-go}
#
# See also
#  https://github.com/grpc/grpc-go/tree/master/examples
";

const POSIX_PREAMBLE: &str = "#!/usr/bin/env sh

# Install proto3
# sudo apt-get install -y git autoconf automake libtool curl make g++ unzip
# git clone https://github.com/google/protobuf.git
# cd protobuf/
# ./autogen.sh
# ./configure
# make
# make check
# sudo make install
# sudo ldconfig # refresh shared library cache.
#
# Update protoc Go bindings via
#  go get -u github.com/golang/protobuf/{proto,protoc-gen-go}
#
# See also
#  https://github.com/grpc/grpc-go/tree/master/examples
";

/// Runs the schema compiler
#[derive(Debug, Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
    testing: bool,
}

impl Toolchain {
    /// Toolchain from config; `testing` disables every invocation
    #[must_use]
    pub fn new(config: ToolchainConfig, testing: bool) -> Self {
        Self { config, testing }
    }

    /// Whether invocations are skipped
    #[inline]
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.testing
    }

    /// Compile `schema` (relative to `cwd`) into Go bindings
    ///
    /// Returns whether the compiler actually ran.
    ///
    /// # Errors
    /// `ToolchainError::Spawn` if the compiler cannot be started,
    /// `ToolchainError::Failed` with its stderr if it exits non-zero
    pub fn compile_schema(&self, cwd: &Path, schema: &Path) -> Result<bool, ToolchainError> {
        if self.testing {
            tracing::debug!(schema = %schema.display(), "toolchain disabled, skipping schema compile");
            return Ok(false);
        }
        let command = self.command_line(schema);
        tracing::info!(%command, "compiling schema");

        let output = Command::new(&self.config.protoc)
            .arg(schema)
            .args(&self.config.protoc_args)
            .current_dir(cwd)
            .output()
            .map_err(|source| ToolchainError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolchainError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(true)
    }

    fn command_line(&self, schema: &Path) -> String {
        let mut line = format!("{} {}", self.config.protoc, schema.display());
        for arg in &self.config.protoc_args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Compile script for `schema_file_name`, run from the schema directory
    #[must_use]
    pub fn compile_script(&self, schema_file_name: &str, flavor: ScriptFlavor) -> String {
        let preamble = match flavor {
            ScriptFlavor::Batch => BATCH_PREAMBLE,
            ScriptFlavor::Darwin => DARWIN_PREAMBLE,
            ScriptFlavor::Posix => POSIX_PREAMBLE,
        };
        let mut args = String::new();
        for arg in &self.config.protoc_args {
            args.push(' ');
            args.push_str(arg);
        }
        format!("{preamble}\n{} {schema_file_name}{args}\n", self.config.protoc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_mode_never_spawns() {
        let mut config = ToolchainConfig::default();
        config.protoc = "genkit-no-such-protoc".into();
        let ran = Toolchain::new(config, true)
            .compile_schema(Path::new("."), Path::new("user/pkg/pb/user.proto"))
            .unwrap();
        assert!(!ran);
    }

    #[test]
    fn missing_compiler_is_surfaced() {
        let mut config = ToolchainConfig::default();
        config.protoc = "genkit-no-such-protoc".into();
        let err = Toolchain::new(config, false)
            .compile_schema(Path::new("."), Path::new("user.proto"))
            .unwrap_err();
        match err {
            ToolchainError::Spawn { command, .. } => {
                assert_eq!(command, "genkit-no-such-protoc user.proto --go_out=plugins=grpc:.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scripts_end_with_the_compile_line() {
        let tc = Toolchain::new(ToolchainConfig::default(), true);
        for flavor in [ScriptFlavor::Batch, ScriptFlavor::Darwin, ScriptFlavor::Posix] {
            let text = tc.compile_script("user.proto", flavor);
            assert!(text.ends_with("\nprotoc user.proto --go_out=plugins=grpc:.\n"), "{text}");
        }
        assert!(tc.compile_script("a.proto", ScriptFlavor::Batch).starts_with(":: Install proto3."));
        assert!(tc.compile_script("a.proto", ScriptFlavor::Darwin).contains("brew install"));
        assert!(tc.compile_script("a.proto", ScriptFlavor::Posix).contains("apt-get install"));
    }
}
