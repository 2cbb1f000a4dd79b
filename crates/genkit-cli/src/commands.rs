//! Subcommand implementations

use crate::cli::{AddTarget, Cli, SchemaArgs, TransportArgs};
use anyhow::{Context, Result};
use genkit_artifact::{ArtifactModel, GoParser, SchemaDocument};
use genkit_core::{GenerateRequest, GenerationReport, Generator};
use genkit_layer::{ArtifactStore, FsStore, GenkitConfig, OverlayStore};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run `genkit add ...` against the project in `cwd`
pub(crate) fn add(cli: &Cli, target: &AddTarget, cwd: &Path) -> Result<()> {
    let (config, origin) = GenkitConfig::discover(cli.config.as_deref(), cwd).context("failed to load configuration")?;
    match &origin {
        Some(path) => tracing::debug!(path = %path.display(), "configuration loaded"),
        None => tracing::debug!("using default configuration"),
    }

    let fs = FsStore::new();
    let overlay = OverlayStore::new(&fs);
    let store: &dyn ArtifactStore = if cli.dry_run { &overlay } else { &fs };

    let gopath = std::env::var("GOPATH").ok();
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut generator = Generator::for_project(config, cwd, gopath.as_deref(), home.as_deref(), store)
        .context("failed to resolve the project")?;
    if cli.dry_run {
        generator = generator.without_toolchain();
    }

    let report = match target {
        AddTarget::Transport(args) => run_transport(&generator, args)?,
        AddTarget::Schema(args) => run_schema(&generator, args)?,
    };

    let mut out = std::io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        print_report(&mut out, &report, generator.resolver().root(), cli.dry_run)?;
    }
    Ok(())
}

fn run_transport(generator: &Generator<'_>, args: &TransportArgs) -> Result<GenerationReport> {
    let request = GenerateRequest::new(&args.service, &args.transport)
        .with_gorilla_mux(args.gorilla)
        .with_methods(args.methods.iter().cloned())
        .with_signature_rewrites(args.rewrite_signatures);
    generator
        .add_transport(&request)
        .with_context(|| format!("failed to add {} transport to `{}`", args.transport, args.service))
}

fn run_schema(generator: &Generator<'_>, args: &SchemaArgs) -> Result<GenerationReport> {
    generator
        .add_schema(&args.service, &args.methods)
        .with_context(|| format!("failed to add schema to `{}`", args.service))
}

/// Human summary of a run
pub(crate) fn print_report(out: &mut impl Write, report: &GenerationReport, root: &Path, dry_run: bool) -> Result<()> {
    let verb = if dry_run { "would write" } else { "wrote" };
    for rejection in &report.rejections {
        writeln!(out, "skipped {}: {}", rejection.method, rejection.reason)?;
    }
    for artifact in report.written() {
        let path = artifact.path.strip_prefix(root).unwrap_or(&artifact.path);
        if artifact.synthesized.is_empty() {
            writeln!(out, "{verb} {}", path.display())?;
        } else {
            writeln!(out, "{verb} {} (+{})", path.display(), artifact.synthesized.join(", "))?;
        }
    }
    if report.is_noop() {
        writeln!(out, "{}: up to date", report.service)?;
    }
    Ok(())
}

/// Parse `file` and print its symbol model as JSON
pub(crate) fn inspect(file: &Path) -> Result<()> {
    let model = parse_model(file)?;
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &model)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn parse_model(file: &Path) -> Result<ArtifactModel> {
    let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let model = if file.extension().is_some_and(|e| e == "proto") {
        SchemaDocument::parse(&text)
            .with_context(|| format!("failed to parse schema {}", file.display()))?
            .model()
    } else {
        GoParser::new()
            .parse(&text)
            .with_context(|| format!("failed to parse {}", file.display()))?
    };
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genkit_core::ArtifactOutcome;
    use genkit_layer::WriteStatus;
    use pretty_assertions::assert_eq;

    #[test]
    fn inspects_go_and_proto_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let go = dir.path().join("service.go");
        std::fs::write(&go, "package service\n\ntype UserService interface {\n\tPing() int32\n}\n").unwrap();
        let proto = dir.path().join("user.proto");
        std::fs::write(&proto, "syntax = \"proto3\";\n\nmessage PingReq {}\n").unwrap();

        let go_model = parse_model(&go).unwrap();
        assert_eq!(go_model.package(), Some("service"));
        assert!(go_model.interface("UserService").is_some());

        let proto_model = parse_model(&proto).unwrap();
        let names: Vec<_> = proto_model.symbols().map(ToString::to_string).collect();
        assert_eq!(names, ["message:PingReq"]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = parse_model(Path::new("/nonexistent/handler.go")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/handler.go"));
    }

    #[test]
    fn report_lists_written_artifacts_relative_to_root() {
        let report = GenerationReport {
            service: "user".into(),
            transport: None,
            kept: vec!["Ping".into()],
            rejections: Vec::new(),
            rewritten: Vec::new(),
            artifacts: vec![
                ArtifactOutcome {
                    synthesized: vec!["message:PingReq".into(), "message:PingRsp".into()],
                    ..ArtifactOutcome::whole("/w/user/pkg/pb/user.proto".into(), WriteStatus::Created, true)
                },
                ArtifactOutcome::whole("/w/user/pkg/pb/compile.sh".into(), WriteStatus::Unchanged, false),
            ],
        };

        let mut out = Vec::new();
        print_report(&mut out, &report, Path::new("/w"), true).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "would write user/pkg/pb/user.proto (+message:PingReq, message:PingRsp)\n"
        );
    }
}
