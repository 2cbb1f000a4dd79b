//! Canonical formatting before write
//!
//! Every artifact passes through a [`Normalizer`] for its grammar before it
//! is persisted, whether or not anything was added. Normalizers are
//! idempotent: normalizing normalized text returns it unchanged.

use crate::config::ToolchainConfig;
use crate::error::NormalizeError;
use genkit_artifact::{SchemaDocument, SchemaFormatter};
use std::io::Write as _;
use std::process::{Command, Stdio};

/// Canonical formatter for one grammar
pub trait Normalizer: Send + Sync + std::fmt::Debug {
    /// Canonical form of `text`
    ///
    /// # Errors
    /// Returns `NormalizeError` if the text cannot be formatted
    fn normalize(&self, text: &str) -> Result<String, NormalizeError>;

    /// Name for logs
    fn name(&self) -> &'static str;
}

/// Go normalizer chosen by `[toolchain] go_formatter`
#[must_use]
pub fn go_normalizer(config: &ToolchainConfig) -> Box<dyn Normalizer> {
    match config.go_formatter.as_deref().map(str::trim) {
        Some(cmd) if !cmd.is_empty() => Box::new(ExternalFormatter::from_command_line(cmd)),
        _ => Box::new(GoNormalizer::new()),
    }
}

/// Built-in Go layout normalizer
///
/// Applies the whitespace rules of gofmt that generated and appended code
/// can violate: LF line endings, no trailing blanks, at most one blank
/// line in a row, one final newline, and sorted, de-duplicated specs
/// inside grouped import blocks (runs split by blank or comment lines are
/// sorted separately). Raw string literals and block comments are left
/// untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoNormalizer;

impl GoNormalizer {
    /// Create the normalizer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lex {
    Code,
    Str,
    Rune,
    Raw,
    LineComment,
    BlockComment,
}

/// Where a line starts and ends relative to raw strings and block comments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LineState {
    /// Begins inside a raw string or block comment; kept byte for byte
    starts_opaque: bool,
    /// Ends inside a raw string or block comment; trailing blanks are content
    ends_opaque: bool,
}

fn line_states(text: &str) -> Vec<LineState> {
    let mut out = Vec::new();
    let mut state = Lex::Code;
    let mut starts_opaque = false;
    let mut chars = text.chars().peekable();
    let opaque = |s: Lex| matches!(s, Lex::Raw | Lex::BlockComment);

    while let Some(c) = chars.next() {
        if c == '\n' {
            out.push(LineState {
                starts_opaque,
                ends_opaque: opaque(state),
            });
            if state == Lex::LineComment {
                state = Lex::Code;
            }
            starts_opaque = opaque(state);
            continue;
        }
        state = match (state, c) {
            (Lex::Code, '"') => Lex::Str,
            (Lex::Code, '\'') => Lex::Rune,
            (Lex::Code, '`') => Lex::Raw,
            (Lex::Code, '/') if chars.peek() == Some(&'/') => {
                chars.next();
                Lex::LineComment
            }
            (Lex::Code, '/') if chars.peek() == Some(&'*') => {
                chars.next();
                Lex::BlockComment
            }
            (Lex::Str | Lex::Rune, '\\') => {
                chars.next();
                state
            }
            (Lex::Str, '"') | (Lex::Rune, '\'') | (Lex::Raw, '`') => Lex::Code,
            (Lex::BlockComment, '*') if chars.peek() == Some(&'/') => {
                chars.next();
                Lex::Code
            }
            (s, _) => s,
        };
    }
    out.push(LineState {
        starts_opaque,
        ends_opaque: opaque(state),
    });
    out
}

fn import_path(spec: &str) -> &str {
    let mut parts = spec.splitn(3, '"');
    parts.next();
    parts.next().unwrap_or(spec)
}

fn sort_run(run: &mut Vec<String>, out: &mut Vec<String>) {
    run.sort_by(|a, b| import_path(a).cmp(import_path(b)).then_with(|| a.cmp(b)));
    run.dedup();
    out.append(run);
}

impl Normalizer for GoNormalizer {
    fn normalize(&self, text: &str) -> Result<String, NormalizeError> {
        let text = text.replace("\r\n", "\n");
        let states = line_states(&text);

        let mut lines: Vec<String> = Vec::new();
        let mut in_imports = false;
        let mut run: Vec<String> = Vec::new();

        for (line, state) in text.split('\n').zip(states) {
            if state.starts_opaque {
                sort_run(&mut run, &mut lines);
                lines.push(line.to_string());
                continue;
            }
            let line = if state.ends_opaque { line } else { line.trim_end() };
            let trimmed = line.trim();

            if in_imports {
                if trimmed == ")" {
                    sort_run(&mut run, &mut lines);
                    in_imports = false;
                } else if !trimmed.is_empty() && !trimmed.starts_with("//") {
                    run.push(format!("\t{trimmed}"));
                    continue;
                } else {
                    sort_run(&mut run, &mut lines);
                }
            } else if trimmed == "import (" && !state.ends_opaque {
                in_imports = true;
            }

            let blank = trimmed.is_empty();
            let prev_blank = lines.last().map_or(true, String::is_empty);
            if blank && prev_blank {
                continue;
            }
            lines.push(line.to_string());
        }
        sort_run(&mut run, &mut lines);

        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "builtin-go"
    }
}

/// Formatter command reading source on stdin and writing it to stdout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFormatter {
    program: String,
    args: Vec<String>,
}

impl ExternalFormatter {
    /// Split a command line on whitespace
    #[must_use]
    pub fn from_command_line(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        Self {
            program: parts.next().unwrap_or_default(),
            args: parts.collect(),
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Normalizer for ExternalFormatter {
    fn normalize(&self, text: &str) -> Result<String, NormalizeError> {
        let spawn_err = |source| NormalizeError::Spawn {
            command: self.command_line(),
            source,
        };
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(spawn_err)?;
        }
        let output = child.wait_with_output().map_err(spawn_err)?;
        if !output.status.success() {
            return Err(NormalizeError::Failed {
                command: self.command_line(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn name(&self) -> &'static str {
        "external-go"
    }
}

/// proto3 normalizer: parse and re-render canonically
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaNormalizer;

impl SchemaNormalizer {
    /// Create the normalizer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for SchemaNormalizer {
    fn normalize(&self, text: &str) -> Result<String, NormalizeError> {
        let doc = SchemaDocument::parse(text)?;
        Ok(SchemaFormatter::new().format(&doc))
    }

    fn name(&self) -> &'static str {
        "schema"
    }
}
