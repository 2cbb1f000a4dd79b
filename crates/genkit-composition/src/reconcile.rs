//! Import reconciliation for appended Go code

use genkit_artifact::{ArtifactModel, ImportSpec};

/// Adds the imports appended fragments need to an existing Go file
///
/// Existing imports are never removed or re-ordered. New specs go into the
/// last grouped `import ( ... )` block; without one they follow the last
/// single import, and a file with no imports gets a new block after its
/// package clause.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportReconciler;

impl ImportReconciler {
    /// Create a reconciler
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Candidate imports whose path the existing file does not import
    #[must_use]
    pub fn missing(&self, existing: &ArtifactModel, candidate: &[ImportSpec]) -> Vec<ImportSpec> {
        let mut out: Vec<ImportSpec> = Vec::new();
        for import in candidate {
            if existing.has_import(&import.path) || out.iter().any(|i| i.path == import.path) {
                continue;
            }
            out.push(import.clone());
        }
        out
    }

    /// Insert `imports` into `source`, whose parsed form is `existing`
    #[must_use]
    pub fn insert(&self, source: &str, existing: &ArtifactModel, imports: &[ImportSpec]) -> String {
        if imports.is_empty() {
            return source.to_string();
        }
        let blocks = existing.import_blocks();

        if let Some(block) = blocks.iter().rev().find(|b| b.grouped) {
            // span ends just past `)`
            let at = block.span.end.saturating_sub(1);
            let mut text = String::new();
            if !source[..at].ends_with('\n') {
                text.push('\n');
            }
            for import in imports {
                text.push('\t');
                text.push_str(&import.to_go());
                text.push('\n');
            }
            return splice(source, at, &text);
        }

        if let Some(last) = blocks.last() {
            let text: String = imports
                .iter()
                .map(|i| format!("\nimport {}", i.to_go()))
                .collect();
            return splice(source, last.span.end, &text);
        }

        let mut text = String::from("\n\nimport (\n");
        for import in imports {
            text.push('\t');
            text.push_str(&import.to_go());
            text.push('\n');
        }
        text.push(')');
        splice(source, existing.package_end(), &text)
    }
}

fn splice(source: &str, at: usize, text: &str) -> String {
    let at = at.min(source.len());
    let mut out = String::with_capacity(source.len() + text.len());
    out.push_str(&source[..at]);
    out.push_str(text);
    out.push_str(&source[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use genkit_artifact::GoParser;
    use pretty_assertions::assert_eq;

    fn reconcile(source: &str, imports: &[ImportSpec]) -> String {
        let model = GoParser::new().parse(source).unwrap();
        let r = ImportReconciler::new();
        let missing = r.missing(&model, imports);
        r.insert(source, &model, &missing)
    }

    #[test]
    fn appends_to_grouped_block() {
        let src = "package http\n\nimport (\n\t\"context\"\n)\n\nfunc a() {}\n";
        let out = reconcile(src, &[ImportSpec::new("context"), ImportSpec::new("net/http")]);
        assert_eq!(out, "package http\n\nimport (\n\t\"context\"\n\t\"net/http\"\n)\n\nfunc a() {}\n");
    }

    #[test]
    fn follows_single_import() {
        let src = "package http\n\nimport \"context\"\n\nfunc a() {}\n";
        let out = reconcile(src, &[ImportSpec::aliased("http1", "github.com/go-kit/kit/transport/http")]);
        assert_eq!(
            out,
            "package http\n\nimport \"context\"\nimport http1 \"github.com/go-kit/kit/transport/http\"\n\nfunc a() {}\n"
        );
    }

    #[test]
    fn creates_block_after_package() {
        let src = "package pb\n\nfunc a() {}\n";
        let out = reconcile(src, &[ImportSpec::new("example.com/p/comm/pb")]);
        assert_eq!(out, "package pb\n\nimport (\n\t\"example.com/p/comm/pb\"\n)\n\nfunc a() {}\n");
        assert!(GoParser::new().parse(&out).is_ok());
    }

    #[test]
    fn nothing_missing_leaves_source() {
        let src = "package http\n\nimport \"context\"\n";
        assert_eq!(reconcile(src, &[ImportSpec::new("context")]), src);
    }
}
