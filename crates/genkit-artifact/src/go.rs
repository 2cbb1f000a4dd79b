//! Go source parser adapter
//!
//! Builds an [`ArtifactModel`] from Go source with tree-sitter. Only
//! top-level declarations are indexed: functions, receiver methods,
//! `var`/`const` specs, named types and interfaces (with their method sets),
//! plus the package clause and every import declaration.
//!
//! Any ERROR or MISSING node in the tree rejects the whole artifact; a
//! partially understood file must never be merged into.

use crate::error::ParseError;
use crate::hash::ContentHash;
use crate::model::{ArtifactKind, ArtifactModel, ImportBlock, ImportSpec, SymbolKey};
use crate::service::{NamedTypeValue, ServiceInterface, ServiceMethod};
use tree_sitter::Node;

/// Go grammar adapter
#[derive(Clone)]
pub struct GoParser {
    language: tree_sitter::Language,
}

impl std::fmt::Debug for GoParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoParser").finish_non_exhaustive()
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GoParser {
    /// Create a parser for the Go grammar
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Parse source text into a symbol model
    ///
    /// # Errors
    /// - `ParseError::ParserInit` if the grammar cannot be loaded
    /// - `ParseError::SyntaxError` on the first malformed node
    pub fn parse(&self, source: &str) -> Result<ArtifactModel, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::ParserInit(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or(ParseError::ParseFailed)?;
        let root = tree.root_node();

        if let Some(bad) = first_error(root) {
            let pos = bad.start_position();
            return Err(ParseError::syntax(
                pos.row + 1,
                pos.column + 1,
                describe_error(bad, source),
            ));
        }

        let bytes = source.as_bytes();
        let mut model = ArtifactModel::new(ArtifactKind::Source);
        model.set_source_hash(ContentHash::compute(bytes));

        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "package_clause" => index_package(node, bytes, &mut model),
                "import_declaration" => index_imports(node, bytes, &mut model),
                "function_declaration" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        model.insert(SymbolKey::function(text(name, bytes)));
                    }
                }
                "method_declaration" => index_method(node, bytes, &mut model),
                "var_declaration" => index_specs(node, "var_spec", bytes, &mut model),
                "const_declaration" => index_specs(node, "const_spec", bytes, &mut model),
                "type_declaration" => index_types(node, bytes, &mut model),
                _ => {}
            }
        }

        tracing::trace!(symbols = model.len(), "indexed go source");
        Ok(model)
    }
}

fn text<'a>(node: Node<'_>, bytes: &'a [u8]) -> &'a str {
    node.utf8_text(bytes).unwrap_or("")
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn describe_error(node: Node<'_>, source: &str) -> String {
    if node.is_missing() {
        return format!("missing `{}`", node.kind());
    }
    let snippet: String = text(node, source.as_bytes()).chars().take(40).collect();
    if snippet.is_empty() {
        "unexpected input".to_string()
    } else {
        format!("unexpected `{}`", snippet.trim())
    }
}

fn descendants<'t>(node: Node<'t>, kind: &str, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == kind {
            out.push(child);
        } else {
            descendants(child, kind, out);
        }
    }
}

/// Collapse whitespace so `* pb.X` and `*pb.X` compare equal
fn normalize_type(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("* ", "*")
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '`')
}

fn index_package(node: Node<'_>, bytes: &[u8], model: &mut ArtifactModel) {
    let mut cursor = node.walk();
    let ident = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "package_identifier");
    if let Some(ident) = ident {
        model.set_package(text(ident, bytes), node.end_byte());
    }
}

fn index_imports(node: Node<'_>, bytes: &[u8], model: &mut ArtifactModel) {
    let mut specs = Vec::new();
    descendants(node, "import_spec", &mut specs);
    let mut cursor = node.walk();
    let grouped = node
        .named_children(&mut cursor)
        .any(|c| c.kind() == "import_spec_list");
    model.add_import_block(ImportBlock {
        span: node.byte_range(),
        grouped,
    });
    for spec in specs {
        let Some(path) = spec.child_by_field_name("path") else {
            continue;
        };
        let path = strip_quotes(text(path, bytes)).to_string();
        let import = match spec.child_by_field_name("name") {
            Some(alias) => ImportSpec::aliased(text(alias, bytes), path),
            None => ImportSpec::new(path),
        };
        model.add_import(import);
    }
}

fn index_method(node: Node<'_>, bytes: &[u8], model: &mut ArtifactModel) {
    let Some(name) = node.child_by_field_name("name") else {
        return;
    };
    let receiver = node
        .child_by_field_name("receiver")
        .map(|r| parse_parameter_list(r, bytes))
        .and_then(|params| params.into_iter().next())
        .map(|p| p.ty.replace(' ', ""))
        .unwrap_or_default();
    model.insert(SymbolKey::method(&receiver, text(name, bytes)));
}

fn index_specs(node: Node<'_>, spec_kind: &str, bytes: &[u8], model: &mut ArtifactModel) {
    let mut specs = Vec::new();
    descendants(node, spec_kind, &mut specs);
    for spec in specs {
        let mut cursor = spec.walk();
        for name in spec.children_by_field_name("name", &mut cursor) {
            model.insert(SymbolKey::variable(text(name, bytes)));
        }
    }
}

fn index_types(node: Node<'_>, bytes: &[u8], model: &mut ArtifactModel) {
    let mut cursor = node.walk();
    for spec in node.named_children(&mut cursor) {
        if spec.kind() != "type_spec" && spec.kind() != "type_alias" {
            continue;
        }
        let Some(name) = spec.child_by_field_name("name") else {
            continue;
        };
        let name = text(name, bytes);
        match spec.child_by_field_name("type") {
            Some(ty) if ty.kind() == "interface_type" => {
                let methods = parse_interface_methods(ty, bytes);
                model.add_interface(ServiceInterface::new(name, methods));
            }
            _ => {
                model.insert(SymbolKey::record(name));
            }
        }
    }
}

fn parse_interface_methods(node: Node<'_>, bytes: &[u8]) -> Vec<ServiceMethod> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() == "method_elem" || c.kind() == "method_spec")
        .filter_map(|elem| {
            let name = elem.child_by_field_name("name")?;
            let mut method = ServiceMethod::new(text(name, bytes));
            if let Some(params) = elem.child_by_field_name("parameters") {
                method.parameters = parse_parameter_list(params, bytes);
                method.params_span = Some(params.byte_range());
            }
            if let Some(result) = elem.child_by_field_name("result") {
                method.results = if result.kind() == "parameter_list" {
                    parse_parameter_list(result, bytes)
                } else {
                    vec![NamedTypeValue::unnamed(normalize_type(text(result, bytes)))]
                };
            }
            Some(method)
        })
        .collect()
}

fn parse_parameter_list(node: Node<'_>, bytes: &[u8]) -> Vec<NamedTypeValue> {
    let mut values = Vec::new();
    let mut cursor = node.walk();
    for decl in node.named_children(&mut cursor) {
        let variadic = match decl.kind() {
            "parameter_declaration" => false,
            "variadic_parameter_declaration" => true,
            _ => continue,
        };
        let Some(ty) = decl.child_by_field_name("type") else {
            continue;
        };
        let mut ty = normalize_type(text(ty, bytes));
        if variadic {
            ty = format!("...{ty}");
        }
        let mut name_cursor = decl.walk();
        let names: Vec<_> = decl
            .children_by_field_name("name", &mut name_cursor)
            .map(|n| text(n, bytes).to_string())
            .collect();
        if names.is_empty() {
            values.push(NamedTypeValue::unnamed(ty));
        } else {
            values.extend(names.into_iter().map(|n| NamedTypeValue::new(n, ty.clone())));
        }
    }
    values
}
