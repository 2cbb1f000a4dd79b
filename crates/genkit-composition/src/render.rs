//! Go rendering of fragment declarations
//!
//! Output follows gofmt layout (tabs, aligned struct fields and keyed
//! literals, sorted import block) so that a freshly generated file is
//! already canonical.

use crate::ast::{Decl, Expr, FuncDecl, Param, Stmt, StructDecl, TypeRef, VarDecl};
use genkit_artifact::{guess_package_name, ImportSpec};
use indexmap::{IndexMap, IndexSet};
use std::fmt::Write as _;

/// Standard library paths whose bare name outranks later colliding paths
const STDLIB_FIRST: &[&str] = &["context", "errors", "net/http"];

/// Import path to local-name assignment for one file
///
/// Seeded with the file's existing imports so references to an already
/// imported path reuse its name. A new path whose natural name is taken
/// gets a numeric suffix (`http`, `http1`, ...). A name counts as taken
/// when another import holds it, the file declares it, or it is the
/// natural name of a not yet imported standard library path.
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    locals: IndexMap<String, String>,
    used: IndexSet<String>,
    declared: IndexSet<String>,
}

impl ImportTable {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with existing imports
    #[must_use]
    pub fn seeded(existing: &[ImportSpec]) -> Self {
        let mut table = Self::new();
        for import in existing {
            let local = import.local_name();
            if local == "_" || local == "." {
                continue;
            }
            table.locals.entry(import.path.clone()).or_insert(local);
        }
        table
    }

    /// Keep new local names clear of package-level identifiers
    pub fn declare<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared.extend(names.into_iter().map(Into::into));
    }

    fn taken(&self, path: &str, name: &str) -> bool {
        self.locals.values().any(|l| l == name)
            || self.declared.contains(name)
            || STDLIB_FIRST
                .iter()
                .any(|std| *std != path && !self.locals.contains_key(*std) && guess_package_name(std) == name)
    }

    /// Local name for a path, assigning one on first use
    pub fn local(&mut self, path: &str) -> String {
        self.used.insert(path.to_string());
        if let Some(local) = self.locals.get(path) {
            return local.clone();
        }
        let base = guess_package_name(path);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.taken(path, &candidate) {
            candidate = format!("{base}{n}");
            n += 1;
        }
        self.locals.insert(path.to_string(), candidate.clone());
        candidate
    }

    /// Imports referenced since creation, sorted by path
    #[must_use]
    pub fn used(&self) -> Vec<ImportSpec> {
        let mut paths: Vec<&String> = self.used.iter().collect();
        paths.sort();
        paths
            .into_iter()
            .map(|path| {
                let local = self.locals.get(path).cloned().unwrap_or_else(|| guess_package_name(path));
                if local == guess_package_name(path) {
                    ImportSpec::new(path.clone())
                } else {
                    ImportSpec::aliased(local, path.clone())
                }
            })
            .collect()
    }
}

/// Renders [`Decl`]s as Go source
#[derive(Debug, Clone, Default)]
pub struct GoRenderer {
    imports: ImportTable,
}

impl GoRenderer {
    /// Renderer for a new file
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer for appending to a file with these imports
    #[must_use]
    pub fn with_imports(existing: &[ImportSpec]) -> Self {
        Self {
            imports: ImportTable::seeded(existing),
        }
    }

    /// Avoid these package-level identifiers when naming new imports
    #[must_use]
    pub fn declaring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.declare(names);
        self
    }

    /// Import table after rendering
    #[must_use]
    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Render declarations separated by blank lines
    pub fn decls<'a, I>(&mut self, decls: I) -> String
    where
        I: IntoIterator<Item = &'a Decl>,
    {
        let rendered: Vec<String> = decls.into_iter().map(|d| self.decl(d)).collect();
        rendered.join("\n")
    }

    /// Render one declaration, newline terminated
    pub fn decl(&mut self, decl: &Decl) -> String {
        match decl {
            Decl::Func(f) => self.func(f),
            Decl::Var(v) => self.var(v),
            Decl::Struct(s) => self.structure(s),
        }
    }

    /// Render a complete file
    pub fn file(&mut self, package: &str, header: Option<&str>, decls: &[Decl]) -> String {
        let body = self.decls(decls);
        let mut out = String::new();
        if let Some(header) = header {
            let _ = writeln!(out, "// {header}");
        }
        let _ = writeln!(out, "package {package}");

        let imports = self.imports.used();
        match imports.as_slice() {
            [] => {}
            [single] => {
                let _ = writeln!(out, "\nimport {}", single.to_go());
            }
            many => {
                out.push_str("\nimport (\n");
                for import in many {
                    let _ = writeln!(out, "\t{}", import.to_go());
                }
                out.push_str(")\n");
            }
        }
        if !body.is_empty() {
            out.push('\n');
            out.push_str(&body);
        }
        out
    }

    fn doc(out: &mut String, lines: &[String]) {
        for line in lines {
            if line.is_empty() {
                out.push_str("//\n");
            } else {
                let _ = writeln!(out, "// {line}");
            }
        }
    }

    fn func(&mut self, f: &FuncDecl) -> String {
        let mut out = String::new();
        Self::doc(&mut out, &f.doc);
        out.push_str("func ");
        if let Some(recv) = &f.receiver {
            let _ = write!(out, "({}) ", self.param(recv));
        }
        let params: Vec<String> = f.params.iter().map(|p| self.param(p)).collect();
        let _ = write!(out, "{}({})", f.name, params.join(", "));

        match f.results.as_slice() {
            [] => {}
            [single] if single.name.is_empty() => {
                let _ = write!(out, " {}", self.ty(&single.ty));
            }
            results => {
                let rendered: Vec<String> = results.iter().map(|p| self.param(p)).collect();
                let _ = write!(out, " ({})", rendered.join(", "));
            }
        }

        out.push_str(" {\n");
        self.stmts(&mut out, &f.body, 1);
        out.push_str("}\n");
        out
    }

    fn var(&mut self, v: &VarDecl) -> String {
        let mut out = String::new();
        Self::doc(&mut out, &v.doc);
        let value = self.expr(&v.value, 0);
        let _ = writeln!(out, "var {} = {value}", v.name);
        out
    }

    fn structure(&mut self, s: &StructDecl) -> String {
        let mut out = String::new();
        Self::doc(&mut out, &s.doc);
        if s.fields.is_empty() {
            let _ = writeln!(out, "type {} struct{{}}", s.name);
            return out;
        }
        let _ = writeln!(out, "type {} struct {{", s.name);
        let width = s.fields.iter().map(|f| f.name.chars().count()).max().unwrap_or(0);
        for field in &s.fields {
            let ty = self.ty(&field.ty);
            if field.name.is_empty() {
                let _ = writeln!(out, "\t{ty}");
            } else {
                let _ = writeln!(out, "\t{:<width$} {ty}", field.name);
            }
        }
        out.push_str("}\n");
        out
    }

    fn param(&mut self, p: &Param) -> String {
        let ty = self.ty(&p.ty);
        if p.name.is_empty() {
            ty
        } else {
            format!("{} {ty}", p.name)
        }
    }

    fn ty(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Named(name) => name.clone(),
            TypeRef::Qualified { path, name } => format!("{}.{name}", self.imports.local(path)),
            TypeRef::Pointer(inner) => format!("*{}", self.ty(inner)),
            TypeRef::Slice(inner) => format!("[]{}", self.ty(inner)),
            TypeRef::Map(k, v) => {
                let k = self.ty(k);
                format!("map[{k}]{}", self.ty(v))
            }
            TypeRef::Interface => "interface{}".to_string(),
        }
    }

    fn stmts(&mut self, out: &mut String, stmts: &[Stmt], depth: usize) {
        let indent = "\t".repeat(depth);
        for stmt in stmts {
            match stmt {
                Stmt::Expr(e) => {
                    let _ = writeln!(out, "{indent}{}", self.expr(e, depth));
                }
                Stmt::Define { names, value } => {
                    let _ = writeln!(out, "{indent}{} := {}", names.join(", "), self.expr(value, depth));
                }
                Stmt::Return(values) if values.is_empty() => {
                    let _ = writeln!(out, "{indent}return");
                }
                Stmt::Return(values) => {
                    let rendered: Vec<String> = values.iter().map(|v| self.expr(v, depth)).collect();
                    let _ = writeln!(out, "{indent}return {}", rendered.join(", "));
                }
                Stmt::If { cond, body } => {
                    let _ = writeln!(out, "{indent}if {} {{", self.expr(cond, depth));
                    self.stmts(out, body, depth + 1);
                    let _ = writeln!(out, "{indent}}}");
                }
            }
        }
    }

    fn exprs(&mut self, exprs: &[Expr], depth: usize) -> String {
        let rendered: Vec<String> = exprs.iter().map(|e| self.expr(e, depth)).collect();
        rendered.join(", ")
    }

    fn expr(&mut self, expr: &Expr, depth: usize) -> String {
        match expr {
            Expr::Ident(name) => name.clone(),
            Expr::Qualified { path, name } => format!("{}.{name}", self.imports.local(path)),
            Expr::Str(value) => quote(value),
            Expr::Nil => "nil".to_string(),
            Expr::Call { func, args } => {
                let func = self.expr(func, depth);
                format!("{func}({})", self.exprs(args, depth))
            }
            Expr::Selector { expr, field } => format!("{}.{field}", self.expr(expr, depth)),
            Expr::Composite { ty, fields } => {
                let ty = self.ty(ty);
                if fields.is_empty() {
                    return format!("{ty}{{}}");
                }
                let width = fields.iter().map(|(k, _)| k.chars().count() + 1).max().unwrap_or(0);
                let inner = "\t".repeat(depth + 1);
                let mut out = format!("{ty}{{\n");
                for (key, value) in fields {
                    let value = self.expr(value, depth + 1);
                    let _ = writeln!(out, "{inner}{:<width$} {value},", format!("{key}:"));
                }
                let _ = write!(out, "{}}}", "\t".repeat(depth));
                out
            }
            Expr::SliceLit { elem, items } => {
                let elem = self.ty(elem);
                format!("[]{elem}{{{}}}", self.exprs(items, depth))
            }
            Expr::AddrOf(inner) => format!("&{}", self.expr(inner, depth)),
            Expr::Spread(inner) => format!("{}...", self.expr(inner, depth)),
            Expr::Index { expr, index } => {
                let expr = self.expr(expr, depth);
                format!("{expr}[{}]", self.expr(index, depth))
            }
            Expr::TypeAssert { expr, ty } => {
                let expr = self.expr(expr, depth);
                format!("{expr}.({})", self.ty(ty))
            }
            Expr::Binary { lhs, op, rhs } => {
                let lhs = self.expr(lhs, depth);
                format!("{lhs} {op} {}", self.expr(rhs, depth))
            }
        }
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
