//! Go code-fragment AST
//!
//! Just enough Go to express generated declarations. Qualified names carry
//! their full import path; the renderer turns them into `alias.Name` and
//! records which imports a fragment needs.

use indexmap::IndexSet;

/// A type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Builtin or package-local type (`string`, `error`, `grpcServer`)
    Named(String),
    /// Type from another package
    Qualified {
        /// Import path
        path: String,
        /// Exported name
        name: String,
    },
    /// `*T`
    Pointer(Box<TypeRef>),
    /// `[]T`
    Slice(Box<TypeRef>),
    /// `map[K]V`
    Map(Box<TypeRef>, Box<TypeRef>),
    /// `interface{}`
    Interface,
}

impl TypeRef {
    /// Builtin or local type
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Type from another package
    #[must_use]
    pub fn qual(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            path: path.into(),
            name: name.into(),
        }
    }

    /// `*self`
    #[must_use]
    pub fn pointer(self) -> Self {
        Self::Pointer(Box::new(self))
    }

    /// `[]self`
    #[must_use]
    pub fn slice(self) -> Self {
        Self::Slice(Box::new(self))
    }

    /// `map[key]self`
    #[must_use]
    pub fn map_of(key: TypeRef, value: TypeRef) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }
}

/// An expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Local identifier
    Ident(String),
    /// Package-qualified identifier
    Qualified {
        /// Import path
        path: String,
        /// Exported name
        name: String,
    },
    /// String literal (unescaped content)
    Str(String),
    /// `nil`
    Nil,
    /// `func(args)`
    Call {
        /// Callee
        func: Box<Expr>,
        /// Arguments
        args: Vec<Expr>,
    },
    /// `expr.field`
    Selector {
        /// Operand
        expr: Box<Expr>,
        /// Selected name
        field: String,
    },
    /// `T{k: v}`; empty fields render `T{}`
    Composite {
        /// Literal type
        ty: TypeRef,
        /// Keyed elements
        fields: Vec<(String, Expr)>,
    },
    /// `[]T{a, b}`
    SliceLit {
        /// Element type
        elem: TypeRef,
        /// Elements
        items: Vec<Expr>,
    },
    /// `&expr`
    AddrOf(Box<Expr>),
    /// `expr...`
    Spread(Box<Expr>),
    /// `expr[index]`
    Index {
        /// Operand
        expr: Box<Expr>,
        /// Index
        index: Box<Expr>,
    },
    /// `expr.(T)`
    TypeAssert {
        /// Operand
        expr: Box<Expr>,
        /// Asserted type
        ty: TypeRef,
    },
    /// `lhs op rhs`
    Binary {
        /// Left operand
        lhs: Box<Expr>,
        /// Operator
        op: &'static str,
        /// Right operand
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Local identifier
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// Package-qualified identifier
    #[must_use]
    pub fn qual(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            path: path.into(),
            name: name.into(),
        }
    }

    /// String literal
    #[must_use]
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// `self(args)`
    #[must_use]
    pub fn call(self, args: Vec<Expr>) -> Self {
        Self::Call {
            func: Box::new(self),
            args,
        }
    }

    /// `self.field`
    #[must_use]
    pub fn dot(self, field: impl Into<String>) -> Self {
        Self::Selector {
            expr: Box::new(self),
            field: field.into(),
        }
    }

    /// `&self`
    #[must_use]
    pub fn addr(self) -> Self {
        Self::AddrOf(Box::new(self))
    }

    /// `self...`
    #[must_use]
    pub fn spread(self) -> Self {
        Self::Spread(Box::new(self))
    }

    /// `self[index]`
    #[must_use]
    pub fn index(self, index: Expr) -> Self {
        Self::Index {
            expr: Box::new(self),
            index: Box::new(index),
        }
    }

    /// `self.(ty)`
    #[must_use]
    pub fn assert(self, ty: TypeRef) -> Self {
        Self::TypeAssert {
            expr: Box::new(self),
            ty,
        }
    }

    /// `self op rhs`
    #[must_use]
    pub fn binary(self, op: &'static str, rhs: Expr) -> Self {
        Self::Binary {
            lhs: Box::new(self),
            op,
            rhs: Box::new(rhs),
        }
    }

    /// `ty{}`
    #[must_use]
    pub fn empty_composite(ty: TypeRef) -> Self {
        Self::Composite { ty, fields: Vec::new() }
    }
}

/// A statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// Expression statement
    Expr(Expr),
    /// `a, b := value`
    Define {
        /// Left-hand names
        names: Vec<String>,
        /// Right-hand value
        value: Expr,
    },
    /// `return a, b`
    Return(Vec<Expr>),
    /// `if cond { body }`
    If {
        /// Condition
        cond: Expr,
        /// Body
        body: Vec<Stmt>,
    },
}

impl Stmt {
    /// `names := value`
    #[must_use]
    pub fn define(names: &[&str], value: Expr) -> Self {
        Self::Define {
            names: names.iter().map(|s| (*s).to_string()).collect(),
            value,
        }
    }
}

/// Parameter, result or struct field; an empty name is unnamed/embedded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Name, may be empty
    pub name: String,
    /// Type
    pub ty: TypeRef,
}

impl Param {
    /// Named parameter
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self { name: name.into(), ty }
    }

    /// Unnamed result or embedded field
    #[must_use]
    pub fn unnamed(ty: TypeRef) -> Self {
        Self::new("", ty)
    }
}

/// Function or method declaration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncDecl {
    /// Doc comment lines without `//`
    pub doc: Vec<String>,
    /// Receiver for methods
    pub receiver: Option<Param>,
    /// Name
    pub name: String,
    /// Parameters
    pub params: Vec<Param>,
    /// Results
    pub results: Vec<Param>,
    /// Body statements
    pub body: Vec<Stmt>,
}

impl FuncDecl {
    /// Start a function
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a doc line
    #[must_use]
    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Bind to a receiver
    #[must_use]
    pub fn receiver(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.receiver = Some(Param::new(name, ty));
        self
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    /// Append a result; pass `""` for unnamed
    #[must_use]
    pub fn result(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.results.push(Param::new(name, ty));
        self
    }

    /// Append a statement
    #[must_use]
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.body.push(stmt);
        self
    }
}

/// `var name = value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    /// Doc comment lines
    pub doc: Vec<String>,
    /// Name
    pub name: String,
    /// Initializer
    pub value: Expr,
}

impl VarDecl {
    /// Create a variable declaration
    #[must_use]
    pub fn new(name: impl Into<String>, value: Expr) -> Self {
        Self {
            doc: Vec::new(),
            name: name.into(),
            value,
        }
    }
}

/// `type name struct { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructDecl {
    /// Doc comment lines
    pub doc: Vec<String>,
    /// Name
    pub name: String,
    /// Fields; unnamed ones are embedded
    pub fields: Vec<Param>,
}

impl StructDecl {
    /// Start a struct
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a doc line
    #[must_use]
    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Append a named field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(Param::new(name, ty));
        self
    }

    /// Append an embedded field
    #[must_use]
    pub fn embed(mut self, ty: TypeRef) -> Self {
        self.fields.push(Param::unnamed(ty));
        self
    }
}

/// Top-level declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// Function or method
    Func(FuncDecl),
    /// Package variable
    Var(VarDecl),
    /// Struct type
    Struct(StructDecl),
}

impl Decl {
    /// Declared name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Decl::Func(f) => &f.name,
            Decl::Var(v) => &v.name,
            Decl::Struct(s) => &s.name,
        }
    }

    /// Import paths referenced anywhere in the declaration, in first-use order
    #[must_use]
    pub fn references(&self) -> IndexSet<String> {
        let mut refs = IndexSet::new();
        match self {
            Decl::Func(f) => {
                for p in f.receiver.iter().chain(&f.params).chain(&f.results) {
                    type_refs(&p.ty, &mut refs);
                }
                stmts_refs(&f.body, &mut refs);
            }
            Decl::Var(v) => expr_refs(&v.value, &mut refs),
            Decl::Struct(s) => {
                for field in &s.fields {
                    type_refs(&field.ty, &mut refs);
                }
            }
        }
        refs
    }
}

impl From<FuncDecl> for Decl {
    fn from(f: FuncDecl) -> Self {
        Decl::Func(f)
    }
}

impl From<VarDecl> for Decl {
    fn from(v: VarDecl) -> Self {
        Decl::Var(v)
    }
}

impl From<StructDecl> for Decl {
    fn from(s: StructDecl) -> Self {
        Decl::Struct(s)
    }
}

fn type_refs(ty: &TypeRef, refs: &mut IndexSet<String>) {
    match ty {
        TypeRef::Qualified { path, .. } => {
            refs.insert(path.clone());
        }
        TypeRef::Pointer(inner) | TypeRef::Slice(inner) => type_refs(inner, refs),
        TypeRef::Map(k, v) => {
            type_refs(k, refs);
            type_refs(v, refs);
        }
        TypeRef::Named(_) | TypeRef::Interface => {}
    }
}

fn stmts_refs(stmts: &[Stmt], refs: &mut IndexSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Expr(e) | Stmt::Define { value: e, .. } => expr_refs(e, refs),
            Stmt::Return(values) => values.iter().for_each(|e| expr_refs(e, refs)),
            Stmt::If { cond, body } => {
                expr_refs(cond, refs);
                stmts_refs(body, refs);
            }
        }
    }
}

fn expr_refs(expr: &Expr, refs: &mut IndexSet<String>) {
    match expr {
        Expr::Qualified { path, .. } => {
            refs.insert(path.clone());
        }
        Expr::Call { func, args } => {
            expr_refs(func, refs);
            args.iter().for_each(|a| expr_refs(a, refs));
        }
        Expr::Selector { expr, .. } | Expr::AddrOf(expr) | Expr::Spread(expr) => expr_refs(expr, refs),
        Expr::Composite { ty, fields } => {
            type_refs(ty, refs);
            fields.iter().for_each(|(_, v)| expr_refs(v, refs));
        }
        Expr::SliceLit { elem, items } => {
            type_refs(elem, refs);
            items.iter().for_each(|i| expr_refs(i, refs));
        }
        Expr::Index { expr, index } => {
            expr_refs(expr, refs);
            expr_refs(index, refs);
        }
        Expr::TypeAssert { expr, ty } => {
            expr_refs(expr, refs);
            type_refs(ty, refs);
        }
        Expr::Binary { lhs, rhs, .. } => {
            expr_refs(lhs, refs);
            expr_refs(rhs, refs);
        }
        Expr::Ident(_) | Expr::Str(_) | Expr::Nil => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_follow_first_use() {
        let f = FuncDecl::new("decodePingRequest")
            .param("ctx", TypeRef::qual("context", "Context"))
            .param("r", TypeRef::qual("net/http", "Request").pointer())
            .stmt(Stmt::define(&["req"], Expr::empty_composite(TypeRef::qual("x/pb", "PingReq"))))
            .stmt(Stmt::Return(vec![Expr::ident("req"), Expr::qual("context", "Canceled")]));

        let refs: Vec<_> = Decl::from(f).references().into_iter().collect();
        assert_eq!(refs, vec!["context", "net/http", "x/pb"]);
    }

    #[test]
    fn var_without_qualified_names_has_no_references() {
        let v = VarDecl::new("PingReqPattern", Expr::str("/ping"));
        assert!(Decl::from(v).references().is_empty());
    }
}
