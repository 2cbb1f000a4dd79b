//! Service interface declarations
//!
//! A service is a Go interface whose methods drive generation. The parser
//! keeps each method's parameter-list span so a signature can be rewritten
//! in place without re-rendering the rest of the declaration.

use serde::Serialize;
use std::fmt::Write as _;
use std::ops::Range;

/// A `(name, type)` pair; `name` is empty for unnamed parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NamedTypeValue {
    /// Parameter or result name
    pub name: String,
    /// Type exactly as written (`context.Context`, `*pb.PingRsp`)
    #[serde(rename = "type")]
    pub ty: String,
}

impl NamedTypeValue {
    /// Create a named value
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// Create an unnamed value
    #[inline]
    #[must_use]
    pub fn unnamed(ty: impl Into<String>) -> Self {
        Self::new("", ty)
    }

    fn render(&self) -> String {
        if self.name.is_empty() {
            self.ty.clone()
        } else {
            format!("{} {}", self.name, self.ty)
        }
    }
}

/// One method of a service interface. Identity is the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceMethod {
    /// Method name
    pub name: String,
    /// Ordered parameters
    pub parameters: Vec<NamedTypeValue>,
    /// Ordered results
    pub results: Vec<NamedTypeValue>,
    /// Byte range of the parameter list (including parentheses)
    #[serde(skip)]
    pub params_span: Option<Range<usize>>,
}

impl ServiceMethod {
    /// Method with no parameters or results
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            results: Vec::new(),
            params_span: None,
        }
    }

    /// Append a parameter
    #[inline]
    #[must_use]
    pub fn param(mut self, name: &str, ty: &str) -> Self {
        self.parameters.push(NamedTypeValue::new(name, ty));
        self
    }

    /// Append a result
    #[inline]
    #[must_use]
    pub fn result(mut self, name: &str, ty: &str) -> Self {
        self.results.push(NamedTypeValue::new(name, ty));
        self
    }

    /// Go exports names whose first character is upper case
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }

    /// Parameter list as Go source, parentheses included
    #[must_use]
    pub fn parameter_list(&self) -> String {
        let params: Vec<_> = self.parameters.iter().map(NamedTypeValue::render).collect();
        format!("({})", params.join(", "))
    }

    /// Full method signature as it appears in an interface body
    #[must_use]
    pub fn signature(&self) -> String {
        let mut out = format!("{}{}", self.name, self.parameter_list());
        match self.results.as_slice() {
            [] => {}
            [single] if single.name.is_empty() => {
                let _ = write!(out, " {}", single.ty);
            }
            results => {
                let rendered: Vec<_> = results.iter().map(NamedTypeValue::render).collect();
                let _ = write!(out, " ({})", rendered.join(", "));
            }
        }
        out
    }
}

/// A named interface and its methods in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInterface {
    /// Interface name
    pub name: String,
    /// Declared methods
    pub methods: Vec<ServiceMethod>,
}

impl ServiceInterface {
    /// Create an interface
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, methods: Vec<ServiceMethod>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    /// Find a method by name
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&ServiceMethod> {
        self.methods.iter().find(|m| m.name == name)
    }
}
