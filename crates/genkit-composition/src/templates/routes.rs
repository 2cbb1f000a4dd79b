//! Route pattern constants

use super::TemplateSynthesizer;
use crate::ast::{Expr, VarDecl};

/// `var <M>ReqPattern = "/<kebab-method>"`
#[must_use]
pub fn pattern(t: &TemplateSynthesizer, method: &str) -> VarDecl {
    VarDecl::new(t.naming.route_pattern(method), Expr::str(t.naming.route_path(method)))
}
