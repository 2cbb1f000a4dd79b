//! Method admission policy
//!
//! Narrows a service's declared methods to the ones generation is driven
//! by. Rules apply per method, first match wins:
//!
//! 1. unexported name: rejected
//! 2. no results: rejected
//! 3. a legacy `(ctx context.Context) int32` signature is rewritten once to
//!    the three-argument contract
//! 4. anything not matching `(context.Context, pb.<M>Req, *pb.<M>Rsp) int32`
//!    is rejected
//!
//! The caller's allow-list is applied to the admitted methods afterwards.

use crate::error::PolicyError;
use crate::naming::NamingConvention;
use genkit_artifact::{NamedTypeValue, ServiceMethod};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

const CONTEXT_TYPE: &str = "context.Context";
const ERRCODE_TYPE: &str = "int32";

/// Why a method was excluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyViolation {
    /// First character is not upper case
    Private,
    /// No result declared
    NoResults,
    /// Does not match the three-argument contract
    SignatureMismatch {
        /// The signature the method should have
        expected: String,
    },
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => f.write_str("private method ignored"),
            Self::NoResults => f.write_str("no return value"),
            Self::SignatureMismatch { expected } => write!(f, "signature mismatch, expected `{expected}`"),
        }
    }
}

/// A method excluded by the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Method name
    pub method: String,
    /// Reason
    pub reason: PolicyViolation,
}

/// Replacement of a legacy parameter list in the service declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureRewrite {
    /// Method name
    pub method: String,
    /// Byte range of the old parameter list, parentheses included
    pub span: Range<usize>,
    /// New parameter list
    pub replacement: String,
}

/// Result of filtering a service's methods
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Methods passing the structural rules, before the allow-list
    pub admitted: Vec<ServiceMethod>,
    /// Admitted methods also on the allow-list; drives generation
    pub kept: Vec<ServiceMethod>,
    /// Excluded methods with reasons, in declaration order
    pub rejections: Vec<Rejection>,
    /// Legacy signatures rewritten in memory
    pub rewrites: Vec<SignatureRewrite>,
}

impl FilterOutcome {
    /// Names of kept methods in declaration order
    pub fn kept_names(&self) -> impl Iterator<Item = &str> {
        self.kept.iter().map(|m| m.name.as_str())
    }

    /// Fail when nothing is left to generate for
    ///
    /// # Errors
    /// `PolicyError::NoSuitableMethods` if the kept set is empty
    pub fn ensure_nonempty(&self, service: &str) -> Result<(), PolicyError> {
        if self.kept.is_empty() {
            tracing::error!(service, "no suitable methods");
            return Err(PolicyError::NoSuitableMethods {
                service: service.to_string(),
            });
        }
        Ok(())
    }
}

/// Method admission rules plus an optional allow-list
#[derive(Debug, Clone, Default)]
pub struct MethodPolicy {
    naming: NamingConvention,
    allow_list: Vec<String>,
}

impl MethodPolicy {
    /// Policy without an allow-list
    #[must_use]
    pub fn new(naming: NamingConvention) -> Self {
        Self {
            naming,
            allow_list: Vec::new(),
        }
    }

    /// Restrict kept methods to these names; empty means no restriction
    #[must_use]
    pub fn with_allow_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_list = names.into_iter().map(Into::into).collect();
        self
    }

    /// Filter methods in declaration order
    ///
    /// Every rejection is logged at warn level.
    #[must_use]
    pub fn filter(&self, methods: &[ServiceMethod]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for method in methods {
            match self.admit(method) {
                Ok((admitted, rewrite)) => {
                    outcome.rewrites.extend(rewrite);
                    outcome.admitted.push(admitted);
                }
                Err(reason) => {
                    tracing::warn!(method = %method.name, %reason, "method ignored");
                    outcome.rejections.push(Rejection {
                        method: method.name.clone(),
                        reason,
                    });
                }
            }
        }

        outcome.kept = outcome
            .admitted
            .iter()
            .filter(|m| self.allow_list.is_empty() || self.allow_list.iter().any(|a| *a == m.name))
            .cloned()
            .collect();
        outcome
    }

    fn admit(&self, method: &ServiceMethod) -> Result<(ServiceMethod, Option<SignatureRewrite>), PolicyViolation> {
        if !method.is_exported() {
            return Err(PolicyViolation::Private);
        }
        if method.results.is_empty() {
            return Err(PolicyViolation::NoResults);
        }

        let request = self.naming.request_type(&method.name);
        let response = self.naming.response_type(&method.name);
        let mut method = method.clone();
        let mut rewrite = None;

        if is_legacy(&method) {
            method.parameters.push(NamedTypeValue::new("req_pb", request.clone()));
            method.parameters.push(NamedTypeValue::new("rsp_pb", response.clone()));
            rewrite = method.params_span.clone().map(|span| SignatureRewrite {
                method: method.name.clone(),
                span,
                replacement: method.parameter_list(),
            });
        }

        let conforms = matches!(
            method.parameters.as_slice(),
            [ctx, req, rsp] if ctx.ty == CONTEXT_TYPE && req.ty == request && rsp.ty == response
        ) && matches!(method.results.as_slice(), [code] if code.ty == ERRCODE_TYPE);

        if !conforms {
            return Err(PolicyViolation::SignatureMismatch {
                expected: format!(
                    "{}(ctx {CONTEXT_TYPE}, req_pb {request}, rsp_pb {response}) (errcode {ERRCODE_TYPE})",
                    method.name
                ),
            });
        }
        Ok((method, rewrite))
    }
}

fn is_legacy(method: &ServiceMethod) -> bool {
    matches!(method.parameters.as_slice(), [ctx] if ctx.ty == CONTEXT_TYPE)
        && matches!(method.results.as_slice(), [code] if code.ty == ERRCODE_TYPE)
}

/// Apply signature rewrites to the declaration text, back to front
///
/// Spans that do not fall on the text are skipped.
#[must_use]
pub fn apply_rewrites(source: &str, rewrites: &[SignatureRewrite]) -> String {
    let mut ordered: Vec<&SignatureRewrite> = rewrites.iter().collect();
    ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut out = source.to_string();
    for rewrite in ordered {
        if out.get(rewrite.span.clone()).is_some() {
            out.replace_range(rewrite.span.clone(), &rewrite.replacement);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn conforming(name: &str) -> ServiceMethod {
        ServiceMethod::new(name)
            .param("ctx", "context.Context")
            .param("req_pb", &format!("pb.{name}Req"))
            .param("rsp_pb", &format!("*pb.{name}Rsp"))
            .result("errcode", "int32")
    }

    fn policy() -> MethodPolicy {
        MethodPolicy::new(NamingConvention::default())
    }

    #[test]
    fn rules_apply_in_order() {
        let methods = vec![
            conforming("GetUser"),
            ServiceMethod::new("internal").param("ctx", "context.Context"),
            ServiceMethod::new("Fire").param("ctx", "context.Context"),
            ServiceMethod::new("Sum").param("a", "int").result("", "int"),
        ];
        let outcome = policy().filter(&methods);

        assert_eq!(outcome.kept_names().collect::<Vec<_>>(), vec!["GetUser"]);
        let reasons: Vec<_> = outcome.rejections.iter().map(|r| r.reason.to_string()).collect();
        assert_eq!(reasons[0], "private method ignored");
        assert_eq!(reasons[1], "no return value");
        assert!(reasons[2].starts_with("signature mismatch"));
    }

    #[test]
    fn legacy_signature_rewritten_once() {
        let mut legacy = ServiceMethod::new("GetUser").param("ctx", "context.Context");
        legacy.results.push(NamedTypeValue::unnamed("int32"));
        legacy.params_span = Some(10..32);

        let outcome = policy().filter(&[legacy]);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].parameters.len(), 3);
        assert_eq!(
            outcome.rewrites,
            vec![SignatureRewrite {
                method: "GetUser".into(),
                span: 10..32,
                replacement: "(ctx context.Context, req_pb pb.GetUserReq, rsp_pb *pb.GetUserRsp)".into(),
            }]
        );
    }

    #[test]
    fn legacy_rewrite_still_checks_result_type() {
        let method = ServiceMethod::new("GetUser")
            .param("ctx", "context.Context")
            .result("", "error");
        let outcome = policy().filter(&[method]);
        assert!(outcome.kept.is_empty());
        assert!(outcome.rewrites.is_empty());
    }

    #[test]
    fn allow_list_narrows_after_admission() {
        let outcome = policy()
            .with_allow_list(["Pong"])
            .filter(&[conforming("Ping"), conforming("Pong")]);
        assert_eq!(outcome.admitted.len(), 2);
        assert_eq!(outcome.kept_names().collect::<Vec<_>>(), vec!["Pong"]);
        assert!(outcome.rejections.is_empty());
    }

    #[test]
    fn empty_kept_set_is_fatal() {
        let outcome = policy().with_allow_list(["Missing"]).filter(&[conforming("Ping")]);
        assert_eq!(
            outcome.ensure_nonempty("user"),
            Err(PolicyError::NoSuitableMethods { service: "user".into() })
        );
    }

    #[test]
    fn rewrites_apply_back_to_front() {
        let src = "A(x) B(y)";
        let rewrites = vec![
            SignatureRewrite {
                method: "A".into(),
                span: 1..4,
                replacement: "(x, long)".into(),
            },
            SignatureRewrite {
                method: "B".into(),
                span: 6..9,
                replacement: "(y, z)".into(),
            },
        ];
        assert_eq!(apply_rewrites(src, &rewrites), "A(x, long) B(y, z)");
    }
}
