//! Policy errors

/// Fatal outcomes of method admission
///
/// Individual rejections are not errors; they are reported as
/// [`Rejection`](crate::Rejection) values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Transport kind not recognized
    #[error("transport `{0}` not supported")]
    UnsupportedTransport(String),

    /// Every declared method was rejected or filtered out
    #[error("the service `{service}` has no suitable methods, please implement the interface methods")]
    NoSuitableMethods {
        /// Service name as requested
        service: String,
    },
}
