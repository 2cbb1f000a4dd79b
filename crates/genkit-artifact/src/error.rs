//! Parse error types

/// Errors while building an artifact model from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// tree-sitter could not load the grammar
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// tree-sitter returned no tree
    #[error("parse failed")]
    ParseFailed,

    /// Malformed input; positions are 1-based
    #[error("syntax error at {line}:{column}: {message}")]
    SyntaxError {
        /// Line of the offending token
        line: usize,
        /// Column of the offending token
        column: usize,
        /// Description
        message: String,
    },

    /// Input ended inside a declaration
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(String),
}

impl ParseError {
    /// Create a syntax error
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display() {
        let err = ParseError::syntax(3, 7, "unexpected `}`");
        assert_eq!(err.to_string(), "syntax error at 3:7: unexpected `}`");
    }
}
