//! Syntax errors raised while building the AST
//!
//! Every variant carries the span it was raised at; the parser records the
//! error and resynchronizes instead of aborting.

use crate::logging::{codes, Code};
use crate::tokens::TokenStreamError;
use crate::utils::Span;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Syntax error: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Syntax error: expected {expected}, but reached end of input")]
    UnexpectedEof { expected: String, span: Span },

    #[error("Invalid section name: '{name}'")]
    InvalidSection { name: String, span: Span },

    #[error("VARS section must come before any hook section")]
    VarsNotFirst { span: Span },

    #[error("Maximum nesting depth of {limit} exceeded")]
    MaxDepthExceeded { limit: usize, span: Span },

    #[error("Syntax error: {message}")]
    InvalidStatement { message: String, span: Span },

    #[error("Syntax error: missing '}}' to close {context}")]
    UnclosedBlock { context: String, span: Span },
}

impl SyntaxError {
    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            span,
        }
    }

    pub fn unexpected_eof(expected: &str, span: Span) -> Self {
        Self::UnexpectedEof {
            expected: expected.to_string(),
            span,
        }
    }

    pub fn invalid_section(name: &str, span: Span) -> Self {
        Self::InvalidSection {
            name: name.to_string(),
            span,
        }
    }

    pub fn invalid_statement(message: impl Into<String>, span: Span) -> Self {
        Self::InvalidStatement {
            message: message.into(),
            span,
        }
    }

    pub fn unclosed_block(context: &str, span: Span) -> Self {
        Self::UnclosedBlock {
            context: context.to_string(),
            span,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::UnexpectedEof { .. } => codes::syntax::UNEXPECTED_EOF,
            Self::InvalidSection { .. } => codes::syntax::INVALID_SECTION,
            Self::VarsNotFirst { .. } => codes::syntax::VARS_NOT_FIRST,
            Self::MaxDepthExceeded { .. } => codes::syntax::MAX_DEPTH_EXCEEDED,
            Self::InvalidStatement { .. } => codes::syntax::INVALID_STATEMENT,
            Self::UnclosedBlock { .. } => codes::syntax::UNCLOSED_BLOCK,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::UnexpectedEof { span, .. }
            | Self::InvalidSection { span, .. }
            | Self::VarsNotFirst { span }
            | Self::MaxDepthExceeded { span, .. }
            | Self::InvalidStatement { span, .. }
            | Self::UnclosedBlock { span, .. } => *span,
        }
    }

    /// Errors after which the parser gives up on the rest of the input
    pub fn requires_halt(&self) -> bool {
        crate::logging::codes::requires_halt(self.error_code().as_str())
    }
}

impl From<TokenStreamError> for SyntaxError {
    fn from(error: TokenStreamError) -> Self {
        match error {
            TokenStreamError::UnexpectedToken {
                expected,
                found,
                span,
            } => Self::UnexpectedToken {
                expected,
                found,
                span,
            },
            TokenStreamError::UnexpectedEndOfStream { expected, span } => {
                Self::UnexpectedEof { expected, span }
            }
        }
    }
}

impl crate::diagnostics::DiagnosticCode for SyntaxError {
    fn diagnostic_code(&self) -> Code {
        self.error_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let span = Span::dummy();
        assert_eq!(
            SyntaxError::invalid_section("BOGUS", span).to_string(),
            "Invalid section name: 'BOGUS'"
        );
        assert_eq!(
            SyntaxError::unexpected_token("';'", "'}'", span).to_string(),
            "Syntax error: expected ';', found '}'"
        );
        assert_eq!(
            SyntaxError::unclosed_block("REMAP", span).to_string(),
            "Syntax error: missing '}' to close REMAP"
        );
    }

    #[test]
    fn test_token_stream_error_conversion() {
        let err: SyntaxError = TokenStreamError::UnexpectedEndOfStream {
            expected: "';'".into(),
            span: Span::dummy(),
        }
        .into();
        assert_eq!(err.error_code(), codes::syntax::UNEXPECTED_EOF);
    }
}
