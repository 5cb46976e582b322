//! Errors raised while reading rule text back into hrw4u

use crate::diagnostics::Hrw4uError;
use crate::logging::codes::{self, Code};
use crate::symbols::SymbolError;

pub type ReverseResult<T> = Result<T, ReverseError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReverseError {
    #[error("Malformed rule: {message}")]
    MalformedRule { message: String },

    #[error("Unknown state tag: '{tag}'")]
    UnknownStateTag { tag: String },

    #[error("Unknown operator: '{operator}'")]
    UnknownOperator { operator: String },

    #[error("Unknown condition: '{condition}'")]
    UnknownCondition { condition: String },

    #[error("Unbalanced {what}")]
    UnbalancedGroup { what: String },

    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

impl ReverseError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRule {
            message: message.into(),
        }
    }

    pub fn unbalanced(what: impl Into<String>) -> Self {
        Self::UnbalancedGroup { what: what.into() }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::MalformedRule { .. } => codes::reverse::MALFORMED_RULE,
            Self::UnknownStateTag { .. } => codes::reverse::UNKNOWN_STATE_TAG,
            Self::UnknownOperator { .. } => codes::reverse::UNKNOWN_OPERATOR,
            Self::UnknownCondition { .. } => codes::reverse::UNKNOWN_CONDITION,
            Self::UnbalancedGroup { .. } => codes::reverse::UNBALANCED_GROUP,
            Self::Symbol(inner) => inner.error_code(),
        }
    }

    /// Rule text has no columns worth reporting; errors point at column 0
    pub fn at_line(&self, filename: &str, line: u32, source_line: &str) -> Hrw4uError {
        Hrw4uError::new(filename, line, 0, self.to_string())
            .with_source_line(source_line)
            .with_code(self.error_code())
    }
}

impl crate::diagnostics::DiagnosticCode for ReverseError {
    fn diagnostic_code(&self) -> Code {
        self.error_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positioned_at_column_zero() {
        let err = ReverseError::UnknownStateTag {
            tag: "STATE-FLOAT".into(),
        };
        let diagnostic = err.at_line("rules.conf", 4, "cond %{STATE-FLOAT:0}");
        assert_eq!(diagnostic.column, 0);
        assert_eq!(diagnostic.code, codes::reverse::UNKNOWN_STATE_TAG);
        assert_eq!(
            diagnostic.render(),
            "rules.conf:4:0: error: Unknown state tag: 'STATE-FLOAT'\n   4 | cond %{STATE-FLOAT:0}\n     | ^"
        );
    }

    #[test]
    fn test_symbol_errors_pass_through() {
        let err: ReverseError = SymbolError::resolution("x").into();
        assert_eq!(err.to_string(), "Unknown symbol: x");
        assert_eq!(err.error_code(), codes::symbols::SYMBOL_RESOLUTION);
    }
}
