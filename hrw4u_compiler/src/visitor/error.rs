//! Errors raised while generating rules from the AST

use crate::logging::{codes, Code};
use crate::symbols::SymbolError;

pub type CodegenResult<T> = Result<T, CodegenError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    #[error(transparent)]
    Symbol(#[from] SymbolError),

    #[error("Unknown function: '{name}'")]
    UnknownFunction { name: String },

    #[error("This operator requires an argument")]
    MissingArgument { name: String },

    #[error("Unknown modifier: '{modifier}'. Must be one of: EXT, I, NC, NOCASE, PRE")]
    InvalidModifier { modifier: String },

    #[error("symbol error in {{{placeholder}}}: {reason}")]
    Interpolation { placeholder: String, reason: String },

    #[error("Too many substitutions in one string (limit {limit})")]
    TooManyInterpolations { limit: usize },

    #[error("Cannot use += operator with variables")]
    AppendToVariable { name: String },

    #[error("Cannot use += operator with '{target}'")]
    AppendNotSupported { target: String },

    #[error("Cannot infer a state variable type for '{name}' from {value}")]
    CannotInferType { name: String, value: String },

    #[error("Invalid value for {target}: {value}")]
    InvalidValue { target: String, value: String },
}

impl CodegenError {
    pub fn unknown_function(name: &str) -> Self {
        Self::UnknownFunction {
            name: name.to_string(),
        }
    }

    /// Function lookups report unknown names as unknown functions
    pub fn from_function_lookup(name: &str, error: SymbolError) -> Self {
        match error {
            SymbolError::SymbolResolution { .. } => Self::unknown_function(name),
            other => Self::Symbol(other),
        }
    }

    pub fn interpolation(placeholder: &str, reason: impl std::fmt::Display) -> Self {
        Self::Interpolation {
            placeholder: placeholder.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Symbol(inner) => inner.error_code(),
            Self::UnknownFunction { .. } => codes::codegen::UNKNOWN_FUNCTION,
            Self::MissingArgument { .. } => codes::codegen::MISSING_ARGUMENT,
            Self::InvalidModifier { .. } => codes::codegen::INVALID_MODIFIER,
            Self::Interpolation { .. } | Self::TooManyInterpolations { .. } => {
                codes::codegen::INVALID_INTERPOLATION
            }
            Self::AppendToVariable { .. } | Self::AppendNotSupported { .. } => {
                codes::codegen::UNSUPPORTED_EXPRESSION
            }
            Self::CannotInferType { .. } | Self::InvalidValue { .. } => {
                codes::symbols::TYPE_MISMATCH
            }
        }
    }
}

impl crate::diagnostics::DiagnosticCode for CodegenError {
    fn diagnostic_code(&self) -> Code {
        self.error_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_errors_keep_their_code() {
        let err: CodegenError = SymbolError::resolution("foo").into();
        assert_eq!(err.to_string(), "Unknown symbol: foo");
        assert_eq!(err.error_code(), codes::symbols::SYMBOL_RESOLUTION);
    }

    #[test]
    fn test_function_lookup_mapping() {
        let err = CodegenError::from_function_lookup("nope", SymbolError::resolution("nope"));
        assert_eq!(err.to_string(), "Unknown function: 'nope'");

        let err = CodegenError::from_function_lookup(
            "skip-remap",
            SymbolError::invalid_in_section("skip-remap", "SEND_RESPONSE"),
        );
        assert_eq!(err.error_code(), codes::codegen::INVALID_IN_SECTION);
    }

    #[test]
    fn test_interpolation_message() {
        let err = CodegenError::interpolation("bogus", "Unknown symbol: bogus");
        assert_eq!(err.to_string(), "symbol error in {bogus}: Unknown symbol: bogus");
    }
}
