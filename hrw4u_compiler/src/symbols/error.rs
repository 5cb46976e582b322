//! Errors raised by symbol and table resolution

use crate::logging::codes::{self, Code};

pub type SymbolResult<T> = Result<T, SymbolError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("Unknown VarType string: {name}")]
    UnknownVarType { name: String },

    #[error("Unknown symbol: {name}")]
    SymbolResolution { name: String },

    #[error("Too many {var_type} variables: all {limit} slots are in use")]
    CapacityExceeded { var_type: String, limit: usize },

    #[error("Invalid suffix '{suffix}'. Must be one of: {allowed}")]
    InvalidSuffix { suffix: String, allowed: String },

    #[error("Variable '{name}' already declared as {existing}, cannot redeclare as {requested}")]
    TypeRedeclaration {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("type mismatch: '{name}' is {expected}, cannot assign {value}")]
    TypeMismatch {
        name: String,
        expected: String,
        value: String,
    },

    #[error("Variable name '{name}' exceeds maximum length of {limit}")]
    IdentifierTooLong { name: String, limit: usize },

    #[error("symbol '{name}' not valid in section {section}")]
    InvalidInSection { name: String, section: String },
}

impl SymbolError {
    pub fn resolution(name: &str) -> Self {
        Self::SymbolResolution {
            name: name.to_string(),
        }
    }

    pub fn invalid_in_section(name: &str, section: &str) -> Self {
        Self::InvalidInSection {
            name: name.to_string(),
            section: section.to_string(),
        }
    }

    pub fn type_mismatch(name: &str, expected: &str, value: &str) -> Self {
        Self::TypeMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            value: value.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::UnknownVarType { .. } => codes::symbols::UNKNOWN_VAR_TYPE,
            Self::SymbolResolution { .. } => codes::symbols::SYMBOL_RESOLUTION,
            Self::CapacityExceeded { .. } => codes::symbols::CAPACITY_EXCEEDED,
            Self::InvalidSuffix { .. } => codes::symbols::INVALID_SUFFIX,
            Self::TypeRedeclaration { .. } => codes::symbols::TYPE_REDECLARATION,
            Self::TypeMismatch { .. } => codes::symbols::TYPE_MISMATCH,
            Self::IdentifierTooLong { .. } => codes::symbols::IDENTIFIER_TOO_LONG,
            Self::InvalidInSection { .. } => codes::codegen::INVALID_IN_SECTION,
        }
    }

    /// Name carried by a resolution failure
    pub fn unresolved_name(&self) -> Option<&str> {
        match self {
            Self::SymbolResolution { name } => Some(name),
            _ => None,
        }
    }
}

impl crate::diagnostics::DiagnosticCode for SymbolError {
    fn diagnostic_code(&self) -> Code {
        self.error_code()
    }
}
