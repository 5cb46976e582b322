//! Error and success codes with their classification metadata
//!
//! Every error type in the compiler maps onto one of these codes through its
//! `error_code()` method; the registry below describes each code.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const EMPTY_FILE: Code = Code::new("E008");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
    pub const TOO_MANY_LINES: Code = Code::new("E013");
}

pub mod lexical {
    use super::Code;

    pub const INVALID_CHARACTER: Code = Code::new("E020");
    pub const UNTERMINATED_STRING: Code = Code::new("E021");
    pub const UNTERMINATED_REGEX: Code = Code::new("E022");
    pub const IDENTIFIER_TOO_LONG: Code = Code::new("E023");
    pub const STRING_TOO_LARGE: Code = Code::new("E024");
    pub const INVALID_NUMBER: Code = Code::new("E025");
    pub const COMMENT_TOO_LONG: Code = Code::new("E026");
    pub const TOO_MANY_TOKENS: Code = Code::new("E027");
}

pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E040");
    pub const UNEXPECTED_EOF: Code = Code::new("E041");
    pub const INVALID_SECTION: Code = Code::new("E042");
    pub const VARS_NOT_FIRST: Code = Code::new("E043");
    pub const MAX_DEPTH_EXCEEDED: Code = Code::new("E044");
    pub const INVALID_STATEMENT: Code = Code::new("E045");
    pub const UNCLOSED_BLOCK: Code = Code::new("E046");
}

pub mod symbols {
    use super::Code;

    pub const UNKNOWN_VAR_TYPE: Code = Code::new("E050");
    pub const SYMBOL_RESOLUTION: Code = Code::new("E051");
    pub const CAPACITY_EXCEEDED: Code = Code::new("E052");
    pub const INVALID_SUFFIX: Code = Code::new("E053");
    pub const TYPE_REDECLARATION: Code = Code::new("E054");
    pub const TYPE_MISMATCH: Code = Code::new("E055");
    pub const IDENTIFIER_TOO_LONG: Code = Code::new("E056");
}

pub mod codegen {
    use super::Code;

    pub const INVALID_IN_SECTION: Code = Code::new("E060");
    pub const UNKNOWN_FUNCTION: Code = Code::new("E061");
    pub const MISSING_ARGUMENT: Code = Code::new("E062");
    pub const INVALID_MODIFIER: Code = Code::new("E063");
    pub const INVALID_INTERPOLATION: Code = Code::new("E064");
    pub const UNSUPPORTED_EXPRESSION: Code = Code::new("E065");
}

pub mod reverse {
    use super::Code;

    pub const MALFORMED_RULE: Code = Code::new("E070");
    pub const UNKNOWN_STATE_TAG: Code = Code::new("E071");
    pub const UNKNOWN_OPERATOR: Code = Code::new("E072");
    pub const UNKNOWN_CONDITION: Code = Code::new("E073");
    pub const UNBALANCED_GROUP: Code = Code::new("E074");
}

pub mod batch {
    use super::Code;

    pub const DIRECTORY_NOT_FOUND: Code = Code::new("E080");
    pub const NO_FILES_FOUND: Code = Code::new("E081");
    pub const TOO_MANY_FILES: Code = Code::new("E082");
    pub const WORKER_FAILURE: Code = Code::new("E083");
}

pub mod pipeline {
    use super::Code;

    pub const COMPILATION_FAILED: Code = Code::new("E090");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const PARSE_COMPLETE: Code = Code::new("I040");
    pub const SYMBOL_TABLE_READY: Code = Code::new("I050");
    pub const CODE_GENERATION_COMPLETE: Code = Code::new("I060");
    pub const REVERSE_COMPILATION_COMPLETE: Code = Code::new("I070");
    pub const BATCH_COMPLETE: Code = Code::new("I080");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let mut registry = HashMap::new();
        let mut register = |metadata: ErrorMetadata| {
            registry.insert(metadata.code, metadata);
        };

        // System errors
        register(ErrorMetadata::new(
            "ERR001",
            "System",
            Severity::Critical,
            false,
            true,
            "Critical internal compiler error",
            "File a bug report with the input that triggered it",
        ));
        register(ErrorMetadata::new(
            "ERR002",
            "System",
            Severity::Critical,
            false,
            true,
            "Compiler initialization failure",
            "Check the runtime configuration file and environment",
        ));

        // File processing errors
        register(ErrorMetadata::new(
            "E005",
            "FileProcessing",
            Severity::Medium,
            false,
            false,
            "Input file not found",
            "Verify the file path exists",
        ));
        register(ErrorMetadata::new(
            "E006",
            "FileProcessing",
            Severity::Low,
            false,
            false,
            "Input file does not have the .hrw4u extension",
            "Rename the file or disable HRW4U_REQUIRE_EXTENSION",
        ));
        register(ErrorMetadata::new(
            "E007",
            "FileProcessing",
            Severity::High,
            false,
            false,
            "Input file exceeds the configured size limit",
            "Split the configuration into smaller files",
        ));
        register(ErrorMetadata::new(
            "E008",
            "FileProcessing",
            Severity::Low,
            false,
            false,
            "Input file is empty",
            "Provide a file with at least one section",
        ));
        register(ErrorMetadata::new(
            "E009",
            "FileProcessing",
            Severity::Medium,
            false,
            false,
            "Permission denied reading input file",
            "Check file permissions",
        ));
        register(ErrorMetadata::new(
            "E010",
            "FileProcessing",
            Severity::Medium,
            false,
            false,
            "Input file is not valid UTF-8",
            "Re-encode the file as UTF-8",
        ));
        register(ErrorMetadata::new(
            "E011",
            "FileProcessing",
            Severity::Medium,
            true,
            false,
            "I/O error while reading or writing a file",
            "Retry the operation and check disk health",
        ));
        register(ErrorMetadata::new(
            "E012",
            "FileProcessing",
            Severity::Medium,
            false,
            false,
            "Path does not refer to a regular file",
            "Pass a file path, or use --batch for directories",
        ));
        register(ErrorMetadata::new(
            "E013",
            "FileProcessing",
            Severity::High,
            false,
            false,
            "Input file has too many lines",
            "Split the configuration into smaller files",
        ));

        // Lexical errors
        register(ErrorMetadata::new(
            "E020",
            "Lexical",
            Severity::Medium,
            true,
            false,
            "Character not valid in hrw4u source",
            "Remove or quote the character",
        ));
        register(ErrorMetadata::new(
            "E021",
            "Lexical",
            Severity::Medium,
            true,
            false,
            "String literal missing closing quote",
            "Add the closing double quote",
        ));
        register(ErrorMetadata::new(
            "E022",
            "Lexical",
            Severity::Medium,
            true,
            false,
            "Regular expression missing closing slash",
            "Terminate the regex with '/'",
        ));
        register(ErrorMetadata::new(
            "E023",
            "Lexical",
            Severity::Low,
            true,
            false,
            "Identifier exceeds maximum length",
            "Use a shorter identifier",
        ));
        register(ErrorMetadata::new(
            "E024",
            "Lexical",
            Severity::Low,
            true,
            false,
            "String literal exceeds maximum size",
            "Shorten the string value",
        ));
        register(ErrorMetadata::new(
            "E025",
            "Lexical",
            Severity::Medium,
            true,
            false,
            "Malformed number or address literal",
            "Write integers as digits and addresses as dotted or CIDR notation",
        ));
        register(ErrorMetadata::new(
            "E026",
            "Lexical",
            Severity::Low,
            true,
            false,
            "Comment exceeds maximum length",
            "Shorten the comment",
        ));
        register(ErrorMetadata::new(
            "E027",
            "Lexical",
            Severity::High,
            false,
            true,
            "Token count exceeds maximum",
            "Split the configuration into smaller files",
        ));

        // Syntax errors
        register(ErrorMetadata::new(
            "E040",
            "Syntax",
            Severity::Medium,
            true,
            false,
            "Unexpected token",
            "Check the statement against the hrw4u grammar",
        ));
        register(ErrorMetadata::new(
            "E041",
            "Syntax",
            Severity::Medium,
            true,
            false,
            "Unexpected end of input",
            "Close all open blocks",
        ));
        register(ErrorMetadata::new(
            "E042",
            "Syntax",
            Severity::Medium,
            true,
            false,
            "Unknown section name",
            "Use one of the hook section names or VARS",
        ));
        register(ErrorMetadata::new(
            "E043",
            "Syntax",
            Severity::Medium,
            true,
            false,
            "VARS section appears after a hook section",
            "Move the VARS section to the top of the file",
        ));
        register(ErrorMetadata::new(
            "E044",
            "Syntax",
            Severity::High,
            false,
            false,
            "Expression nesting exceeds maximum depth",
            "Simplify the nested expression",
        ));
        register(ErrorMetadata::new(
            "E045",
            "Syntax",
            Severity::Medium,
            true,
            false,
            "Malformed statement",
            "Statements are assignments, function calls, break or a bare operator",
        ));
        register(ErrorMetadata::new(
            "E046",
            "Syntax",
            Severity::Medium,
            true,
            false,
            "Block is never closed",
            "Add the missing '}'",
        ));

        // Symbol errors
        register(ErrorMetadata::new(
            "E050",
            "Symbols",
            Severity::Medium,
            true,
            false,
            "Unknown variable type",
            "Use bool, int8 or int16",
        ));
        register(ErrorMetadata::new(
            "E051",
            "Symbols",
            Severity::Medium,
            true,
            false,
            "Identifier could not be resolved",
            "Declare the variable in VARS or fix the symbol name",
        ));
        register(ErrorMetadata::new(
            "E052",
            "Symbols",
            Severity::High,
            true,
            false,
            "No free state slots left for the variable type",
            "Reduce the number of variables of this type",
        ));
        register(ErrorMetadata::new(
            "E053",
            "Symbols",
            Severity::Medium,
            true,
            false,
            "Suffix not allowed for this symbol",
            "Use one of the listed suffixes",
        ));
        register(ErrorMetadata::new(
            "E054",
            "Symbols",
            Severity::Medium,
            true,
            false,
            "Variable redeclared with a different type",
            "Keep a single declaration per variable",
        ));
        register(ErrorMetadata::new(
            "E055",
            "Symbols",
            Severity::Medium,
            true,
            false,
            "Value does not fit the variable type",
            "Assign a value of the declared type",
        ));
        register(ErrorMetadata::new(
            "E056",
            "Symbols",
            Severity::Low,
            true,
            false,
            "Variable name exceeds maximum length",
            "Use a shorter variable name",
        ));

        // Code generation errors
        register(ErrorMetadata::new(
            "E060",
            "CodeGeneration",
            Severity::Medium,
            true,
            false,
            "Symbol used in a section where it is not available",
            "Move the statement to a section that supports it",
        ));
        register(ErrorMetadata::new(
            "E061",
            "CodeGeneration",
            Severity::Medium,
            true,
            false,
            "Unknown function",
            "Check the function name",
        ));
        register(ErrorMetadata::new(
            "E062",
            "CodeGeneration",
            Severity::Medium,
            true,
            false,
            "Operator requires an argument",
            "Supply a value or call it as a function",
        ));
        register(ErrorMetadata::new(
            "E063",
            "CodeGeneration",
            Severity::Low,
            true,
            false,
            "Unknown condition modifier",
            "Use NOCASE, EXT or PRE",
        ));
        register(ErrorMetadata::new(
            "E064",
            "CodeGeneration",
            Severity::Medium,
            true,
            false,
            "String interpolation could not be resolved",
            "Check the name inside the braces",
        ));
        register(ErrorMetadata::new(
            "E065",
            "CodeGeneration",
            Severity::Medium,
            true,
            false,
            "Expression form not supported here",
            "Rewrite the expression as a comparison or a condition",
        ));

        // Reverse compiler errors
        register(ErrorMetadata::new(
            "E070",
            "Reverse",
            Severity::Medium,
            true,
            false,
            "Malformed header_rewrite rule line",
            "Check the rule syntax",
        ));
        register(ErrorMetadata::new(
            "E071",
            "Reverse",
            Severity::Medium,
            true,
            false,
            "Unknown state variable tag",
            "Use STATE-FLAG, STATE-INT8 or STATE-INT16",
        ));
        register(ErrorMetadata::new(
            "E072",
            "Reverse",
            Severity::Medium,
            true,
            false,
            "Operator has no hrw4u equivalent",
            "Rewrite the rule by hand",
        ));
        register(ErrorMetadata::new(
            "E073",
            "Reverse",
            Severity::Medium,
            true,
            false,
            "Condition has no hrw4u equivalent",
            "Rewrite the rule by hand",
        ));
        register(ErrorMetadata::new(
            "E074",
            "Reverse",
            Severity::Medium,
            true,
            false,
            "GROUP without matching GROUP:END",
            "Balance the condition groups",
        ));

        // Batch errors
        register(ErrorMetadata::new(
            "E080",
            "Batch",
            Severity::Medium,
            false,
            false,
            "Batch directory not found",
            "Verify the directory path",
        ));
        register(ErrorMetadata::new(
            "E081",
            "Batch",
            Severity::Low,
            false,
            false,
            "No .hrw4u files found",
            "Check the directory and the recursive flag",
        ));
        register(ErrorMetadata::new(
            "E082",
            "Batch",
            Severity::High,
            false,
            false,
            "Too many files for one batch",
            "Process the directory in smaller parts",
        ));
        register(ErrorMetadata::new(
            "E083",
            "Batch",
            Severity::High,
            false,
            false,
            "Batch worker thread failed",
            "Re-run with a single thread to isolate the failing file",
        ));

        // Pipeline errors
        register(ErrorMetadata::new(
            "E090",
            "Pipeline",
            Severity::Medium,
            false,
            false,
            "Compilation finished with errors",
            "Fix the reported diagnostics",
        ));

        registry
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let metadata = get_error_metadata(symbols::CAPACITY_EXCEEDED.as_str()).unwrap();
        assert_eq!(metadata.category, "Symbols");
        assert_eq!(metadata.severity, Severity::High);
        assert!(metadata.recoverable);
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("E999"), "Unknown error");
        assert_eq!(get_action("E999"), "No specific action available");
        assert_eq!(get_category("E999"), "Unknown");
        assert_eq!(get_severity("E999"), Severity::Medium);
        assert!(is_recoverable("E999"));
        assert!(!requires_halt("E999"));
    }

    #[test]
    fn test_halt_codes() {
        assert!(requires_halt(system::INTERNAL_ERROR.as_str()));
        assert!(requires_halt(lexical::TOO_MANY_TOKENS.as_str()));
        assert!(!requires_halt(syntax::UNEXPECTED_TOKEN.as_str()));
    }
}
