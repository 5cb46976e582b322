//! Lexical analysis for hrw4u source text

pub mod analyzer;

use crate::config::compile_time::lexical::*;

pub use analyzer::{LexOutput, LexerError, LexicalAnalyzer, LexicalMetrics};

/// Tokenize a source string with a fresh analyzer
pub fn tokenize(source: &str) -> LexOutput {
    LexicalAnalyzer::new().tokenize(source)
}

/// Check that every lexical error code is registered and the limits are usable
pub fn validate_tokenization() -> Result<(), String> {
    let test_codes = [
        crate::logging::codes::lexical::INVALID_CHARACTER,
        crate::logging::codes::lexical::UNTERMINATED_STRING,
        crate::logging::codes::lexical::UNTERMINATED_REGEX,
        crate::logging::codes::lexical::INVALID_NUMBER,
        crate::logging::codes::lexical::IDENTIFIER_TOO_LONG,
        crate::logging::codes::lexical::STRING_TOO_LARGE,
        crate::logging::codes::lexical::COMMENT_TOO_LONG,
        crate::logging::codes::lexical::TOO_MANY_TOKENS,
    ];

    for code in &test_codes {
        if crate::logging::codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    if MAX_STRING_SIZE == 0 || MAX_IDENTIFIER_LENGTH == 0 || MAX_TOKEN_COUNT == 0 {
        return Err("Lexical limits cannot be zero".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tokenization() {
        assert!(validate_tokenization().is_ok());
    }

    #[test]
    fn test_tokenize_empty_source() {
        let output = tokenize("");
        assert!(!output.has_errors());
        assert_eq!(output.stream.len(), 1);
        assert!(output.stream.is_at_end());
    }
}
