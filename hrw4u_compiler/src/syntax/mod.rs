//! Syntax analysis: token stream to AST
//!
//! Parsing never stops at the first error. [`parse_program`] always returns
//! a tree, together with every syntax error met while building it.

mod error;
mod parser;

pub use error::{SyntaxError, SyntaxResult};
pub use parser::{parse_tokens, Hrw4uParser, ParseOutput};

use crate::logging::codes;
use crate::tokens::TokenStream;
use crate::{log_debug, log_info};

/// Parse a token stream into a [`crate::grammar::Program`]
pub fn parse_program(token_stream: TokenStream) -> ParseOutput {
    log_debug!("Starting syntax analysis", "tokens" => token_stream.len());
    parse_tokens(token_stream)
}

/// Check that every syntax error code is registered with a description
pub fn init_syntax_logging() -> Result<(), String> {
    let test_codes = [
        codes::syntax::UNEXPECTED_TOKEN,
        codes::syntax::UNEXPECTED_EOF,
        codes::syntax::INVALID_SECTION,
        codes::syntax::VARS_NOT_FIRST,
        codes::syntax::MAX_DEPTH_EXCEEDED,
        codes::syntax::INVALID_STATEMENT,
        codes::syntax::UNCLOSED_BLOCK,
    ];

    for code in &test_codes {
        if crate::logging::codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Syntax error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    log_info!("Syntax module logging validation completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_codes_registered() {
        assert!(init_syntax_logging().is_ok());
    }

    #[test]
    fn test_empty_program() {
        let output = parse_program(crate::lexical::tokenize("  # nothing\n").stream);
        assert!(!output.has_errors());
        assert!(output.program.sections.is_empty());
    }
}
