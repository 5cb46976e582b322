//! Token system for hrw4u lexical analysis
//!
//! - [`Token`]: every token kind the lexer produces
//! - [`TokenStream`]: significant-token navigation for the parser, with
//!   comments kept aside as trivia
//! - [`SpannedToken`]: a token with its source span

pub mod token;
pub mod token_stream;

pub use token::{is_identifier_char, is_identifier_start, Token, TokenClass};
pub use token_stream::{SpannedToken, TokenStream, TokenStreamBuilder, TokenStreamError};

pub use crate::utils::{Position, SourceMap, Span, Spanned};
