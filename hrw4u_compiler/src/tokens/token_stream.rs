//! Token stream with trivia filtering and span-accurate navigation

use crate::{
    tokens::token::*,
    utils::{SourceMap, Span, Spanned},
};

/// A token with span information
pub type SpannedToken = Spanned<Token>;

/// Significant-token view over the full lexer output.
///
/// Comments stay in `all_tokens` so the source can be reproduced, but the
/// parser only walks the significant positions.
#[derive(Debug, Clone)]
pub struct TokenStream {
    all_tokens: Vec<SpannedToken>,
    /// Indices into `all_tokens` for significant tokens
    significant_indices: Vec<usize>,
    /// Current position in `significant_indices`
    position: usize,
    source_map: Option<SourceMap>,
}

impl TokenStream {
    pub fn new(tokens: Vec<SpannedToken>) -> Self {
        let mut stream = Self {
            all_tokens: tokens,
            significant_indices: Vec::new(),
            position: 0,
            source_map: None,
        };
        stream.rebuild_significant_indices();
        stream
    }

    pub fn with_source_map(tokens: Vec<SpannedToken>, source_map: SourceMap) -> Self {
        let mut stream = Self::new(tokens);
        stream.source_map = Some(source_map);
        stream
    }

    fn rebuild_significant_indices(&mut self) {
        self.significant_indices = self
            .all_tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.value.is_significant())
            .map(|(i, _)| i)
            .collect();
        self.position = 0;

        crate::log_debug!("Token stream built",
            "total_tokens" => self.all_tokens.len(),
            "significant_tokens" => self.significant_indices.len()
        );
    }

    // === CORE NAVIGATION ===

    pub fn current(&self) -> Option<&SpannedToken> {
        self.significant_indices
            .get(self.position)
            .and_then(|&original_index| self.all_tokens.get(original_index))
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.current().map(|spanned| &spanned.value)
    }

    pub fn current_span(&self) -> Option<Span> {
        self.current().map(|spanned| spanned.span)
    }

    /// Span of the current token, or of the last token when exhausted
    pub fn current_or_last_span(&self) -> Span {
        self.current_span()
            .or_else(|| self.previous_span())
            .unwrap_or_else(Span::dummy)
    }

    /// Span of the most recently consumed significant token
    pub fn previous_span(&self) -> Option<Span> {
        self.position
            .checked_sub(1)
            .and_then(|p| self.span_at_position(p))
    }

    pub fn peek(&self) -> Option<&SpannedToken> {
        self.peek_ahead(1)
    }

    pub fn peek_ahead(&self, n: usize) -> Option<&SpannedToken> {
        self.significant_indices
            .get(self.position + n)
            .and_then(|&original_index| self.all_tokens.get(original_index))
    }

    pub fn advance(&mut self) -> Option<&SpannedToken> {
        if self.position < self.significant_indices.len() {
            self.position += 1;
        }
        self.current()
    }

    /// True past the last token or on `Eof`
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_token(), None | Some(Token::Eof))
    }

    pub fn len(&self) -> usize {
        self.significant_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.significant_indices.is_empty()
    }

    pub fn span_at_position(&self, position: usize) -> Option<Span> {
        self.significant_indices
            .get(position)
            .and_then(|&original_index| self.all_tokens.get(original_index))
            .map(|spanned| spanned.span)
    }

    /// Span from the token at `start_position` to the last consumed token
    pub fn span_from(&self, start_position: usize) -> Span {
        match (self.span_at_position(start_position), self.previous_span()) {
            (Some(start), Some(end)) if end.start.offset >= start.start.offset => start.merge(end),
            (Some(start), _) => start,
            _ => self.current_or_last_span(),
        }
    }

    // === PARSER INTEGRATION ===

    /// Same variant as `expected`, ignoring payloads
    pub fn check_token(&self, expected: &Token) -> bool {
        self.current_token()
            .map(|token| std::mem::discriminant(token) == std::mem::discriminant(expected))
            .unwrap_or(false)
    }

    pub fn consume_if<F>(&mut self, predicate: F) -> Option<SpannedToken>
    where
        F: FnOnce(&Token) -> bool,
    {
        if let Some(token) = self.current_token() {
            if predicate(token) {
                let result = self.current().cloned();
                self.advance();
                return result;
            }
        }
        None
    }

    pub fn advance_if_matches(&mut self, expected: &Token) -> bool {
        if self.check_token(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_token(&mut self, expected: Token) -> Result<SpannedToken, TokenStreamError> {
        match self.current() {
            Some(current) if !matches!(current.value, Token::Eof) => {
                if std::mem::discriminant(&current.value) == std::mem::discriminant(&expected) {
                    let result = current.clone();
                    self.advance();
                    Ok(result)
                } else {
                    Err(TokenStreamError::UnexpectedToken {
                        expected: expected.describe(),
                        found: current.value.describe(),
                        span: current.span,
                    })
                }
            }
            _ => Err(TokenStreamError::UnexpectedEndOfStream {
                expected: expected.describe(),
                span: self.current_or_last_span(),
            }),
        }
    }

    pub fn save_position(&self) -> usize {
        self.position
    }

    pub fn restore_position(&mut self, saved_position: usize) {
        self.position = saved_position.min(self.significant_indices.len());
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining_count(&self) -> usize {
        self.significant_indices.len().saturating_sub(self.position)
    }

    pub fn iter_significant(&self) -> impl Iterator<Item = &SpannedToken> {
        self.significant_indices.iter().map(|&i| &self.all_tokens[i])
    }

    pub fn all_tokens(&self) -> &[SpannedToken] {
        &self.all_tokens
    }

    pub fn source_map(&self) -> Option<&SourceMap> {
        self.source_map.as_ref()
    }

    pub fn line_at_span(&self, span: Span) -> Option<&str> {
        self.source_map
            .as_ref()
            .and_then(|sm| sm.get_line(span.start().line))
    }

    pub fn diagnostic(&self) -> String {
        let current_info = match self.current() {
            Some(current) => format!("{} at {}", current.value.describe(), current.span),
            None => "<EOF>".to_string(),
        };
        format!(
            "TokenStream(pos: {}/{}, current: {})",
            self.position,
            self.significant_indices.len(),
            current_info
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenStreamError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("expected {expected}, but reached end of input")]
    UnexpectedEndOfStream { expected: String, span: Span },
}

impl TokenStreamError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } | Self::UnexpectedEndOfStream { span, .. } => *span,
        }
    }
}

/// Builds streams directly from tokens, positioned as if separated by spaces
#[derive(Debug, Default)]
pub struct TokenStreamBuilder {
    tokens: Vec<SpannedToken>,
    position: crate::utils::Position,
}

impl TokenStreamBuilder {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            position: crate::utils::Position::start(),
        }
    }

    pub fn push(mut self, token: Token) -> Self {
        let text = token.to_string();
        let start = self.position;
        let end = start.advance_str(&text);
        self.tokens.push(Spanned::new(token, Span::new(start, end)));
        self.position = end.advance(' ');
        self
    }

    pub fn build(mut self) -> TokenStream {
        let eof = Span::new(self.position, self.position);
        self.tokens.push(Spanned::new(Token::Eof, eof));
        TokenStream::new(self.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    #[test]
    fn test_comments_are_skipped() {
        let stream = TokenStreamBuilder::new()
            .push(ident("REMAP"))
            .push(Token::Comment(" note".into()))
            .push(Token::LeftBrace)
            .build();

        assert_eq!(stream.len(), 3);
        assert_eq!(stream.all_tokens().len(), 4);
        assert_eq!(stream.peek().map(|t| &t.value), Some(&Token::LeftBrace));
    }

    #[test]
    fn test_expect_token() {
        let mut stream = TokenStreamBuilder::new()
            .push(ident("f"))
            .push(Token::Semicolon)
            .build();

        assert!(stream.expect_token(Token::Identifier(String::new())).is_ok());
        let err = stream.expect_token(Token::Colon).unwrap_err();
        assert_eq!(err.to_string(), "expected ':', found ';'");

        stream.advance();
        assert!(stream.is_at_end());
        let err = stream.expect_token(Token::Semicolon).unwrap_err();
        assert!(matches!(err, TokenStreamError::UnexpectedEndOfStream { .. }));
    }

    #[test]
    fn test_span_from_and_restore() {
        let mut stream = TokenStreamBuilder::new()
            .push(ident("a"))
            .push(Token::Assign)
            .push(Token::Number("1".into()))
            .build();

        let start = stream.save_position();
        stream.advance();
        stream.advance();
        stream.advance();
        let span = stream.span_from(start);
        assert_eq!(span.start.offset, 0);
        assert_eq!(span.end.offset, 5);

        stream.restore_position(start);
        assert_eq!(stream.current_token(), Some(&ident("a")));
    }
}
