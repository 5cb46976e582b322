//! Core lexical analyzer
//!
//! Tokenization never stops at the first problem: a bad character is
//! recorded and skipped, an unterminated literal is recorded and the rest of
//! its line dropped. Only exceeding the token budget ends the scan early.

use crate::config::compile_time::lexical::*;
use crate::grammar::keywords::Keyword;
use crate::logging::codes;
use crate::tokens::{is_identifier_char, is_identifier_start, Token, TokenStream};
use crate::utils::{Position, SourceMap, Span, Spanned};
use crate::{log_debug, log_success};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Invalid character: '{character}'")]
    InvalidCharacter { character: char },

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unterminated regular expression")]
    UnterminatedRegex,

    #[error("Invalid number format: '{text}'")]
    InvalidNumber { text: String },

    #[error("Identifier too long: {length} characters (max {MAX_IDENTIFIER_LENGTH})")]
    IdentifierTooLong { length: usize },

    #[error("String too large: {size} bytes (max {MAX_STRING_SIZE})")]
    StringTooLarge { size: usize },

    #[error("Comment too long: {length} characters (max {MAX_COMMENT_LENGTH})")]
    CommentTooLong { length: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize },
}

impl LexerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::InvalidCharacter { .. } => codes::lexical::INVALID_CHARACTER,
            LexerError::UnterminatedString => codes::lexical::UNTERMINATED_STRING,
            LexerError::UnterminatedRegex => codes::lexical::UNTERMINATED_REGEX,
            LexerError::InvalidNumber { .. } => codes::lexical::INVALID_NUMBER,
            LexerError::IdentifierTooLong { .. } => codes::lexical::IDENTIFIER_TOO_LONG,
            LexerError::StringTooLarge { .. } => codes::lexical::STRING_TOO_LARGE,
            LexerError::CommentTooLong { .. } => codes::lexical::COMMENT_TOO_LONG,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }
}

impl crate::diagnostics::DiagnosticCode for LexerError {
    fn diagnostic_code(&self) -> crate::logging::Code {
        self.error_code()
    }
}

#[derive(Debug, Default, Clone)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub keyword_tokens: usize,
    pub identifier_tokens: usize,
    pub literal_tokens: usize,
    pub operator_tokens: usize,
    pub comment_count: usize,
    pub invalid_chars: usize,
    pub max_string_length: usize,
}

impl LexicalMetrics {
    fn record_token(&mut self, token: &Token) {
        use crate::tokens::TokenClass;

        self.total_tokens += 1;
        match token.class() {
            TokenClass::Keyword => self.keyword_tokens += 1,
            TokenClass::Identifier => self.identifier_tokens += 1,
            TokenClass::Literal => self.literal_tokens += 1,
            TokenClass::Operator => self.operator_tokens += 1,
            TokenClass::Trivia => self.comment_count += 1,
            TokenClass::Punctuation | TokenClass::End => {}
        }
    }
}

/// Lexer output: the token stream plus every error met along the way
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub stream: TokenStream,
    pub errors: Vec<Spanned<LexerError>>,
}

impl LexOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

struct Cursor {
    chars: Vec<char>,
    index: usize,
    pos: Position,
}

impl Cursor {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            pos: Position::start(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos = self.pos.advance(ch);
        self.index += 1;
        Some(ch)
    }

    fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            text.push(ch);
            self.bump();
        }
        text
    }

    fn skip_to_line_end(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }
    }
}

pub struct LexicalAnalyzer {
    metrics: LexicalMetrics,
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self {
            metrics: LexicalMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn tokenize(&mut self, source: &str) -> LexOutput {
        self.metrics = LexicalMetrics::default();

        log_debug!("Starting lexical analysis",
            "bytes" => source.len(),
            "max_tokens_allowed" => MAX_TOKEN_COUNT
        );

        let mut cursor = Cursor::new(source);
        let mut tokens: Vec<Spanned<Token>> = Vec::new();
        let mut errors: Vec<Spanned<LexerError>> = Vec::new();
        let mut expect_regex = false;

        loop {
            while matches!(cursor.peek(), Some(c) if c.is_whitespace()) {
                cursor.bump();
            }

            let start = cursor.pos;
            let Some(ch) = cursor.peek() else {
                break;
            };

            if tokens.len() >= MAX_TOKEN_COUNT {
                errors.push(Spanned::new(
                    LexerError::TooManyTokens {
                        count: tokens.len() + 1,
                    },
                    Span::single(start),
                ));
                break;
            }

            if expect_regex && ch == '/' {
                expect_regex = false;
                match self.scan_regex(&mut cursor) {
                    Ok(text) => {
                        self.push(&mut tokens, Token::Regex(text), start, cursor.pos);
                    }
                    Err(err) => errors.push(Spanned::new(err, Span::new(start, cursor.pos))),
                }
                continue;
            }
            expect_regex = false;

            let token = match ch {
                '#' => {
                    cursor.bump();
                    let text = cursor.eat_while(|c| c != '\n');
                    let length = text.trim_end_matches('\r').chars().count();
                    if length > MAX_COMMENT_LENGTH {
                        errors.push(Spanned::new(
                            LexerError::CommentTooLong { length },
                            Span::new(start, cursor.pos),
                        ));
                    }
                    Token::Comment(text.trim_end_matches('\r').to_string())
                }
                '"' => match self.scan_string(&mut cursor) {
                    Ok(text) => {
                        if text.len() > MAX_STRING_SIZE {
                            errors.push(Spanned::new(
                                LexerError::StringTooLarge { size: text.len() },
                                Span::new(start, cursor.pos),
                            ));
                        }
                        Token::StringLiteral(text)
                    }
                    Err(err) => {
                        errors.push(Spanned::new(err, Span::new(start, cursor.pos)));
                        continue;
                    }
                },
                c if c.is_ascii_digit() => {
                    let text = cursor.eat_while(|c| c.is_ascii_hexdigit() || matches!(c, '.' | ':' | '/'));
                    if text.chars().all(|c| c.is_ascii_digit()) {
                        Token::Number(text)
                    } else if text.contains(|c| matches!(c, '.' | ':' | '/')) {
                        Token::IpLiteral(text)
                    } else {
                        errors.push(Spanned::new(
                            LexerError::InvalidNumber { text },
                            Span::new(start, cursor.pos),
                        ));
                        continue;
                    }
                }
                c if is_identifier_start(c) => {
                    let word = cursor.eat_while(is_identifier_char);
                    let length = word.chars().count();
                    if length > MAX_IDENTIFIER_LENGTH {
                        errors.push(Spanned::new(
                            LexerError::IdentifierTooLong { length },
                            Span::new(start, cursor.pos),
                        ));
                    }
                    match Keyword::from_word(&word) {
                        Some(keyword) => Token::Keyword(keyword),
                        None => Token::Identifier(word),
                    }
                }
                _ => match self.scan_operator(&mut cursor) {
                    Some(token) => {
                        expect_regex = matches!(token, Token::Tilde | Token::NotTilde);
                        token
                    }
                    None => {
                        let bad = cursor.bump().unwrap_or(ch);
                        self.metrics.invalid_chars += 1;
                        crate::log_error!(codes::lexical::INVALID_CHARACTER, "Invalid character",
                            span = Span::new(start, cursor.pos),
                            "character" => bad
                        );
                        errors.push(Spanned::new(
                            LexerError::InvalidCharacter { character: bad },
                            Span::new(start, cursor.pos),
                        ));
                        continue;
                    }
                },
            };

            if let Token::StringLiteral(text) = &token {
                self.metrics.max_string_length = self.metrics.max_string_length.max(text.len());
            }
            self.push(&mut tokens, token, start, cursor.pos);

            if expect_regex {
                cursor.skip_inline_whitespace();
            }
        }

        let eof = cursor.pos;
        tokens.push(Spanned::new(Token::Eof, Span::new(eof, eof)));

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization complete",
            "tokens" => self.metrics.total_tokens,
            "errors" => errors.len()
        );

        LexOutput {
            stream: TokenStream::with_source_map(tokens, SourceMap::new(source.to_string())),
            errors,
        }
    }

    fn push(&mut self, tokens: &mut Vec<Spanned<Token>>, token: Token, start: Position, end: Position) {
        self.metrics.record_token(&token);
        tokens.push(Spanned::new(token, Span::new(start, end)));
    }

    /// Reads `"..."`; backslash escapes are kept verbatim
    fn scan_string(&mut self, cursor: &mut Cursor) -> Result<String, LexerError> {
        cursor.bump();
        let mut text = String::new();
        loop {
            match cursor.peek() {
                None | Some('\n') => return Err(LexerError::UnterminatedString),
                Some('"') => {
                    cursor.bump();
                    return Ok(text);
                }
                Some('\\') => {
                    text.push('\\');
                    cursor.bump();
                    match cursor.peek() {
                        None | Some('\n') => return Err(LexerError::UnterminatedString),
                        Some(escaped) => {
                            text.push(escaped);
                            cursor.bump();
                        }
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    cursor.bump();
                }
            }
        }
    }

    /// Reads `/.../` including both delimiters
    fn scan_regex(&mut self, cursor: &mut Cursor) -> Result<String, LexerError> {
        let mut text = String::new();
        if let Some(open) = cursor.bump() {
            text.push(open);
        }
        loop {
            match cursor.peek() {
                None | Some('\n') => {
                    cursor.skip_to_line_end();
                    return Err(LexerError::UnterminatedRegex);
                }
                Some('\\') => {
                    text.push('\\');
                    cursor.bump();
                    if let Some(escaped) = cursor.peek().filter(|c| *c != '\n') {
                        text.push(escaped);
                        cursor.bump();
                    }
                }
                Some('/') => {
                    text.push('/');
                    cursor.bump();
                    return Ok(text);
                }
                Some(ch) => {
                    text.push(ch);
                    cursor.bump();
                }
            }
        }
    }

    fn scan_operator(&mut self, cursor: &mut Cursor) -> Option<Token> {
        let ch = cursor.peek()?;
        let next = cursor.peek_next();

        let (token, width) = match (ch, next) {
            ('=', Some('=')) => (Token::EqualEqual, 2),
            ('=', _) => (Token::Assign, 1),
            ('!', Some('=')) => (Token::NotEqual, 2),
            ('!', Some('~')) => (Token::NotTilde, 2),
            ('!', _) => (Token::Bang, 1),
            ('+', Some('=')) => (Token::PlusAssign, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('~', _) => (Token::Tilde, 1),
            ('>', _) => (Token::Greater, 1),
            ('<', _) => (Token::Less, 1),
            ('{', _) => (Token::LeftBrace, 1),
            ('}', _) => (Token::RightBrace, 1),
            ('(', _) => (Token::LeftParen, 1),
            (')', _) => (Token::RightParen, 1),
            ('[', _) => (Token::LeftBracket, 1),
            (']', _) => (Token::RightBracket, 1),
            (';', _) => (Token::Semicolon, 1),
            (':', _) => (Token::Colon, 1),
            (',', _) => (Token::Comma, 1),
            _ => return None,
        };

        for _ in 0..width {
            cursor.bump();
        }
        Some(token)
    }
}
