//! Token definitions for the hrw4u lexer
//!
//! Operators and punctuation each get a dedicated variant. Literal text is
//! kept verbatim so that code generation can reproduce it exactly.
use crate::grammar::keywords::Keyword;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Keyword(Keyword),

    /// Names, including dotted table paths such as `inbound.req.X-Foo`
    Identifier(String),

    // Literals
    /// Double-quoted string, content without the quotes, escapes untouched
    StringLiteral(String),
    Number(String),
    /// Address or CIDR literal such as `10.0.0.0/8`
    IpLiteral(String),
    /// `/.../` including both slashes
    Regex(String),

    // Punctuation
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,
    Colon,
    Comma,

    // Operators
    Assign,     // =
    PlusAssign, // +=
    EqualEqual, // ==
    NotEqual,   // !=
    Greater,    // >
    Less,       // <
    Tilde,      // ~
    NotTilde,   // !~
    Bang,       // !
    AndAnd,     // &&
    OrOr,       // ||

    /// `#` to end of line, text after the `#`
    Comment(String),
    Eof,
}

/// Coarse grouping used for metrics and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Keyword,
    Identifier,
    Literal,
    Punctuation,
    Operator,
    Trivia,
    End,
}

impl Token {
    pub fn class(&self) -> TokenClass {
        match self {
            Token::Keyword(_) => TokenClass::Keyword,
            Token::Identifier(_) => TokenClass::Identifier,
            Token::StringLiteral(_) | Token::Number(_) | Token::IpLiteral(_) | Token::Regex(_) => {
                TokenClass::Literal
            }
            Token::LeftBrace
            | Token::RightBrace
            | Token::LeftParen
            | Token::RightParen
            | Token::LeftBracket
            | Token::RightBracket
            | Token::Semicolon
            | Token::Colon
            | Token::Comma => TokenClass::Punctuation,
            Token::Assign
            | Token::PlusAssign
            | Token::EqualEqual
            | Token::NotEqual
            | Token::Greater
            | Token::Less
            | Token::Tilde
            | Token::NotTilde
            | Token::Bang
            | Token::AndAnd
            | Token::OrOr => TokenClass::Operator,
            Token::Comment(_) => TokenClass::Trivia,
            Token::Eof => TokenClass::End,
        }
    }

    /// Whether the parser sees this token
    pub fn is_significant(&self) -> bool {
        !matches!(self.class(), TokenClass::Trivia)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Source form, as it appears in diagnostics
    pub fn describe(&self) -> String {
        match self {
            Token::Keyword(k) => format!("'{}'", k),
            Token::Identifier(name) => format!("identifier '{}'", name),
            Token::StringLiteral(s) => format!("string \"{}\"", s),
            Token::Number(n) => format!("number {}", n),
            Token::IpLiteral(ip) => format!("address {}", ip),
            Token::Regex(re) => format!("regex {}", re),
            Token::Comment(_) => "comment".to_string(),
            Token::Eof => "end of file".to_string(),
            other => format!("'{}'", other),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(k) => write!(f, "{}", k),
            Token::Identifier(s) | Token::Number(s) | Token::IpLiteral(s) | Token::Regex(s) => {
                f.write_str(s)
            }
            Token::StringLiteral(s) => write!(f, "\"{}\"", s),
            Token::LeftBrace => f.write_str("{"),
            Token::RightBrace => f.write_str("}"),
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::Semicolon => f.write_str(";"),
            Token::Colon => f.write_str(":"),
            Token::Comma => f.write_str(","),
            Token::Assign => f.write_str("="),
            Token::PlusAssign => f.write_str("+="),
            Token::EqualEqual => f.write_str("=="),
            Token::NotEqual => f.write_str("!="),
            Token::Greater => f.write_str(">"),
            Token::Less => f.write_str("<"),
            Token::Tilde => f.write_str("~"),
            Token::NotTilde => f.write_str("!~"),
            Token::Bang => f.write_str("!"),
            Token::AndAnd => f.write_str("&&"),
            Token::OrOr => f.write_str("||"),
            Token::Comment(text) => write!(f, "#{}", text),
            Token::Eof => f.write_str("<eof>"),
        }
    }
}

/// Characters allowed after the first character of an identifier
pub fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-' | '@')
}

pub fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || matches!(ch, '_' | '@')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_is_not_significant() {
        assert!(!Token::Comment(" note".into()).is_significant());
        assert!(Token::Eof.is_significant());
        assert!(Token::Semicolon.is_significant());
    }

    #[test]
    fn test_display_and_describe() {
        assert_eq!(Token::NotTilde.to_string(), "!~");
        assert_eq!(Token::StringLiteral("a b".into()).to_string(), "\"a b\"");
        assert_eq!(Token::Keyword(Keyword::Elif).describe(), "'elif'");
        assert_eq!(Token::RightBrace.describe(), "'}'");
        assert_eq!(Token::Eof.describe(), "end of file");
    }

    #[test]
    fn test_identifier_chars() {
        assert!(is_identifier_start('@'));
        assert!(!is_identifier_start('1'));
        assert!("inbound.req.X-Foo".chars().all(is_identifier_char));
    }
}
