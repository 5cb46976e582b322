//! Reserved words of the hrw4u language
//!
//! Section names (including `VARS`) are ordinary identifiers; the parser
//! classifies them by position.
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    If,
    Elif,
    Else,
    Break,
    In,
    With,
    True,
    False,
}

impl Keyword {
    pub const ALL: [Keyword; 8] = [
        Keyword::If,
        Keyword::Elif,
        Keyword::Else,
        Keyword::Break,
        Keyword::In,
        Keyword::With,
        Keyword::True,
        Keyword::False,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::Break => "break",
            Keyword::In => "in",
            Keyword::With => "with",
            Keyword::True => "true",
            Keyword::False => "false",
        }
    }

    /// Keywords are case-sensitive
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == word)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_reserved_word(word: &str) -> bool {
    Keyword::from_word(word).is_some()
}
