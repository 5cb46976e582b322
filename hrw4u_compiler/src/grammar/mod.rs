//! Grammar definitions for hrw4u

pub mod ast;
pub mod keywords;

// Re-export AST types
pub use ast::{nodes::*, Program};

// Re-export keywords
pub use keywords::{is_reserved_word, Keyword};
