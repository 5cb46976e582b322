//! State variable model and the per-compilation symbol table

pub mod error;
pub mod table;
pub mod types;

pub use error::{SymbolError, SymbolResult};
pub use table::{SymbolTable, ValidationReport};
pub use types::{SuffixGroup, Symbol, VarType};
