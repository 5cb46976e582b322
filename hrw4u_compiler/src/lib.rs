// Internal modules
pub mod batch;
pub mod config;
pub mod debug;
pub mod diagnostics;
pub mod file_processor;
pub mod grammar;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod reverse;
pub mod symbols;
pub mod syntax;
pub mod tables;
pub mod tokens;
pub mod utils;
pub mod visitor;

// Re-export key types for library consumers
pub use batch::{BatchConfig, BatchError, BatchResults};
pub use diagnostics::{ErrorCollector, Hrw4uError};
pub use pipeline::{
    compile_file, compile_source, decompile_file, decompile_source, Compilation, CompileOutput,
    PipelineError,
};
pub use reverse::Decompilation;
pub use symbols::{SymbolTable, ValidationReport};
