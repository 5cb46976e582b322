//! Whole-file compilation in both directions
//!
//! Forward: text -> tokens -> AST -> rule lines. Lexer and parser errors are
//! collected and code generation still runs over whatever tree was built, so
//! one pass reports every problem. Success is decided at the end by
//! [`Compilation::into_result`].

mod error;
mod result;

pub use error::PipelineError;
pub use result::{Compilation, CompileOutput};

use crate::config::runtime::{CompilerPreferences, FileProcessorPreferences};
use crate::debug::Dbg;
use crate::diagnostics::{wrap_error, ErrorCollector};
use crate::file_processor::FileProcessor;
use crate::logging::{self, codes};
use crate::reverse::{self, Decompilation};
use crate::symbols::SymbolTable;
use crate::utils::SourceMap;
use crate::visitor::CodeGenerator;
use crate::{log_debug, log_info, log_performance, log_success};
use std::path::Path;
use std::time::Instant;

/// Compile hrw4u source text; diagnostics name `filename`
pub fn compile_source(source: &str, filename: &str, prefs: &CompilerPreferences) -> Compilation {
    let started = Instant::now();
    let source_map = SourceMap::new(source.to_string());
    let mut errors = ErrorCollector::new();
    let mut symbols = SymbolTable::new();
    let dbg = Dbg::new(prefs.debug_tracing, prefs.trace_indent);

    log_debug!("Stage 1: lexical analysis", "file" => filename);
    let lexed = crate::lexical::tokenize(source);
    for err in &lexed.errors {
        errors.add(wrap_error(filename, err.span, &source_map, &err.value));
    }
    log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization finished",
        "file" => filename,
        "tokens" => lexed.stream.len(),
        "errors" => lexed.errors.len());

    log_debug!("Stage 2: syntax analysis", "file" => filename);
    let parsed = crate::syntax::parse_program(lexed.stream);
    for err in &parsed.errors {
        errors.add(wrap_error(filename, err.span(), &source_map, err));
    }
    log_success!(codes::success::PARSE_COMPLETE, "Parse finished",
        "file" => filename,
        "sections" => parsed.program.sections.len(),
        "errors" => parsed.errors.len());

    log_debug!("Stage 3: code generation", "file" => filename);
    let lines = CodeGenerator::new(
        filename,
        &source_map,
        &mut symbols,
        &mut errors,
        &dbg,
        prefs,
    )
    .generate(&parsed.program);

    let duration = started.elapsed();
    log_performance!(codes::success::OPERATION_COMPLETED_SUCCESSFULLY, "Compilation finished",
        duration = duration,
        "file" => filename,
        "lines" => lines.len(),
        "errors" => errors.len());

    Compilation {
        filename: filename.to_string(),
        lines,
        errors,
        symbols,
        duration,
    }
}

/// Read and compile one hrw4u file
pub fn compile_file(
    path: &Path,
    file_prefs: &FileProcessorPreferences,
    prefs: &CompilerPreferences,
) -> Result<Compilation, PipelineError> {
    logging::with_file_context(path.to_path_buf(), 0, || {
        log_info!("Compiling file", "file" => path.display());
        let file = FileProcessor::from_preferences(file_prefs).process_file(path)?;
        Ok(compile_source(&file.source, &file.display_name(), prefs))
    })
}

/// Reverse compile rule text back into hrw4u
pub fn decompile_source(text: &str, filename: &str) -> Decompilation {
    log_debug!("Reverse compilation", "file" => filename);
    reverse::decompile(text, filename)
}

/// Read and reverse compile one rule file; the `.hrw4u` extension is never required
pub fn decompile_file(path: &Path) -> Result<Decompilation, PipelineError> {
    logging::with_file_context(path.to_path_buf(), 0, || {
        log_info!("Reverse compiling file", "file" => path.display());
        let file = FileProcessor::new().process_file(path)?;
        Ok(decompile_source(&file.source, &file.display_name()))
    })
}
