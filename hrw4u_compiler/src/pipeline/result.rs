use super::PipelineError;
use crate::diagnostics::ErrorCollector;
use crate::reverse::Decompilation;
use crate::symbols::SymbolTable;
use std::time::Duration;

/// Everything one forward compilation produced, successful or not
#[derive(Debug)]
pub struct Compilation {
    pub filename: String,
    pub lines: Vec<String>,
    pub errors: ErrorCollector,
    pub symbols: SymbolTable,
    pub duration: Duration,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    /// Success only when no diagnostic was collected
    pub fn into_result(self) -> Result<CompileOutput, PipelineError> {
        if self.errors.has_errors() {
            return Err(PipelineError::CompilationFailed {
                error_count: self.errors.len(),
                summary: self.errors.summary(),
            });
        }
        Ok(CompileOutput {
            lines: self.lines,
            symbols: self.symbols,
        })
    }
}

#[derive(Debug)]
pub struct CompileOutput {
    pub lines: Vec<String>,
    pub symbols: SymbolTable,
}

impl CompileOutput {
    /// Rule text, one line per entry, newline terminated
    pub fn text(&self) -> String {
        render_lines(&self.lines)
    }
}

pub(super) fn render_lines(lines: &[String]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

impl Decompilation {
    pub fn into_result(self) -> Result<String, PipelineError> {
        if self.errors.has_errors() {
            return Err(PipelineError::DecompilationFailed {
                error_count: self.errors.len(),
                summary: self.errors.summary(),
            });
        }
        Ok(self.source)
    }
}
