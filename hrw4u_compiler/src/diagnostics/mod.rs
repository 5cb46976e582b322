//! Positioned compiler diagnostics and the per-compilation error collector
//!
//! A diagnostic renders as a header line followed, when the source line is
//! known, by the line itself and a caret under the 0-based column:
//!
//! ```text
//! rules.hrw4u:3:4: error: Unknown symbol: foo
//!    3 |     foo = bar;
//!      |     ^
//! ```

use crate::config::compile_time::logging::MAX_ERROR_COLLECTION;
use crate::logging::codes::{self, Code};
use crate::utils::{SourceMap, Span};
use std::fmt;
use std::fs;

/// A compiler error tied to a source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hrw4uError {
    pub filename: String,
    /// 1-based line
    pub line: u32,
    /// 0-based character column
    pub column: usize,
    pub message: String,
    pub source_line: Option<String>,
    pub code: Code,
}

impl Hrw4uError {
    pub fn new(filename: &str, line: u32, column: usize, message: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
            message: message.into(),
            source_line: None,
            code: codes::system::INTERNAL_ERROR,
        }
    }

    pub fn with_source_line(mut self, source_line: impl Into<String>) -> Self {
        self.source_line = Some(source_line.into());
        self
    }

    pub fn with_code(mut self, code: Code) -> Self {
        self.code = code;
        self
    }

    /// Header plus, when available, the source line and caret
    pub fn render(&self) -> String {
        let header = format!(
            "{}:{}:{}: error: {}",
            self.filename, self.line, self.column, self.message
        );

        let source_line = match &self.source_line {
            Some(line) => Some(line.clone()),
            None => read_line_from_file(&self.filename, self.line),
        };

        match source_line {
            Some(text) => format!(
                "{}\n{:>4} | {}\n     | {}^",
                header,
                self.line,
                text,
                " ".repeat(self.column)
            ),
            None => header,
        }
    }
}

impl fmt::Display for Hrw4uError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for Hrw4uError {}

fn read_line_from_file(filename: &str, line: u32) -> Option<String> {
    let content = fs::read_to_string(filename).ok()?;
    SourceMap::new(content).get_line(line).map(str::to_string)
}

/// Errors that know their own diagnostic code
pub trait DiagnosticCode {
    fn diagnostic_code(&self) -> Code;
}

/// Turn any error raised while visiting the node at `span` into a positioned
/// diagnostic carrying the offending source line
pub fn wrap_error<E>(filename: &str, span: Span, source: &SourceMap, err: &E) -> Hrw4uError
where
    E: std::error::Error + DiagnosticCode,
{
    let mut error = Hrw4uError::new(
        filename,
        span.start.line,
        span.start.zero_based_column(),
        err.to_string(),
    )
    .with_code(err.diagnostic_code());

    if let Some(line) = source.get_line(span.start.line) {
        error = error.with_source_line(line);
    }
    error
}

/// Ordered, append-only list of diagnostics for one compilation
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    errors: Vec<Hrw4uError>,
    dropped: usize,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error; beyond the collection limit errors are only counted
    pub fn add(&mut self, error: Hrw4uError) {
        crate::log_debug!("Collected diagnostic",
            "code" => error.code,
            "line" => error.line,
            "message" => error.message.as_str()
        );

        if self.errors.len() < MAX_ERROR_COLLECTION {
            self.errors.push(error);
        } else {
            self.dropped += 1;
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Hrw4uError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Hrw4uError> {
        self.errors
    }

    pub fn count_with_code(&self, code: Code) -> usize {
        self.errors.iter().filter(|e| e.code == code).count()
    }

    /// `Found N error(s):` followed by every rendered error
    pub fn summary(&self) -> String {
        let count = self.errors.len() + self.dropped;
        let noun = if count == 1 { "error" } else { "errors" };
        let mut out = format!("Found {} {}:", count, noun);

        for error in &self.errors {
            out.push('\n');
            out.push_str(&error.render());
        }

        if self.dropped > 0 {
            out.push_str(&format!("\n... {} more not shown", self.dropped));
        }
        out
    }
}
