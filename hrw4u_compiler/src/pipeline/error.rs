use crate::file_processor::FileProcessorError;
use crate::logging::codes::{self, Code};

/// Failure of a whole compilation, in either direction
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File processing failed: {0}")]
    FileProcessing(#[from] FileProcessorError),

    /// Diagnostics were collected; `summary` is the rendered list
    #[error("{summary}")]
    CompilationFailed { error_count: usize, summary: String },

    #[error("{summary}")]
    DecompilationFailed { error_count: usize, summary: String },
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::FileProcessing(inner) => inner.error_code(),
            Self::CompilationFailed { .. } | Self::DecompilationFailed { .. } => {
                codes::pipeline::COMPILATION_FAILED
            }
        }
    }

    pub fn error_count(&self) -> usize {
        match self {
            Self::FileProcessing(_) => 1,
            Self::CompilationFailed { error_count, .. }
            | Self::DecompilationFailed { error_count, .. } => *error_count,
        }
    }
}
