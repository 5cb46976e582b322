//! Reading hrw4u and rule-text input files under the compile-time limits

use crate::config::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, MAX_LINE_COUNT_FOR_ANALYSIS,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Extension expected on forward-compiler input
pub const HRW4U_EXTENSION: &str = "hrw4u";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileProcessorError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file extension: expected .hrw4u, found {extension:?}")]
    InvalidExtension { extension: Option<String> },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("File is empty: {path}")]
    EmptyFile { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid UTF-8 encoding in file: {path}")]
    InvalidEncoding { path: String },

    #[error("I/O error reading file: {message}")]
    IoError { message: String },

    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },

    #[error("File exceeds maximum line count: {lines} (max: {max_lines})")]
    TooManyLines { lines: usize, max_lines: usize },
}

impl FileProcessorError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::FileNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            Self::InvalidExtension { .. } => codes::file_processing::INVALID_EXTENSION,
            Self::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            Self::EmptyFile { .. } => codes::file_processing::EMPTY_FILE,
            Self::PermissionDenied { .. } => codes::file_processing::PERMISSION_DENIED,
            Self::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            Self::IoError { .. } => codes::file_processing::IO_ERROR,
            Self::InvalidPath { .. } => codes::file_processing::INVALID_PATH,
            Self::TooManyLines { .. } => codes::file_processing::TOO_MANY_LINES,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    fn from_io(err: &std::io::Error, path: &Path) -> Self {
        let path_str = path.display().to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::FileNotFound { path: path_str },
            ErrorKind::PermissionDenied => Self::PermissionDenied { path: path_str },
            ErrorKind::InvalidData => Self::InvalidEncoding { path: path_str },
            _ => Self::IoError {
                message: format!("'{}': {}", path_str, err),
            },
        }
    }
}

impl crate::diagnostics::DiagnosticCode for FileProcessorError {
    fn diagnostic_code(&self) -> crate::logging::Code {
        self.error_code()
    }
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size: u64,
    pub extension: Option<String>,
    pub line_count: usize,
}

impl FileMetadata {
    pub fn is_hrw4u_file(&self) -> bool {
        self.extension.as_deref() == Some(HRW4U_EXTENSION)
    }

    pub fn is_large_file(&self) -> bool {
        self.size > LARGE_FILE_THRESHOLD
    }
}

/// File contents plus what was learned while reading them
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub source: String,
    pub metadata: FileMetadata,
    pub processing_duration: Duration,
}

impl SourceFile {
    /// Path as given by the caller, used as the diagnostic filename
    pub fn display_name(&self) -> String {
        self.metadata.path.display().to_string()
    }
}

pub struct FileProcessor {
    pub require_hrw4u_extension: bool,
    pub enable_performance_logging: bool,
}

impl FileProcessor {
    pub fn new() -> Self {
        Self {
            require_hrw4u_extension: false,
            enable_performance_logging: true,
        }
    }

    pub fn from_preferences(prefs: &FileProcessorPreferences) -> Self {
        Self {
            require_hrw4u_extension: prefs.require_hrw4u_extension,
            enable_performance_logging: prefs.enable_performance_logging,
        }
    }

    pub fn with_extension_required(mut self, required: bool) -> Self {
        self.require_hrw4u_extension = required;
        self
    }

    pub fn with_performance_logging(mut self, enabled: bool) -> Self {
        self.enable_performance_logging = enabled;
        self
    }

    pub fn max_file_size() -> u64 {
        MAX_FILE_SIZE
    }

    /// Read a file, enforcing size, encoding and line limits
    pub fn process_file(&self, file_path: &Path) -> Result<SourceFile, FileProcessorError> {
        let start = Instant::now();
        let display = file_path.display().to_string();

        log_debug!("Starting file processing", "file" => display.as_str());

        let size = self.check_path(file_path, &display)?;
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        if size > MAX_FILE_SIZE {
            return Err(self.fail(
                FileProcessorError::FileTooLarge {
                    size,
                    max_size: MAX_FILE_SIZE,
                },
                &display,
            ));
        }
        if size == 0 {
            return Err(self.fail(FileProcessorError::EmptyFile { path: display.clone() }, &display));
        }
        if self.require_hrw4u_extension && extension.as_deref() != Some(HRW4U_EXTENSION) {
            return Err(self.fail(FileProcessorError::InvalidExtension { extension }, &display));
        }

        let source = fs::read_to_string(file_path)
            .map_err(|e| self.fail(FileProcessorError::from_io(&e, file_path), &display))?;

        let line_count = source.lines().count();
        if line_count > MAX_LINE_COUNT_FOR_ANALYSIS {
            return Err(self.fail(
                FileProcessorError::TooManyLines {
                    lines: line_count,
                    max_lines: MAX_LINE_COUNT_FOR_ANALYSIS,
                },
                &display,
            ));
        }

        let result = SourceFile {
            source,
            metadata: FileMetadata {
                path: file_path.to_path_buf(),
                size,
                extension,
                line_count,
            },
            processing_duration: start.elapsed(),
        };
        self.log_processing_success(&result, &display);
        Ok(result)
    }

    fn check_path(&self, path: &Path, display: &str) -> Result<u64, FileProcessorError> {
        if path.as_os_str().is_empty() {
            return Err(self.fail(
                FileProcessorError::InvalidPath {
                    path: display.to_string(),
                },
                display,
            ));
        }

        let metadata = fs::metadata(path)
            .map_err(|e| self.fail(FileProcessorError::from_io(&e, path), display))?;

        if !metadata.is_file() {
            return Err(self.fail(
                FileProcessorError::InvalidPath {
                    path: display.to_string(),
                },
                display,
            ));
        }
        Ok(metadata.len())
    }

    fn fail(&self, error: FileProcessorError, file: &str) -> FileProcessorError {
        let detail = error.to_string();
        log_error!(error.error_code(), "File processing failed",
            "file" => file,
            "detail" => detail.as_str());
        error
    }

    fn log_processing_success(&self, result: &SourceFile, file: &str) {
        let size_str = result.metadata.size.to_string();
        let lines_str = result.metadata.line_count.to_string();

        if self.enable_performance_logging {
            let duration_str = format!("{:.2}", result.processing_duration.as_secs_f64() * 1000.0);
            let large_str = result.metadata.is_large_file().to_string();
            log_success!(
                codes::success::FILE_PROCESSING_SUCCESS,
                "File read with performance metrics",
                "file" => file,
                "size_bytes" => size_str.as_str(),
                "lines" => lines_str.as_str(),
                "duration_ms" => duration_str.as_str(),
                "is_large_file" => large_str.as_str()
            );
        } else {
            log_success!(
                codes::success::FILE_PROCESSING_SUCCESS,
                "File read",
                "file" => file,
                "size_bytes" => size_str.as_str(),
                "lines" => lines_str.as_str()
            );
        }
    }
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_process_valid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("remap.hrw4u");
        let content = "REMAP {\n    inbound.req.X-Foo = \"bar\";\n}\n";
        fs::write(&path, content).unwrap();

        let result = FileProcessor::new().process_file(&path).unwrap();
        assert_eq!(result.source, content);
        assert_eq!(result.metadata.line_count, 3);
        assert!(result.metadata.is_hrw4u_file());
        assert!(!result.metadata.is_large_file());
    }

    #[test]
    fn test_file_not_found() {
        let dir = tempdir().unwrap();
        let result = FileProcessor::new().process_file(&dir.path().join("missing.hrw4u"));
        assert_matches!(result, Err(FileProcessorError::FileNotFound { .. }));
    }

    #[test]
    fn test_directory_is_invalid_path() {
        let dir = tempdir().unwrap();
        let result = FileProcessor::new().process_file(dir.path());
        assert_matches!(result, Err(FileProcessorError::InvalidPath { .. }));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.hrw4u");
        fs::write(&path, "").unwrap();

        let result = FileProcessor::new().process_file(&path);
        assert_matches!(result, Err(FileProcessorError::EmptyFile { .. }));
    }

    #[test]
    fn test_extension_requirement() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.conf");
        fs::write(&path, "cond %{REMAP_PSEUDO_HOOK} [AND]\n").unwrap();

        assert!(FileProcessor::new().process_file(&path).is_ok());
        let strict = FileProcessor::new().with_extension_required(true);
        assert_matches!(
            strict.process_file(&path),
            Err(FileProcessorError::InvalidExtension { extension: Some(ext) }) if ext == "conf"
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.hrw4u");
        fs::write(&path, [0x52, 0x45, 0xff, 0xfe, 0x0a]).unwrap();

        let result = FileProcessor::new().process_file(&path);
        assert_matches!(result, Err(FileProcessorError::InvalidEncoding { .. }));
    }

    #[test]
    fn test_too_many_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.hrw4u");
        fs::write(&path, "\n".repeat(MAX_LINE_COUNT_FOR_ANALYSIS + 1)).unwrap();

        let result = FileProcessor::new()
            .with_performance_logging(false)
            .process_file(&path);
        assert_matches!(
            result,
            Err(FileProcessorError::TooManyLines { max_lines, .. }) if max_lines == MAX_LINE_COUNT_FOR_ANALYSIS
        );
    }

    #[test]
    fn test_error_codes() {
        let error = FileProcessorError::TooManyLines {
            lines: 10,
            max_lines: 5,
        };
        assert_eq!(error.error_code().as_str(), "E013");
        let error = FileProcessorError::FileNotFound {
            path: "x.hrw4u".into(),
        };
        assert_eq!(error.error_code().as_str(), "E005");
        assert_eq!(error.category(), "FileProcessing");
        assert!(!error.requires_halt());
    }

    #[test]
    fn test_from_preferences() {
        let prefs = FileProcessorPreferences {
            require_hrw4u_extension: true,
            enable_performance_logging: false,
        };
        let processor = FileProcessor::from_preferences(&prefs);
        assert!(processor.require_hrw4u_extension);
        assert!(!processor.enable_performance_logging);
    }
}
