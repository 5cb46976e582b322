//! Directory-wide compilation of hrw4u files
//!
//! Files are discovered with `walkdir`, sorted, and split across worker
//! threads. Every file gets its own compilation; nothing but the global
//! logger is shared between workers.

use crate::config::compile_time::batch_processing::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::config::runtime::{CompilerPreferences, FileProcessorPreferences};
use crate::file_processor::HRW4U_EXTENSION;
use crate::logging::{self, codes, Code};
use crate::pipeline::{self, CompileOutput, PipelineError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_threads: usize,
    pub recursive: bool,
    pub fail_fast: bool,
    pub file_preferences: FileProcessorPreferences,
    pub compiler_preferences: CompilerPreferences,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: thread::available_parallelism()
                .map(|n| n.get().min(MAX_WORKER_THREADS))
                .unwrap_or(4),
            recursive: true,
            fail_fast: false,
            file_preferences: FileProcessorPreferences::default(),
            compiler_preferences: CompilerPreferences::default(),
        }
    }
}

impl BatchConfig {
    /// Thread count actually used: at least one, at most the build limit
    pub fn effective_threads(&self) -> usize {
        self.max_threads.clamp(1, MAX_WORKER_THREADS)
    }
}

#[derive(Debug, Default)]
pub struct BatchResults {
    pub successful_files: Vec<(PathBuf, CompileOutput)>,
    pub failed_files: Vec<(PathBuf, PipelineError)>,
    pub processing_duration: Duration,
    pub files_discovered: usize,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files_processed(&self) -> usize {
        self.successful_files.len() + self.failed_files.len()
    }

    pub fn success_count(&self) -> usize {
        self.successful_files.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_files.len()
    }

    pub fn add_success(&mut self, file_path: PathBuf, output: CompileOutput) {
        self.successful_files.push((file_path, output));
    }

    pub fn add_failure(&mut self, file_path: PathBuf, error: PipelineError) {
        self.failed_files.push((file_path, error));
    }

    /// Workers finish in any order; restore path order for reporting
    fn sort(&mut self) {
        self.successful_files.sort_by(|a, b| a.0.cmp(&b.0));
        self.failed_files.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch compilation completed: {} of {} files processed, {} successful, {} failed, {:.2}s total",
            self.files_processed(),
            self.files_discovered,
            self.success_count(),
            self.failure_count(),
            self.processing_duration.as_secs_f64()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No .hrw4u files found in directory: {path}")]
    NoFilesFound { path: String },

    #[error("Too many files found: {count} (max: {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("IO error during directory traversal: {error}")]
    IoError { error: String },

    #[error("Worker thread failed: {message}")]
    WorkerFailure { message: String },
}

impl BatchError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::DirectoryNotFound { .. } => codes::batch::DIRECTORY_NOT_FOUND,
            Self::NoFilesFound { .. } => codes::batch::NO_FILES_FOUND,
            Self::TooManyFiles { .. } => codes::batch::TOO_MANY_FILES,
            Self::IoError { .. } => codes::file_processing::IO_ERROR,
            Self::WorkerFailure { .. } => codes::batch::WORKER_FAILURE,
        }
    }
}

fn is_hrw4u_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(HRW4U_EXTENSION))
}

/// Collect `.hrw4u` files under `dir`, sorted by path
pub fn discover_hrw4u_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, BatchError> {
    crate::log_info!("Starting file discovery",
        "directory" => dir.display(),
        "recursive" => recursive
    );

    if !dir.is_dir() {
        let error = BatchError::DirectoryNotFound {
            path: dir.display().to_string(),
        };
        crate::log_error!(error.error_code(), "Batch input is not a directory",
            "directory" => dir.display());
        return Err(error);
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).max_depth(max_depth).sort_by_file_name() {
        let entry = entry.map_err(|e| BatchError::IoError {
            error: e.to_string(),
        })?;

        if entry.file_type().is_file() && is_hrw4u_file(entry.path()) {
            files.push(entry.into_path());
            if files.len() > MAX_FILES_PER_BATCH {
                let error = BatchError::TooManyFiles {
                    count: files.len(),
                    max: MAX_FILES_PER_BATCH,
                };
                crate::log_error!(error.error_code(), "Batch file limit exceeded",
                    "directory" => dir.display(),
                    "limit" => MAX_FILES_PER_BATCH);
                return Err(error);
            }
        }
    }

    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            path: dir.display().to_string(),
        });
    }

    files.sort();
    crate::log_debug!("File discovery completed",
        "files_found" => files.len(),
        "directory" => dir.display()
    );
    Ok(files)
}

/// Compile every `.hrw4u` file under `dir`
pub fn compile_directory(dir: &Path, config: &BatchConfig) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let files = discover_hrw4u_files(dir, config.recursive)?;
    let threads = config.effective_threads().min(files.len());

    crate::log_info!("Starting batch compilation",
        "directory" => dir.display(),
        "files" => files.len(),
        "threads" => threads
    );

    let mut results = compile_files(&files, config, threads)?;
    results.files_discovered = files.len();
    results.processing_duration = start_time.elapsed();

    crate::log_success!(
        codes::success::BATCH_COMPLETE,
        "Batch compilation completed",
        "files_processed" => results.files_processed(),
        "successful" => results.success_count(),
        "failed" => results.failure_count(),
        "threads_used" => threads,
        "duration_ms" => format!("{:.2}", results.processing_duration.as_secs_f64() * 1000.0)
    );

    Ok(results)
}

fn compile_files(
    files: &[PathBuf],
    config: &BatchConfig,
    threads: usize,
) -> Result<BatchResults, BatchError> {
    let results = Arc::new(Mutex::new(BatchResults::new()));
    let stop = Arc::new(AtomicBool::new(false));
    let files_per_thread = files.len().div_ceil(threads.max(1));

    let mut handles = Vec::new();
    for (thread_id, chunk) in files.chunks(files_per_thread.max(1)).enumerate() {
        let thread_files = chunk.to_vec();
        let results = Arc::clone(&results);
        let stop = Arc::clone(&stop);
        let config = config.clone();
        let first_id = thread_id * files_per_thread;

        handles.push(thread::spawn(move || {
            for (offset, path) in thread_files.into_iter().enumerate() {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                let outcome = logging::with_file_context(path.clone(), first_id + offset, || {
                    compile_one(&path, &config)
                });

                let mut guard = results.lock().unwrap_or_else(PoisonError::into_inner);
                match outcome {
                    Ok(output) => guard.add_success(path, output),
                    Err(error) => {
                        crate::log_error!(error.error_code(), "File compilation failed",
                            "file" => path.display(),
                            "errors" => error.error_count());
                        guard.add_failure(path, error);
                        if config.fail_fast {
                            stop.store(true, Ordering::Relaxed);
                        }
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().map_err(|_| BatchError::WorkerFailure {
            message: "worker thread panicked during compilation".to_string(),
        })?;
    }

    let mutex = Arc::try_unwrap(results).map_err(|_| BatchError::WorkerFailure {
        message: "results still shared after all workers joined".to_string(),
    })?;
    let mut results = mutex.into_inner().unwrap_or_else(PoisonError::into_inner);
    results.sort();
    Ok(results)
}

fn compile_one(path: &Path, config: &BatchConfig) -> Result<CompileOutput, PipelineError> {
    pipeline::compile_file(path, &config.file_preferences, &config.compiler_preferences)?
        .into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    const VALID: &str = "REMAP {\n    http.status = 403;\n}\n";
    const INVALID: &str = "REMAP {\n    if missing {\n        break;\n    }\n}\n";

    fn config(threads: usize) -> BatchConfig {
        BatchConfig {
            max_threads: threads,
            recursive: true,
            fail_fast: false,
            file_preferences: FileProcessorPreferences {
                require_hrw4u_extension: false,
                enable_performance_logging: false,
            },
            compiler_preferences: CompilerPreferences {
                debug_tracing: false,
                trace_indent: 0,
                enable_interpolation: true,
            },
        }
    }

    #[test]
    fn test_discovery_is_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.hrw4u"), VALID).unwrap();
        fs::write(dir.path().join("a.hrw4u"), VALID).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("nested").join("c.HRW4U"), VALID).unwrap();

        let files = discover_hrw4u_files(dir.path(), true).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.hrw4u"),
                PathBuf::from("b.hrw4u"),
                PathBuf::from("nested").join("c.HRW4U"),
            ]
        );

        let top_level = discover_hrw4u_files(dir.path(), false).unwrap();
        assert_eq!(top_level.len(), 2);
    }

    #[test]
    fn test_discovery_errors() {
        let dir = tempdir().unwrap();
        assert_matches!(
            discover_hrw4u_files(dir.path(), true),
            Err(BatchError::NoFilesFound { .. })
        );

        let missing = dir.path().join("missing");
        let err = discover_hrw4u_files(&missing, true).unwrap_err();
        assert_matches!(err, BatchError::DirectoryNotFound { .. });
        assert_eq!(err.error_code(), codes::batch::DIRECTORY_NOT_FOUND);
    }

    #[test]
    fn test_compile_directory_collects_both_outcomes() {
        let dir = tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("ok{}.hrw4u", i)), VALID).unwrap();
        }
        fs::write(dir.path().join("bad.hrw4u"), INVALID).unwrap();

        let results = compile_directory(dir.path(), &config(3)).unwrap();
        assert_eq!(results.files_discovered, 6);
        assert_eq!(results.success_count(), 5);
        assert_eq!(results.failure_count(), 1);

        let (bad_path, error) = &results.failed_files[0];
        assert!(bad_path.ends_with("bad.hrw4u"));
        assert_matches!(error, PipelineError::CompilationFailed { error_count: 1, .. });

        let first = &results.successful_files[0];
        assert!(first.0.ends_with("ok0.hrw4u"));
        assert_eq!(first.1.lines, vec!["cond %{REMAP_PSEUDO_HOOK} [AND]", "    set-status 403"]);
        assert!(results.summary().contains("5 successful, 1 failed"));
    }

    #[test]
    fn test_fail_fast_on_single_worker() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a_bad.hrw4u"), INVALID).unwrap();
        fs::write(dir.path().join("b_ok.hrw4u"), VALID).unwrap();
        fs::write(dir.path().join("c_ok.hrw4u"), VALID).unwrap();

        let mut cfg = config(1);
        cfg.fail_fast = true;
        let results = compile_directory(dir.path(), &cfg).unwrap();
        assert_eq!(results.files_processed(), 1);
        assert_eq!(results.failure_count(), 1);
    }

    #[test]
    fn test_effective_threads_is_clamped() {
        assert_eq!(config(0).effective_threads(), 1);
        assert_eq!(config(usize::MAX).effective_threads(), MAX_WORKER_THREADS);
    }
}
