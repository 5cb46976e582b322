//! Global logging for the hrw4u compiler
//!
//! Library code logs through the macros in [`macros`]; until a binary calls
//! [`init_global_logging`] every event is dropped, so embedding the compiler
//! costs nothing. Events are tagged with the file currently being compiled on
//! this thread (see [`with_file_context`]).

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{Logger, LoggingService};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static FILE_CONTEXT: RefCell<Option<FileProcessingContext>> = RefCell::new(None);
}

/// File currently being processed on this thread
#[derive(Debug, Clone)]
pub struct FileProcessingContext {
    pub file_path: PathBuf,
    pub file_id: usize,
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from the runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let min_level = config::get_min_log_level();
    let sinks = service::configured_sinks().map_err(|e| format!("Failed to create log sinks: {}", e))?;
    let logging_service = Arc::new(LoggingService::new(Arc::new(sinks), min_level));

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized")?;

    for code in [
        codes::system::INTERNAL_ERROR,
        codes::file_processing::FILE_NOT_FOUND,
        codes::syntax::UNEXPECTED_TOKEN,
        codes::symbols::SYMBOL_RESOLUTION,
    ] {
        if codes::get_description(code.as_str()) == "Unknown error" {
            return Err(format!("Missing metadata for error code: {}", code));
        }
    }

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// FILE CONTEXT MANAGEMENT
// ============================================================================

fn set_file_context(file_path: PathBuf, file_id: usize) {
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(FileProcessingContext { file_path, file_id });
    });
}

fn clear_file_context() {
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Run `f` with the given file attached to every event logged on this thread
pub fn with_file_context<F, R>(file_path: PathBuf, file_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    set_file_context(file_path, file_id);
    let result = f();
    clear_file_context();
    result
}

pub fn get_current_file_context() -> Option<FileProcessingContext> {
    FILE_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

fn dispatch(mut event: LogEvent, context: Vec<(&str, &str)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };

    for (key, value) in context {
        event = event.with_context(key, value);
    }

    if config::include_file_context() {
        if let Some(file_ctx) = get_current_file_context() {
            event = event.with_file_path(&file_ctx.file_path.display().to_string());
            event = event.with_context("file_id", &file_ctx.file_id.to_string());
        }
    }

    let max_len = config::get_max_log_message_length();
    if event.message.len() > max_len {
        let mut cut = max_len;
        while !event.message.is_char_boundary(cut) {
            cut -= 1;
        }
        event.message.truncate(cut);
        event.message.push_str("...");
    }

    logger.log_event(event);
}

pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::Span>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some(s) = span {
        event = event.with_span(s);
    }
    dispatch(event, context);
}

pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::success(code, message), context);
}

pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::info(message), context);
}

pub fn log_warning_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::warning(message), context);
}

pub fn log_debug_with_context(message: &str, context: Vec<(&str, &str)>) {
    dispatch(LogEvent::debug(message), context);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_context_management() {
        let file_path = PathBuf::from("rules.hrw4u");

        assert!(get_current_file_context().is_none());

        set_file_context(file_path.clone(), 1);
        let context = get_current_file_context();
        assert_eq!(context.map(|c| c.file_path), Some(file_path));

        clear_file_context();
        assert!(get_current_file_context().is_none());
    }

    #[test]
    fn test_with_file_context() {
        let file_path = PathBuf::from("rules.hrw4u");

        let result = with_file_context(file_path.clone(), 2, || {
            let context = get_current_file_context().unwrap();
            assert_eq!(context.file_path, file_path);
            assert_eq!(context.file_id, 2);
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_file_context().is_none());
    }
}
