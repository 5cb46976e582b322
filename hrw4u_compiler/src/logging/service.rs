//! Logging service and the sinks behind it

use super::config;
use super::events::{LogEvent, LogLevel};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Environment variable naming an extra log file sink
pub const LOG_FILE_ENV: &str = "HRW4U_LOG_FILE";

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Level filter in front of one logger
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    pub fn log_event(&self, event: LogEvent) {
        if event.level <= self.min_level {
            self.logger.log(&event);
        }
    }
}

/// Human-readable lines on stderr; stdout carries compiler output
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        eprintln!("{}", event.format());
    }
}

/// One JSON object per line on stderr
pub struct StructuredLogger;

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        match event.format_json() {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", event.format()),
        }
    }
}

/// Appends events to a file, one per line
pub struct FileLogger {
    file_path: PathBuf,
    structured: bool,
}

impl FileLogger {
    /// Creates the file (and its directory) up front so a bad path fails at startup
    pub fn new<P: AsRef<Path>>(file_path: P, structured: bool) -> std::io::Result<Self> {
        let path = file_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;

        Ok(Self {
            file_path: path,
            structured,
        })
    }
}

impl Logger for FileLogger {
    fn log(&self, event: &LogEvent) {
        let output = if self.structured {
            event.format_json().unwrap_or_else(|_| event.format())
        } else {
            event.format()
        };

        // Write failures are dropped to avoid logging recursion
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
        {
            let _ = writeln!(file, "{}", output);
        }
    }
}

/// Fans events out to several loggers
#[derive(Default)]
pub struct MultiLogger {
    loggers: Vec<Arc<dyn Logger>>,
}

impl MultiLogger {
    pub fn add_logger(&mut self, logger: Arc<dyn Logger>) {
        self.loggers.push(logger);
    }
}

impl Logger for MultiLogger {
    fn log(&self, event: &LogEvent) {
        for logger in &self.loggers {
            logger.log(event);
        }
    }
}

/// Sinks chosen by the runtime preferences: stderr when console logging is
/// on, plus a file when `HRW4U_LOG_FILE` is set. No sinks means silence.
pub fn configured_sinks() -> std::io::Result<MultiLogger> {
    let structured = config::use_structured_logging();
    let mut sinks = MultiLogger::default();

    if config::use_console_logging() {
        if structured {
            sinks.add_logger(Arc::new(StructuredLogger));
        } else {
            sinks.add_logger(Arc::new(ConsoleLogger));
        }
    }

    if let Ok(path) = std::env::var(LOG_FILE_ENV) {
        if !path.is_empty() {
            sinks.add_logger(Arc::new(FileLogger::new(path, structured)?));
        }
    }

    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<LogEvent>>,
    }

    impl Logger for Recorder {
        fn log(&self, event: &LogEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_level_filtering() {
        let recorder = Arc::new(Recorder::default());
        let service = LoggingService::new(recorder.clone(), LogLevel::Error);

        service.log_event(LogEvent::debug("Debug message"));
        service.log_event(LogEvent::info("Info message"));
        service.log_event(LogEvent::error(codes::system::INTERNAL_ERROR, "Error message"));

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_error());
    }

    #[test]
    fn test_multi_logger_fans_out() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let mut multi = MultiLogger::default();
        multi.add_logger(first.clone());
        multi.add_logger(second.clone());

        multi.log(&LogEvent::info("compiled").with_context("file", "rules.hrw4u"));

        assert_eq!(first.events.lock().unwrap().len(), 1);
        let seen = second.events.lock().unwrap();
        assert_eq!(seen[0].context.get("file").map(String::as_str), Some("rules.hrw4u"));
    }

    #[test]
    fn test_file_logger_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("hrw4u.log");
        let logger = FileLogger::new(&path, true).unwrap();

        logger.log(&LogEvent::info("first"));
        logger.log(&LogEvent::error(codes::reverse::UNKNOWN_OPERATOR, "second"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains("\"code\":\"E072\""));
    }

    #[test]
    fn test_file_logger_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hrw4u.log");
        let logger = FileLogger::new(&path, false).unwrap();

        logger.log(&LogEvent::error(codes::symbols::SYMBOL_RESOLUTION, "unknown symbol: foo"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[ERROR] E051 - unknown symbol: foo\n");
    }
}
