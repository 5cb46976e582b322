//! Log events emitted by the compiler stages

use super::codes::Code;
use crate::utils::Span;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Core log event structure
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    pub span: Option<Span>,
    pub context: HashMap<String, String>,
}

impl LogEvent {
    fn build(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            code,
            message: message.to_string(),
            span: None,
            context: HashMap::new(),
        }
    }

    pub fn error(error_code: Code, message: &str) -> Self {
        Self::build(LogLevel::Error, error_code, message)
    }

    /// Warnings without a specific code use W000
    pub fn warning(message: &str) -> Self {
        Self::build(LogLevel::Warning, Code::new("W000"), message)
    }

    pub fn info(message: &str) -> Self {
        Self::build(LogLevel::Info, Code::new("I000"), message)
    }

    /// Info-level event carrying a success code
    pub fn success(success_code: Code, message: &str) -> Self {
        Self::build(LogLevel::Info, success_code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::build(LogLevel::Debug, Code::new("D000"), message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_file_path(self, path: &str) -> Self {
        self.with_context("file_path", path)
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn requires_halt(&self) -> bool {
        super::codes::requires_halt(self.code.as_str())
    }

    pub fn severity(&self) -> &'static str {
        super::codes::get_severity(self.code.as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        super::codes::get_category(self.code.as_str())
    }

    pub fn description(&self) -> &'static str {
        super::codes::get_description(self.code.as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        super::codes::get_action(self.code.as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        super::codes::is_recoverable(self.code.as_str())
    }

    /// `[LEVEL] CODE - message at line:column`
    pub fn format(&self) -> String {
        let span_str = self
            .span
            .as_ref()
            .map(|s| format!(" at {}:{}", s.start().line, s.start().column))
            .unwrap_or_default();

        format!(
            "[{}] {} - {}{}",
            self.level.as_str(),
            self.code.as_str(),
            self.message,
            span_str
        )
    }

    /// Format as JSON for structured logging
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339(),
            "level": self.level.as_str(),
            "code": self.code.as_str(),
            "message": self.message,
            "category": self.category(),
            "severity": self.severity(),
        });

        if self.is_error() {
            json["error_metadata"] = serde_json::json!({
                "recoverable": self.is_recoverable(),
                "requires_halt": self.requires_halt(),
                "description": self.description(),
                "recommended_action": self.recommended_action(),
            });
        }

        if let Some(span) = &self.span {
            json["span"] = serde_json::json!({
                "start_line": span.start().line,
                "start_column": span.start().column,
                "end_line": span.end().line,
                "end_column": span.end().column,
            });
        }

        if !self.context.is_empty() {
            json["context"] = serde_json::Value::Object(
                self.context
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
            );
        }

        serde_json::to_string(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;
    use crate::utils::Position;

    #[test]
    fn test_error_event_creation() {
        let event = LogEvent::error(codes::file_processing::FILE_NOT_FOUND, "File not found");

        assert!(event.is_error());
        assert_eq!(event.code.as_str(), "E005");
        assert_eq!(event.category(), "FileProcessing");
    }

    #[test]
    fn test_generic_codes() {
        assert_eq!(LogEvent::warning("w").code.as_str(), "W000");
        assert_eq!(LogEvent::info("i").code.as_str(), "I000");
        assert_eq!(LogEvent::debug("d").code.as_str(), "D000");
        assert_eq!(
            LogEvent::success(codes::success::PARSE_COMPLETE, "ok").level,
            LogLevel::Info
        );
    }

    #[test]
    fn test_event_formatting_with_span() {
        let span = Span::new(Position::new(10, 2, 5), Position::new(14, 2, 9));
        let event = LogEvent::error(codes::symbols::SYMBOL_RESOLUTION, "unknown symbol: foo")
            .with_span(span);

        assert_eq!(
            event.format(),
            "[ERROR] E051 - unknown symbol: foo at 2:5"
        );
    }

    #[test]
    fn test_json_carries_error_metadata() {
        let event = LogEvent::error(codes::symbols::CAPACITY_EXCEEDED, "too many flags")
            .with_context("type", "bool");
        let value: serde_json::Value = serde_json::from_str(&event.format_json().unwrap()).unwrap();

        assert_eq!(value["category"], "Symbols");
        assert_eq!(value["error_metadata"]["recoverable"], true);
        assert_eq!(value["context"]["type"], "bool");
    }

    #[test]
    fn test_json_formatting() {
        let event = LogEvent::error(codes::file_processing::PERMISSION_DENIED, "Access denied")
            .with_file_path("rules.hrw4u");

        let json = event.format_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["level"], "ERROR");
        assert_eq!(value["code"], "E009");
        assert_eq!(value["context"]["file_path"], "rules.hrw4u");
        assert!(DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).is_ok());
    }
}
