// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to require the .hrw4u extension on forward compiler input
    pub require_hrw4u_extension: bool,

    /// Whether to enable detailed performance logging
    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_hrw4u_extension: env::var(env_vars::REQUIRE_HRW4U_EXTENSION)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_performance_logging: env::var(env_vars::ENABLE_PERFORMANCE_LOGGING)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerPreferences {
    /// Emit `<phase>` / `</phase>` tracing to stderr while visiting the tree
    pub debug_tracing: bool,

    /// Depth the first trace line starts at
    pub trace_indent: usize,

    /// Expand `{name}` / `{fn(args)}` inside string values
    pub enable_interpolation: bool,
}

impl Default for CompilerPreferences {
    fn default() -> Self {
        Self {
            debug_tracing: env::var(env_vars::COMPILER_DEBUG)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            trace_indent: env::var(env_vars::COMPILER_TRACE_INDENT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            enable_interpolation: env::var(env_vars::COMPILER_INTERPOLATION)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Preferred minimum log level
    pub min_log_level: LogLevel,

    /// Whether to include performance metrics in logs
    pub log_performance_events: bool,

    /// Whether to include file context in log messages
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            log_performance_events: env::var(env_vars::LOGGING_LOG_PERFORMANCE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_file_context: env::var(env_vars::LOGGING_INCLUDE_FILE_CONTEXT)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
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

    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub compiler: CompilerPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse preferences from TOML text. Missing tables and keys fall back to
    /// the environment-derived defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `HRW4U_CONFIG_FILE` when set, defaults otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(env_vars::CONFIG_FILE) {
            Ok(path) if !path.is_empty() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    pub const CONFIG_FILE: &str = "HRW4U_CONFIG_FILE";

    // File Processor
    pub const REQUIRE_HRW4U_EXTENSION: &str = "HRW4U_REQUIRE_EXTENSION";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "HRW4U_ENABLE_PERFORMANCE_LOGGING";

    // Compiler
    pub const COMPILER_DEBUG: &str = "HRW4U_DEBUG";
    pub const COMPILER_TRACE_INDENT: &str = "HRW4U_TRACE_INDENT";
    pub const COMPILER_INTERPOLATION: &str = "HRW4U_INTERPOLATION";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "HRW4U_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "HRW4U_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "HRW4U_LOGGING_MIN_LEVEL";
    pub const LOGGING_LOG_PERFORMANCE: &str = "HRW4U_LOGGING_LOG_PERFORMANCE";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "HRW4U_LOGGING_INCLUDE_FILE_CONTEXT";
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("0"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("invalid"), None);
    }

    #[test]
    fn test_toml_overrides_partial_tables() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [compiler]
            debug_tracing = true
            trace_indent = 2

            [logging]
            min_log_level = "Debug"
            "#,
        )
        .unwrap();

        assert!(config.compiler.debug_tracing);
        assert_eq!(config.compiler.trace_indent, 2);
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = RuntimeConfig::from_toml_str("[compiler]\ndebug_tracing = \"nope\"");
        assert_matches!(result, Err(ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[file_processor]\nrequire_hrw4u_extension = true").unwrap();

        let config = RuntimeConfig::load_from_file(file.path()).unwrap();
        assert!(config.file_processor.require_hrw4u_extension);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RuntimeConfig::load_from_file("/nonexistent/hrw4u.toml");
        assert_matches!(result, Err(ConfigError::Io { .. }));
    }
}
