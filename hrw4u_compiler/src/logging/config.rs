//! Logging configuration: compile-time caps plus runtime preferences
//!
//! The build profile fixes the most verbose level that can ever be emitted;
//! runtime preferences choose a level within that cap.

use crate::config::compile_time::logging::*;
use crate::config::runtime::LoggingPreferences;
use std::sync::OnceLock;

type EventsLogLevel = crate::logging::events::LogLevel;

// ============================================================================
// RUNTIME PREFERENCES STORAGE
// ============================================================================

static RUNTIME_PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    RUNTIME_PREFERENCES
        .set(preferences)
        .map_err(|_| "Runtime preferences already initialized")?;

    Ok(())
}

fn get_runtime_preferences() -> LoggingPreferences {
    RUNTIME_PREFERENCES.get().cloned().unwrap_or_default()
}

// ============================================================================
// CONFIGURATION ACCESS FUNCTIONS
// ============================================================================

fn level_from_u8(level: u8) -> EventsLogLevel {
    match level {
        0 => EventsLogLevel::Error,
        1 => EventsLogLevel::Warning,
        2 => EventsLogLevel::Info,
        _ => EventsLogLevel::Debug,
    }
}

/// Most verbose level allowed by the build profile
pub fn get_max_verbosity() -> EventsLogLevel {
    level_from_u8(MAX_LOG_VERBOSITY)
}

/// User preference clamped to the build profile cap
pub fn get_min_log_level() -> EventsLogLevel {
    let user_level = get_runtime_preferences().min_log_level.to_events_log_level();
    user_level.min(get_max_verbosity())
}

pub fn use_structured_logging() -> bool {
    get_runtime_preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    get_runtime_preferences().enable_console_logging
}

pub fn log_performance_events() -> bool {
    get_runtime_preferences().log_performance_events
}

pub fn get_max_log_message_length() -> usize {
    MAX_LOG_MESSAGE_LENGTH
}

pub fn include_file_context() -> bool {
    get_runtime_preferences().include_file_context
}

// ============================================================================
// CONFIGURATION VALIDATION
// ============================================================================

pub fn validate_config() -> Result<(), String> {
    if MAX_ERROR_COLLECTION > 100_000 {
        return Err(format!(
            "Error collection size too large: {}",
            MAX_ERROR_COLLECTION
        ));
    }

    if MAX_LOG_MESSAGE_LENGTH < 80 {
        return Err(format!(
            "Log message length too small: {}",
            MAX_LOG_MESSAGE_LENGTH
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(validate_config().is_ok());
    }

    #[test]
    fn test_min_level_within_cap() {
        assert!(get_min_log_level() <= get_max_verbosity());
    }
}
