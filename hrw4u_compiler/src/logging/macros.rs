//! Logging macros taking a `Code` and `key => value` context pairs.
//! Context values may be any `Display` type.

/// Log an error event, optionally with a source span
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::log_error_with_context($code, $message, None, vec![])
    };

    ($code:expr, $message:expr, span = $span:expr) => {
        $crate::logging::log_error_with_context($code, $message, Some($span), vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            let context_refs: Vec<(&str, &str)> = context_strings.iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect();
            $crate::logging::log_error_with_context($code, $message, None, context_refs)
        }
    };

    ($code:expr, $message:expr, span = $span:expr, $($key:expr => $value:expr),+) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            let context_refs: Vec<(&str, &str)> = context_strings.iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect();
            $crate::logging::log_error_with_context($code, $message, Some($span), context_refs)
        }
    };
}

/// Log a success event
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::log_success_with_context($code, $message, vec![])
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            let context_refs: Vec<(&str, &str)> = context_strings.iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect();
            $crate::logging::log_success_with_context($code, $message, context_refs)
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::log_info_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            let context_refs: Vec<(&str, &str)> = context_strings.iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect();
            $crate::logging::log_info_with_context($message, context_refs)
        }
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr) => {
        $crate::logging::log_warning_with_context($message, vec![])
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            let context_refs: Vec<(&str, &str)> = context_strings.iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect();
            $crate::logging::log_warning_with_context($message, context_refs)
        }
    };
}

/// Debug events skip formatting entirely when the effective level is lower
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            $crate::logging::log_debug_with_context($message, vec![])
        }
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
            let context_strings: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),+];
            let context_refs: Vec<(&str, &str)> = context_strings.iter()
                .map(|(k, v)| (*k, v.as_str()))
                .collect();
            $crate::logging::log_debug_with_context($message, context_refs)
        }
    };
}

/// Success event with a `duration_ms` field, gated on the performance preference
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr) => {
        if $crate::logging::config::log_performance_events() {
            $crate::log_success!($code, $message,
                "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0)
            );
        }
    };

    ($code:expr, $message:expr, duration = $duration:expr, $($key:expr => $value:expr),+) => {
        if $crate::logging::config::log_performance_events() {
            $crate::log_success!($code, $message,
                "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0),
                $($key => $value),+
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;
    use crate::utils::{Position, Span};

    #[test]
    fn test_macros_are_silent_without_global_logger() {
        let span = Span::single(Position::start());
        let duration = std::time::Duration::from_millis(5);

        log_error!(codes::lexical::INVALID_CHARACTER, "Invalid character",
            span = span,
            "char" => '$'
        );
        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenized",
            "tokens" => 12
        );
        log_info!("Compiling", "file" => "rules.hrw4u");
        log_warning!("Large input", "bytes" => 1024u64);
        log_debug!("Visiting section", "hook" => "REMAP");
        log_performance!(codes::success::CODE_GENERATION_COMPLETE, "Generated",
            duration = duration,
            "lines" => 3
        );
    }
}
