//! Configuration module for the hrw4u compiler
//! Compile-time limits come from the TOML profile read by build.rs

// Generated by build.rs from config/<profile>.toml
include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("HRW4U_BUILD_PROFILE").unwrap_or("development")
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("HRW4U_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::compile_time;
    use super::*;

    #[test]
    fn test_generated_limits_are_sane() {
        assert!(compile_time::file_processing::MAX_FILE_SIZE > 0);
        assert!(
            compile_time::file_processing::LARGE_FILE_THRESHOLD
                <= compile_time::file_processing::MAX_FILE_SIZE
        );
        assert!(compile_time::syntax::MAX_PARSE_DEPTH > 0);
        assert!(compile_time::batch_processing::MAX_WORKER_THREADS > 0);
    }

    #[test]
    fn test_source_info_mentions_profile() {
        let info = build_info::source_info();
        assert!(info.contains(build_info::profile()));
        assert!(info.ends_with(".toml"));
    }
}
