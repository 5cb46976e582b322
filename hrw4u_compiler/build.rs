// build.rs - TOML-driven compile-time limits for the hrw4u compiler
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    file_processing: FileProcessingLimits,
    lexical: LexicalLimits,
    syntax: SyntaxLimits,
    symbols: SymbolLimits,
    batch_processing: BatchProcessingLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
    large_file_threshold: u64,
    max_line_count_for_analysis: usize,
}

#[derive(serde::Deserialize)]
struct LexicalLimits {
    max_string_size: usize,
    max_identifier_length: usize,
    max_comment_length: usize,
    max_token_count: usize,
}

#[derive(serde::Deserialize)]
struct SyntaxLimits {
    max_parse_depth: usize,
    max_error_history: usize,
    max_context_stack_depth: usize,
    max_recovery_scan_tokens: usize,
}

#[derive(serde::Deserialize)]
struct SymbolLimits {
    max_symbol_identifier_length: usize,
    max_interpolations_per_string: usize,
}

#[derive(serde::Deserialize)]
struct BatchProcessingLimits {
    max_worker_threads: usize,
    max_files_per_batch: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    max_error_collection: usize,
    max_log_message_length: usize,
    max_log_verbosity: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=HRW4U_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=HRW4U_CONFIG_DIR");

    let profile = env::var("HRW4U_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("HRW4U_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of hrw4u_compiler
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_FILE_SIZE: u64 = 1_000_000_000;
    const ABSOLUTE_MAX_PARSE_DEPTH: usize = 4_096;
    const ABSOLUTE_MAX_WORKER_THREADS: usize = 256;

    if config.file_processing.max_file_size == 0 {
        panic!("LIMITS: max_file_size must be non-zero");
    }

    if config.file_processing.max_file_size > ABSOLUTE_MAX_FILE_SIZE {
        panic!("LIMITS: max_file_size exceeds absolute maximum");
    }

    if config.file_processing.large_file_threshold > config.file_processing.max_file_size {
        panic!("LIMITS: large_file_threshold must not exceed max_file_size");
    }

    if config.syntax.max_parse_depth == 0 || config.syntax.max_parse_depth > ABSOLUTE_MAX_PARSE_DEPTH
    {
        panic!("LIMITS: max_parse_depth must be in 1..={}", ABSOLUTE_MAX_PARSE_DEPTH);
    }

    if config.batch_processing.max_worker_threads == 0
        || config.batch_processing.max_worker_threads > ABSOLUTE_MAX_WORKER_THREADS
    {
        panic!(
            "LIMITS: max_worker_threads must be in 1..={}",
            ABSOLUTE_MAX_WORKER_THREADS
        );
    }

    if config.logging.max_error_collection == 0 {
        panic!("LIMITS: max_error_collection must be non-zero");
    }

    if config.logging.max_log_verbosity > 3 {
        panic!("LIMITS: max_log_verbosity must be 0 (error) through 3 (debug)");
    }

    if profile == "production" && config.file_processing.max_file_size > 50_000_000 {
        panic!("PRODUCTION: max_file_size too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod file_processing {{
        pub const MAX_FILE_SIZE: u64 = {};
        pub const LARGE_FILE_THRESHOLD: u64 = {};
        pub const MAX_LINE_COUNT_FOR_ANALYSIS: usize = {};
    }}

    pub mod lexical {{
        pub const MAX_STRING_SIZE: usize = {};
        pub const MAX_IDENTIFIER_LENGTH: usize = {};
        pub const MAX_COMMENT_LENGTH: usize = {};
        pub const MAX_TOKEN_COUNT: usize = {};
    }}

    pub mod syntax {{
        pub const MAX_PARSE_DEPTH: usize = {};
        pub const MAX_ERROR_HISTORY: usize = {};
        pub const MAX_CONTEXT_STACK_DEPTH: usize = {};
        pub const MAX_RECOVERY_SCAN_TOKENS: usize = {};
    }}

    pub mod symbols {{
        pub const MAX_SYMBOL_IDENTIFIER_LENGTH: usize = {};
        pub const MAX_INTERPOLATIONS_PER_STRING: usize = {};
    }}

    pub mod batch_processing {{
        pub const MAX_WORKER_THREADS: usize = {};
        pub const MAX_FILES_PER_BATCH: usize = {};
    }}

    pub mod logging {{
        pub const MAX_ERROR_COLLECTION: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const MAX_LOG_VERBOSITY: u8 = {};
    }}
}}
"#,
        profile,
        // File Processing
        config.file_processing.max_file_size,
        config.file_processing.large_file_threshold,
        config.file_processing.max_line_count_for_analysis,
        // Lexical
        config.lexical.max_string_size,
        config.lexical.max_identifier_length,
        config.lexical.max_comment_length,
        config.lexical.max_token_count,
        // Syntax
        config.syntax.max_parse_depth,
        config.syntax.max_error_history,
        config.syntax.max_context_stack_depth,
        config.syntax.max_recovery_scan_tokens,
        // Symbols
        config.symbols.max_symbol_identifier_length,
        config.symbols.max_interpolations_per_string,
        // Batch Processing
        config.batch_processing.max_worker_threads,
        config.batch_processing.max_files_per_batch,
        // Logging
        config.logging.max_error_collection,
        config.logging.max_log_message_length,
        config.logging.max_log_verbosity,
    );

    fs::write(output_path, constants_code).unwrap();
}
