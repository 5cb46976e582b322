//! File input for both compilers

mod processor;

use std::path::Path;

pub use processor::{
    FileMetadata, FileProcessor, FileProcessorError, SourceFile, HRW4U_EXTENSION,
};

/// Read a file with default preferences
pub fn process_file(file_path: &Path) -> Result<SourceFile, FileProcessorError> {
    FileProcessor::new().process_file(file_path)
}

/// Compile-time ceiling on input size, baked in from the build profile
pub fn get_max_file_size() -> u64 {
    FileProcessor::max_file_size()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::compile_time::file_processing::MAX_FILE_SIZE;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_module_api() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.hrw4u");
        fs::write(&path, "SEND_RESPONSE {\n}\n").unwrap();

        let result = process_file(&path).unwrap();
        assert_eq!(result.metadata.line_count, 2);
        assert_eq!(result.display_name(), path.display().to_string());
    }

    #[test]
    fn test_max_file_size_matches_profile() {
        assert_eq!(get_max_file_size(), MAX_FILE_SIZE);
    }
}
