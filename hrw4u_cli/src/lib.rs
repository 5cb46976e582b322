//! Pieces shared by the `hrw4u` and `u4wrh` binaries

use hrw4u_compiler::config::runtime::RuntimeConfig;
use hrw4u_compiler::logging;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Load runtime preferences and start the global logger
///
/// An explicit `--config` file wins over `HRW4U_CONFIG_FILE`.
pub fn init(config_path: Option<&Path>) -> Result<RuntimeConfig, String> {
    let config = match config_path {
        Some(path) => RuntimeConfig::load_from_file(path),
        None => RuntimeConfig::from_env(),
    }
    .map_err(|e| e.to_string())?;

    logging::config::init_runtime_preferences(config.logging.clone())?;
    logging::init_global_logging()?;
    Ok(config)
}

/// Write `text` to `path`, or to stdout when no path is given
pub fn write_output(path: Option<&Path>, text: &str) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, text),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()
        }
    }
}

/// `<out_dir>/<path of input under input_root>.conf`
///
/// Inputs outside `input_root` fall back to their file name.
pub fn batch_output_path(input_root: &Path, out_dir: &Path, input: &Path) -> PathBuf {
    let relative = match input.strip_prefix(input_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => input
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("out")),
    };
    out_dir.join(relative).with_extension("conf")
}

/// Write one batch result, creating subdirectories of `out_dir` as needed
pub fn write_batch_output(
    input_root: &Path,
    out_dir: &Path,
    input: &Path,
    text: &str,
) -> io::Result<PathBuf> {
    let target = batch_output_path(input_root, out_dir, input);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, text)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_output_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.conf");
        write_output(Some(&path), "cond %{REMAP_PSEUDO_HOOK} [AND]\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "cond %{REMAP_PSEUDO_HOOK} [AND]\n"
        );
    }

    #[test]
    fn test_write_output_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.conf");
        assert!(write_output(Some(&path), "x").is_err());
    }

    #[test]
    fn test_batch_output_mirrors_input_tree() {
        let root = Path::new("/in");
        let out = Path::new("/out");
        assert_eq!(
            batch_output_path(root, out, Path::new("/in/a/rules.hrw4u")),
            PathBuf::from("/out/a/rules.conf")
        );
        assert_eq!(
            batch_output_path(root, out, Path::new("/in/b/rules.hrw4u")),
            PathBuf::from("/out/b/rules.conf")
        );
        assert_eq!(
            batch_output_path(root, out, Path::new("/elsewhere/top.hrw4u")),
            PathBuf::from("/out/top.conf")
        );
    }

    #[test]
    fn test_same_file_name_in_two_directories() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        let first = input.path().join("a").join("rules.hrw4u");
        let second = input.path().join("b").join("rules.hrw4u");

        let first_target = write_batch_output(input.path(), output.path(), &first, "first\n").unwrap();
        let second_target =
            write_batch_output(input.path(), output.path(), &second, "second\n").unwrap();

        assert_ne!(first_target, second_target);
        assert_eq!(fs::read_to_string(first_target).unwrap(), "first\n");
        assert_eq!(fs::read_to_string(second_target).unwrap(), "second\n");
    }
}
