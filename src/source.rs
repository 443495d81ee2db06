//! Source tree and prompt loading
//!
//! Produces the raw path → content map the review pipeline consumes. Paths
//! are relative to the source root and always `/`-separated; content is
//! decoded as UTF-8 with invalid sequences replaced.

use camino::Utf8Path;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

use codecritic_utils::error::SourceError;

/// Read every regular file under `root`.
///
/// Symlinks are not followed. Files whose relative path is not valid UTF-8
/// are skipped with a warning.
///
/// # Errors
///
/// `NotFound` / `NotADirectory` for a bad root, `Read` when a file or
/// directory cannot be read.
pub fn load_source_tree(root: &Path) -> Result<HashMap<String, String>, SourceError> {
    if !root.exists() {
        return Err(SourceError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(SourceError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut files = HashMap::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|err| SourceError::Read {
            path: err.path().unwrap_or(root).to_path_buf(),
            source: io::Error::from(err),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(relative) = Utf8Path::from_path(relative) else {
            tracing::warn!(path = %entry.path().display(), "Skipping file with non-UTF-8 path");
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join("/");

        let bytes = fs::read(entry.path()).map_err(|source| SourceError::Read {
            path: entry.path().to_path_buf(),
            source,
        })?;
        files.insert(key, String::from_utf8_lossy(&bytes).into_owned());
    }

    tracing::debug!(root = %root.display(), files = files.len(), "Loaded source tree");
    Ok(files)
}

/// Read the draft-stage system prompt.
///
/// # Errors
///
/// `PromptNotFound` when `path` is not a regular file, `Read` on I/O failure.
pub fn load_prompt(path: &Path) -> Result<String, SourceError> {
    if !path.is_file() {
        return Err(SourceError::PromptNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_loads_nested_files_with_forward_slashes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/util")).unwrap();
        fs::write(dir.path().join("main.c"), "int main;").unwrap();
        fs::write(dir.path().join("src/util/helpers.py"), "x = 1\n").unwrap();

        let files = load_source_tree(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files["main.c"], "int main;");
        assert_eq!(files["src/util/helpers.py"], "x = 1\n");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bin.c"), [b'a', 0xff, b'b']).unwrap();

        let files = load_source_tree(dir.path()).unwrap();
        assert_eq!(files["bin.c"], "a\u{fffd}b");
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = load_source_tree(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn test_root_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.c");
        fs::write(&file, "").unwrap();
        let err = load_source_tree(&file).unwrap_err();
        assert!(matches!(err, SourceError::NotADirectory { .. }));
    }

    #[test]
    fn test_load_prompt() {
        let dir = TempDir::new().unwrap();
        let prompt = dir.path().join("draft.md");
        fs::write(&prompt, "Find every bug.").unwrap();

        assert_eq!(load_prompt(&prompt).unwrap(), "Find every bug.");
        assert!(matches!(
            load_prompt(&dir.path().join("missing.md")).unwrap_err(),
            SourceError::PromptNotFound { .. }
        ));
        assert!(matches!(
            load_prompt(dir.path()).unwrap_err(),
            SourceError::PromptNotFound { .. }
        ));
    }
}
