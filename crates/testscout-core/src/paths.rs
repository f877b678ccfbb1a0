//! Path normalization shared by discovery, event matching and planning.

use std::path::{Component, Path, PathBuf};

/// Normalizes a path into the canonical string form stored on test cases.
///
/// Relative paths are resolved against the current directory, `.` and `..`
/// components are folded lexically (symlinks are not resolved) and
/// separators become `/`.
pub fn normalize_path(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }

    cleaned.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_dot_components() {
        assert_eq!(normalize_path("/work/./src/../test/a.js"), "/work/test/a.js");
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let normalized = normalize_path("src/a.test.js");
        assert!(normalized.starts_with('/') || normalized.contains(':'));
        assert!(normalized.ends_with("src/a.test.js"));
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_path("/work/src/a.test.js");
        assert_eq!(normalize_path(&once), once);
    }
}
