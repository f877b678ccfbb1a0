use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::config::DEFAULT_EXCLUDE_DIRS;
use crate::discovery::DiscoveryError;

/// Lists the files under `root` matching `glob`, sorted by path.
///
/// The glob is interpreted relative to `root` with gitignore syntax.
/// Dependency directories and git-ignored files are never returned.
pub fn list_test_files(root: &Path, glob: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let enumeration_error = |message: String| DiscoveryError::Enumeration {
        root: root.to_path_buf(),
        message,
    };

    let mut overrides = OverrideBuilder::new(root);
    overrides
        .add(glob)
        .map_err(|e| enumeration_error(format!("invalid glob '{}': {}", glob, e)))?;
    for dir in DEFAULT_EXCLUDE_DIRS {
        overrides
            .add(&format!("!**/{}/**", dir))
            .map_err(|e| enumeration_error(e.to_string()))?;
    }
    let overrides = overrides.build().map_err(|e| enumeration_error(e.to_string()))?;

    if !root.is_dir() {
        return Err(enumeration_error("not a directory".to_string()));
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .overrides(overrides)
        .build();

    let entries = walker.map(|entry| {
        entry.map(|entry| {
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            (entry.into_path(), is_file)
        })
    });
    Ok(collect_files(entries))
}

/// Keeps the regular files of a walk, sorted. Entries the walk could not
/// read are logged and skipped.
fn collect_files(entries: impl IntoIterator<Item = Result<(PathBuf, bool), ignore::Error>>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok((path, true)) => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "skipping unreadable entry while listing test files"),
        }
    }

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "it('x', () => {});").unwrap();
    }

    #[test]
    fn test_glob_selects_test_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "src/a.test.js");
        touch(root, "src/nested/b.test.js");
        touch(root, "src/helper.js");
        touch(root, "lib/c.test.js");

        let files = list_test_files(root, "src/**/*.test.js").unwrap();
        let relative: Vec<String> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["src/a.test.js", "src/nested/b.test.js"]);
    }

    #[test]
    fn test_dependency_dirs_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "src/a.test.js");
        touch(root, "src/node_modules/pkg/d.test.js");

        let files = list_test_files(root, "src/**/*.test.js").unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let files = collect_files(vec![
            Ok((PathBuf::from("/work/src/b.test.js"), true)),
            Err(ignore::Error::Io(denied)),
            Ok((PathBuf::from("/work/src/nested"), false)),
            Ok((PathBuf::from("/work/src/a.test.js"), true)),
        ]);
        assert_eq!(
            files,
            vec![PathBuf::from("/work/src/a.test.js"), PathBuf::from("/work/src/b.test.js")]
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_test_files(&temp_dir.path().join("missing"), "src/**/*.test.js");
        assert!(matches!(result, Err(DiscoveryError::Enumeration { .. })));
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_test_files(temp_dir.path(), "src/[");
        assert!(matches!(result, Err(DiscoveryError::Enumeration { .. })));
    }
}
