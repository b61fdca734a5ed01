use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively collects files under `root` whose file name ends with `suffix`.
///
/// The match is exact and case-sensitive. A missing or unreadable root yields an empty
/// list. Symlinks are not followed, so directory cycles cannot be entered. Results are
/// absolute and ordered by file name within each directory.
pub fn find_files(root: &Path, suffix: &str) -> Vec<PathBuf> {
    let root = match root.canonicalize() {
        Ok(root) => root,
        Err(err) => {
            tracing::debug!(
                root = %root.display(),
                error = %err,
                "data directory not readable; no files discovered"
            );
            return Vec::new();
        }
    };

    let mut matches = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matched = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(suffix));
        if matched {
            matches.push(entry.into_path());
        }
    }
    tracing::debug!(root = %root.display(), suffix, count = matches.len(), "discovered files");
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file_names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn matches_only_the_requested_suffix() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a_accuracy.xlsx"), b"").unwrap();
        fs::write(temp.path().join("b_performance.xlsx"), b"").unwrap();
        fs::write(temp.path().join("c.txt"), b"").unwrap();

        let found = find_files(temp.path(), "_accuracy.xlsx");
        assert_eq!(file_names(&found), vec!["a_accuracy.xlsx".to_string()]);
        assert!(found.iter().all(|path| path.is_absolute()));
    }

    #[test]
    fn descends_into_subdirectories() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("pc1").join("run2");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join("a_performance.xlsx"), b"").unwrap();
        fs::write(nested.join("b_performance.xlsx"), b"").unwrap();
        fs::write(nested.join("b_performance.xlsx.bak"), b"").unwrap();

        let found = find_files(temp.path(), "_performance.xlsx");
        assert_eq!(
            file_names(&found),
            vec!["a_performance.xlsx".to_string(), "b_performance.xlsx".to_string()]
        );
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a_ACCURACY.xlsx"), b"").unwrap();
        assert!(find_files(temp.path(), "_accuracy.xlsx").is_empty());
    }

    #[test]
    fn missing_root_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("does-not-exist");
        assert!(find_files(&missing, "_accuracy.xlsx").is_empty());
    }
}
