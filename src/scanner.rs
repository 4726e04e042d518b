//! Recursive file discovery over source and output trees.
//!
//! The pipeline scans the caller's source tree for archives, then rescans its
//! own raw-output tree for the streams that extraction produced. Both passes
//! go through [`scan`].

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tokio::task::JoinSet;

/// Recursively collect every file under `root` whose extension equals
/// `extension` (leading dot included, case-sensitive, e.g. `".pck"`).
///
/// Each subdirectory is scanned as a concurrently spawned task and the parent
/// joins them all before returning, so the future resolves to the complete
/// flat list. Tree depth is shallow in practice; breadth is the dominant
/// dimension, so fan-out is unbounded.
///
/// # Errors
///
/// Any directory that cannot be listed or entry that cannot be stat'd aborts
/// the whole scan; there are no partial results. Non-UTF-8 paths are an
/// error.
///
/// Result order is unspecified and callers must not rely on it.
pub fn scan(
    root: Utf8PathBuf,
    extension: String,
) -> Pin<Box<dyn Future<Output = Result<Vec<Utf8PathBuf>>> + Send>> {
    Box::pin(async move {
        let mut files = Vec::new();
        let mut subdirs: JoinSet<Result<Vec<Utf8PathBuf>>> = JoinSet::new();

        let mut entries = tokio::fs::read_dir(&root)
            .await
            .with_context(|| format!("Failed to list directory: {}", root))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to read directory entry in {}", root))?
        {
            let path = Utf8PathBuf::from_path_buf(entry.path())
                .map_err(|p| anyhow!("Non-UTF-8 path: {}", p.display()))?;

            let metadata = tokio::fs::metadata(&path)
                .await
                .with_context(|| format!("Failed to stat: {}", path))?;

            if metadata.is_dir() {
                subdirs.spawn(scan(path, extension.clone()));
            } else if has_extension(&path, &extension) {
                files.push(path);
            }
        }

        while let Some(joined) = subdirs.join_next().await {
            files.extend(joined.context("Directory scan task panicked")??);
        }

        Ok(files)
    })
}

/// Extension match per the discovery contract: the target carries the leading
/// dot and the comparison is case-sensitive. A target without a dot never
/// matches.
fn has_extension(path: &Utf8Path, extension: &str) -> bool {
    match (path.extension(), extension.strip_prefix('.')) {
        (Some(actual), Some(target)) => actual == target,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &std::path::Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_extension_match_requires_leading_dot() {
        assert!(has_extension(Utf8Path::new("a/b.pck"), ".pck"));
        assert!(!has_extension(Utf8Path::new("a/b.pck"), "pck"));
        assert!(!has_extension(Utf8Path::new("a/b"), ".pck"));
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        assert!(!has_extension(Utf8Path::new("a/b.PCK"), ".pck"));
        assert!(!has_extension(Utf8Path::new("a/b.pck"), ".PCK"));
    }

    #[test]
    fn test_scan_nested_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("d")).unwrap();
        touch(&root.join("top.pck"));
        touch(&root.join("a/one.pck"));
        touch(&root.join("a/b/c/deep.pck"));
        touch(&root.join("a/b/other.bnk"));
        touch(&root.join("d/noext"));

        let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).unwrap();
        let mut found = tokio_test::block_on(scan(root.clone(), ".pck".to_string())).unwrap();
        found.sort();

        let expected: Vec<Utf8PathBuf> = vec![
            root.join("a/b/c/deep.pck"),
            root.join("a/one.pck"),
            root.join("top.pck"),
        ];
        assert_eq!(found, expected);
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("absent")).unwrap();
        let result = tokio_test::block_on(scan(root, ".pck".to_string()));
        assert!(result.is_err());
    }
}
