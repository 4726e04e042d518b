//! Integration tests for the file tree scanner
//!
//! These tests verify:
//! - Exact-set discovery at arbitrary nesting depth
//! - Case-sensitive, leading-dot extension matching
//! - Directories are recursed into, never returned

use std::collections::HashSet;
use std::fs;

use camino::Utf8PathBuf;
use tempfile::TempDir;
use wwiserip::scanner::scan;

fn utf8(path: &std::path::Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
}

fn touch(path: &std::path::Path) {
    fs::write(path, b"x").unwrap();
}

#[tokio::test]
async fn test_scan_finds_exact_set_at_any_depth() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("a/b/c/d")).unwrap();
    fs::create_dir_all(root.join("e")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();

    touch(&root.join("top.pck"));
    touch(&root.join("a/mid.pck"));
    touch(&root.join("a/b/c/d/deep.pck"));
    touch(&root.join("e/other.bnk"));
    touch(&root.join("e/noise.txt"));

    let root = utf8(root);
    let found: HashSet<Utf8PathBuf> = scan(root.clone(), ".pck".to_string())
        .await
        .unwrap()
        .into_iter()
        .collect();

    let expected: HashSet<Utf8PathBuf> = [
        root.join("top.pck"),
        root.join("a/mid.pck"),
        root.join("a/b/c/d/deep.pck"),
    ]
    .into_iter()
    .collect();

    assert_eq!(found, expected);

    for path in &found {
        assert!(path.is_file());
    }
}

#[tokio::test]
async fn test_scan_is_case_sensitive() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    touch(&root.join("lower.pck"));
    touch(&root.join("upper.PCK"));

    let found = scan(utf8(root), ".pck".to_string()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].file_name(), Some("lower.pck"));
}

#[tokio::test]
async fn test_scan_does_not_return_matching_directories() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    // A directory whose name looks like an archive must be recursed into,
    // not listed.
    fs::create_dir(root.join("decoy.pck")).unwrap();
    touch(&root.join("decoy.pck/inner.pck"));

    let root = utf8(root);
    let found = scan(root.clone(), ".pck".to_string()).await.unwrap();
    assert_eq!(found, vec![root.join("decoy.pck/inner.pck")]);
}

#[tokio::test]
async fn test_scan_empty_tree_returns_empty_list() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("a/b")).unwrap();

    let found = scan(utf8(temp.path()), ".pck".to_string()).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn test_scan_unlistable_root_propagates() {
    let temp = TempDir::new().unwrap();
    let missing = utf8(&temp.path().join("never-created"));

    assert!(scan(missing, ".pck".to_string()).await.is_err());
}
