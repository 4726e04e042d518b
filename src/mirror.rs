//! Destination-tree mirroring.
//!
//! After extraction the raw tree holds tens of thousands of streams across
//! comparatively few directories. [`FolderSet`] remembers which destination
//! directories already exist so that mirroring performs one creation call per
//! distinct directory instead of one per file.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

/// Set of directories already known to exist on disk.
///
/// Check-and-insert runs under a single lock, so concurrent unpack workers
/// can seed the set while a later mirroring pass reuses it. The set only
/// grows and is scoped to one pipeline run.
#[derive(Clone, Debug, Default)]
pub struct FolderSet {
    inner: Arc<Mutex<HashSet<Utf8PathBuf>>>,
}

impl FolderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory as existing without touching the filesystem.
    /// Returns false when the directory was already known.
    pub fn insert(&self, dir: &Utf8Path) -> bool {
        self.inner.lock().unwrap().insert(dir.to_path_buf())
    }

    pub fn contains(&self, dir: &Utf8Path) -> bool {
        self.inner.lock().unwrap().contains(dir)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Create `dir` (and any missing parents) unless it is already in the
    /// set. Returns true when this call performed the creation.
    ///
    /// The membership claim happens before the filesystem call, so two racing
    /// `ensure` calls resolve to exactly one creation. Creation itself is
    /// idempotent against directories that pre-exist on disk.
    pub async fn ensure(&self, dir: &Utf8Path) -> Result<bool> {
        if !self.insert(dir) {
            return Ok(false);
        }

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dir))?;

        Ok(true)
    }
}

/// Replace the `from` root prefix of `path` with `to`.
pub fn remap(path: &Utf8Path, from: &Utf8Path, to: &Utf8Path) -> Result<Utf8PathBuf> {
    let relative = path
        .strip_prefix(from)
        .with_context(|| format!("{} is not under {}", path, from))?;
    Ok(to.join(relative))
}

/// Ensure the destination directory exists for every file path, after
/// substituting `source_root` with `dest_root`.
///
/// Returns the number of directories this pass actually created; files
/// sharing a directory cost a single creation call, and directories already
/// seeded into `folders` cost none.
pub async fn mirror_folders(
    files: &[Utf8PathBuf],
    source_root: &Utf8Path,
    dest_root: &Utf8Path,
    folders: &FolderSet,
) -> Result<usize> {
    let mut created = 0;

    for file in files {
        let dest = remap(file, source_root, dest_root)?;
        let parent = dest
            .parent()
            .with_context(|| format!("Destination path has no parent: {}", dest))?;

        if folders.ensure(parent).await? {
            created += 1;
        }
    }

    tracing::debug!(
        "Mirrored {} files into {} ({} directories created)",
        files.len(),
        dest_root,
        created
    );

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn test_remap_swaps_root_prefix() {
        let remapped = remap(
            Utf8Path::new("/out/wem/ab12/stream.wem"),
            Utf8Path::new("/out/wem"),
            Utf8Path::new("/out/wav"),
        )
        .unwrap();
        assert_eq!(remapped, Utf8PathBuf::from("/out/wav/ab12/stream.wem"));
    }

    #[test]
    fn test_remap_rejects_foreign_path() {
        let result = remap(
            Utf8Path::new("/elsewhere/stream.wem"),
            Utf8Path::new("/out/wem"),
            Utf8Path::new("/out/wav"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_reports_first_occurrence_only() {
        let folders = FolderSet::new();
        assert!(folders.insert(Utf8Path::new("/a/b")));
        assert!(!folders.insert(Utf8Path::new("/a/b")));
        assert_eq!(folders.len(), 1);
    }

    #[test]
    fn test_ensure_creates_once() {
        let temp = TempDir::new().unwrap();
        let dir = utf8(&temp.path().join("x/y"));
        let folders = FolderSet::new();

        let first = tokio_test::block_on(folders.ensure(&dir)).unwrap();
        let second = tokio_test::block_on(folders.ensure(&dir)).unwrap();

        assert!(first);
        assert!(!second);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_seeded_folder_is_not_recreated() {
        let temp = TempDir::new().unwrap();
        let root = utf8(temp.path());
        let folders = FolderSet::new();
        folders.insert(&root.join("wav/seeded"));

        let files = vec![root.join("wem/seeded/a.wem")];
        let created = tokio_test::block_on(mirror_folders(
            &files,
            &root.join("wem"),
            &root.join("wav"),
            &folders,
        ))
        .unwrap();

        assert_eq!(created, 0);
    }
}
