//! Low-level persistence primitives shared by the config store, the outbox
//! and the credential alert: sidecar advisory locks and atomic replace writes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use fs2::FileExt;
use log::debug;

use crate::paths::{lock_path_for, temp_path_for};

/// Exclusive advisory lock on `<target>.lock`, released on drop.
#[derive(Debug)]
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    /// Blocks until the lock for `target` is held by this process.
    pub(crate) fn exclusive(target: &Path) -> io::Result<Self> {
        let file = open_lock_file(target)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    /// Takes the lock only if nobody else holds it. `Ok(None)` means contended.
    pub(crate) fn try_exclusive(target: &Path) -> io::Result<Option<Self>> {
        let file = open_lock_file(target)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn open_lock_file(target: &Path) -> io::Result<File> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path_for(target))
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Writes `bytes` to a temp file beside `path`, syncs it, then renames it into place.
/// Readers see either the old content or the new content, never a prefix.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path_for(path);
    let result = (|| {
        let mut tmp = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    debug!("Atomic write of {} bytes to {}", bytes.len(), path.display());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_replaces_content_and_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("file.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn lock_can_be_reacquired_after_drop() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("buffer.json");
        {
            let _guard = FileLock::exclusive(&target).unwrap();
        }
        let _again = FileLock::exclusive(&target).unwrap();
        assert!(dir.path().join("buffer.json.lock").exists());
    }

    #[test]
    fn try_exclusive_reports_contention() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("buffer.json.flush");
        let held = FileLock::try_exclusive(&target).unwrap();
        assert!(held.is_some());
        assert!(FileLock::try_exclusive(&target).unwrap().is_none());
        drop(held);
        assert!(FileLock::try_exclusive(&target).unwrap().is_some());
    }
}
