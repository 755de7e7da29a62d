//! Exclusive lock files.
//!
//! Held for as long as the guard lives and removed on drop, so every exit
//! path (including `?` and panics that unwind) releases it.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{QueueError, QueueResult};

#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
}

impl LockFile {
    /// Create `path` exclusively. Fails with `QueueError::Locked` when it
    /// already exists.
    pub fn acquire(path: impl Into<PathBuf>) -> QueueResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(QueueError::Locked { path });
            }
            Err(e) => return Err(e.into()),
        };
        writeln!(file, "{}", std::process::id())?;
        debug!(path = %path.display(), "Lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove lock file");
        }
    }
}

/// `<path>.lock`, next to the file it guards.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused_until_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/pipeline.lock");

        let guard = LockFile::acquire(&path).unwrap();
        assert!(path.exists());
        assert!(matches!(
            LockFile::acquire(&path),
            Err(QueueError::Locked { .. })
        ));

        drop(guard);
        assert!(!path.exists());
        assert!(LockFile::acquire(&path).is_ok());
    }

    #[test]
    fn released_on_early_return() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json.lock");

        fn fails_while_locked(path: &Path) -> QueueResult<()> {
            let _guard = LockFile::acquire(path)?;
            Err(QueueError::UnknownSlug("x".into()))
        }
        assert!(fails_while_locked(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(
            lock_path_for(Path::new("data/queue.json")),
            PathBuf::from("data/queue.json.lock")
        );
    }
}
