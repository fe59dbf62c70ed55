//! Per-file mutual exclusion for the fix phase.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

/// Exclusive hold on one resolved path. Released on drop, whatever the
/// exit path of the guarded section.
pub struct FileGuard {
    path: PathBuf,
    _guard: ArcMutexGuard<RawMutex, ()>,
}

impl FileGuard {
    /// The resolved path this guard protects.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Hands out one lock per resolved file path.
///
/// Entries are created on first request and live as long as the registry
/// (one run), so the table only grows.
#[derive(Default)]
pub struct FileLockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl FileLockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the lock for `path` is held.
    ///
    /// Textually different spellings of the same file (relative paths,
    /// `..` segments, symlinks) resolve to the same lock.
    #[must_use]
    pub fn acquire(&self, path: &Path) -> FileGuard {
        let resolved = resolve(path);
        let lock = self.lock_for_resolved(&resolved);
        FileGuard {
            path: resolved,
            _guard: lock.lock_arc(),
        }
    }

    /// Returns the shared lock for `path`, creating it if absent.
    #[must_use]
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.lock_for_resolved(&resolve(path))
    }

    fn lock_for_resolved(&self, resolved: &Path) -> Arc<Mutex<()>> {
        // Registry lock is held only for the lookup-or-insert.
        let mut map = self.locks.lock();
        Arc::clone(
            map.entry(resolved.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Number of distinct paths seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical absolute form of `path`, or its absolute form if the file
/// cannot be canonicalized (e.g. it does not exist yet).
#[must_use]
pub fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}
