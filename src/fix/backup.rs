// src/fix/backup.rs
//! Sibling backup artifacts (`<file>.codex.bak`) and the orphan sweep.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::constants::BACKUP_SUFFIX;
use crate::error::{CodexError, Result};

/// Path of the backup artifact for `target`.
#[must_use]
pub fn backup_path_for(target: &Path) -> PathBuf {
    let mut name: OsString = target.file_name().map(OsString::from).unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    target.with_file_name(name)
}

#[must_use]
pub fn is_backup_artifact(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with(BACKUP_SUFFIX))
}

/// Pre-mutation copy of one file.
///
/// Resolve it with [`Backup::discard`] (keep the mutated file) or
/// [`Backup::restore`] (put the original bytes back). If it is dropped
/// unresolved, e.g. while unwinding from a panic, it restores.
#[derive(Debug)]
pub struct Backup {
    target: PathBuf,
    backup: PathBuf,
    resolved: bool,
}

impl Backup {
    /// Copies `target` byte-for-byte to its sibling backup path.
    ///
    /// # Errors
    /// Returns error if the copy cannot be written; no artifact is left.
    pub fn create(target: &Path) -> io::Result<Self> {
        let backup = backup_path_for(target);
        if let Err(e) = fs::copy(target, &backup) {
            let _ = fs::remove_file(&backup);
            return Err(e);
        }
        Ok(Self {
            target: target.to_path_buf(),
            backup,
            resolved: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.backup
    }

    /// Keeps the current file content and deletes the artifact.
    ///
    /// # Errors
    /// Returns error if the artifact cannot be removed. The target is
    /// untouched either way.
    pub fn discard(mut self) -> io::Result<()> {
        self.resolved = true;
        fs::remove_file(&self.backup)
    }

    /// Overwrites the target in place with the saved bytes, then deletes
    /// the artifact.
    ///
    /// # Errors
    /// Returns error if the copy back fails. The artifact is then kept so
    /// the original content is not lost.
    pub fn restore(mut self) -> io::Result<()> {
        self.resolved = true;
        restore_into(&self.backup, &self.target)
    }
}

impl Drop for Backup {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        warn!("unresolved backup for {}, restoring", self.target.display());
        if let Err(e) = restore_into(&self.backup, &self.target) {
            warn!("restore of {} failed: {e}", self.target.display());
        }
    }
}

fn restore_into(backup: &Path, target: &Path) -> io::Result<()> {
    fs::copy(backup, target)?;
    fs::remove_file(backup)
}

/// Deletes every `*.codex.bak` file under `root` and returns how many were
/// removed. Meant to run before a fix run and after an interrupted one.
///
/// # Errors
/// Returns error if `root` does not exist.
pub fn remove_orphaned_backups(root: &Path) -> Result<usize> {
    if !root.exists() {
        return Err(CodexError::BadRoot(root.to_path_buf()));
    }

    let mut removed = 0;
    for entry in WalkDir::new(root).follow_links(false).into_iter().flatten() {
        if !entry.file_type().is_file() || !is_backup_artifact(entry.path()) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                debug!("removed orphaned backup {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("could not remove {}: {e}", entry.path().display()),
        }
    }
    Ok(removed)
}
