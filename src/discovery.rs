// src/discovery.rs
//! Directory traversal that yields one `FileTask` per recognised source file.
//!
//! Ignored directories are pruned by the walker itself (`filter_entry`), so
//! their contents are never read from disk.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{CodexError, Result};
use crate::types::FileTask;

type EntryIter = Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>;

/// A lazy, one-shot traversal. Restarting requires calling [`scan`] again.
pub struct Scan {
    root: PathBuf,
    entries: EntryIter,
    stats: ScanStats,
}

/// Walk counters that stay readable after the [`Scan`] itself has been
/// handed to a consumer.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    visited: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl ScanStats {
    /// Number of directory entries the walker has examined so far.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visited.load(Ordering::Relaxed)
    }

    /// Number of entries that could not be read.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Starts a traversal of `root`, pruning any subdirectory whose name is in
/// `skip_dirs`.
///
/// The root is canonicalized first, so every yielded path is absolute.
///
/// # Errors
/// Returns `BadRoot` if `root` is not an existing directory.
pub fn scan(root: &Path, skip_dirs: &BTreeSet<String>) -> Result<Scan> {
    let root = fs::canonicalize(root).map_err(|_| CodexError::BadRoot(root.to_path_buf()))?;
    if !root.is_dir() {
        return Err(CodexError::BadRoot(root));
    }

    let stats = ScanStats::default();
    let counter = Arc::clone(&stats.visited);
    let skip = skip_dirs.clone();

    let entries = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |e| {
            counter.fetch_add(1, Ordering::Relaxed);
            !should_prune(e, &skip)
        });

    Ok(Scan {
        root,
        entries: Box::new(entries),
        stats,
    })
}

fn should_prune(entry: &DirEntry, skip: &BTreeSet<String>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && skip.contains(&*entry.file_name().to_string_lossy())
}

fn is_regular_or_linked_file(entry: &DirEntry) -> bool {
    let ft = entry.file_type();
    ft.is_file() || (ft.is_symlink() && entry.path().is_file())
}

impl Scan {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn stats(&self) -> ScanStats {
        self.stats.clone()
    }
}

impl Iterator for Scan {
    type Item = FileTask;

    fn next(&mut self) -> Option<FileTask> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if !is_regular_or_linked_file(&entry) {
                        continue;
                    }
                    if let Some(task) = FileTask::detect(entry.path()) {
                        return Some(task);
                    }
                }
                Err(e) => {
                    debug!("walk error under {}: {e}", self.root.display());
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }
}
