//! Transactional fixing: backups, per-file locks, rollback.

pub mod backup;
pub mod locks;
pub mod transaction;

pub use backup::{backup_path_for, remove_orphaned_backups, Backup};
pub use locks::{FileGuard, FileLockRegistry};
pub use transaction::{FixOutcome, FixTransaction, RollbackCause};
