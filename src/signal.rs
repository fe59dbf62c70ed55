//! Cooperative cancellation for a run.
//!
//! A first Ctrl-C sets a flag that stops new work from being dispatched;
//! in-flight files finish (or roll back) normally. The handler then
//! restores the default disposition, so a second Ctrl-C terminates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Shared cancellation flag, cheap to clone into workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    watch_interrupt: bool,
}

impl CancelToken {
    /// A token that is cancelled only through [`CancelToken::cancel`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips on SIGINT. Installs the handler.
    #[must_use]
    pub fn with_interrupt() -> Self {
        install_interrupt_handler();
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            watch_interrupt: true,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || (self.watch_interrupt && INTERRUPTED.load(Ordering::SeqCst))
    }
}

#[cfg(unix)]
extern "C" fn on_sigint(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
    // SAFETY: signal(2) is async-signal-safe.
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

#[cfg(unix)]
fn install_interrupt_handler() {
    INTERRUPTED.store(false, Ordering::SeqCst);
    let handler = on_sigint as extern "C" fn(libc::c_int);
    // SAFETY: the handler only touches an atomic and calls signal(2).
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
    }

    #[test]
    fn plain_token_ignores_global_interrupt_flag() {
        let token = CancelToken::new();
        INTERRUPTED.store(true, Ordering::SeqCst);
        assert!(!token.is_cancelled());
        INTERRUPTED.store(false, Ordering::SeqCst);
    }
}
