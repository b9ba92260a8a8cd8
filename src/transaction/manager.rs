// ============================================================================
// Transaction Manager
// ============================================================================

use super::{Session, SessionId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Tracks open sessions and transaction outcomes for one store.
///
/// The open-session set uses a std mutex so a `Session` can release itself
/// from `Drop` on any exit path.
#[derive(Default)]
pub struct TransactionManager {
    open_sessions: Mutex<HashSet<SessionId>>,
    started: AtomicU64,
    committed: AtomicU64,
    aborted: AtomicU64,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_session(self: &Arc<Self>) -> Session {
        let session = Session::new(Arc::clone(self));
        self.open_sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id());
        session
    }

    pub(crate) fn release(&self, id: SessionId) {
        self.open_sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    pub(crate) fn record_begin(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abort(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of sessions started but not yet ended or dropped.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            open_sessions: self.open_sessions(),
            started: self.started.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionStats {
    pub open_sessions: usize,
    pub started: u64,
    pub committed: u64,
    pub aborted: u64,
}
