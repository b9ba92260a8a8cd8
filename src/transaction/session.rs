use super::{Change, Transaction, TransactionId, TransactionManager};
use crate::core::{DomainError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

/// Scoped unit of work handed out by a store.
///
/// A session owns at most one transaction at a time. Ending the session, or
/// dropping it on an early-return path, releases it from the store's
/// manager and discards any writes still staged in an active transaction.
pub struct Session {
    id: SessionId,
    transaction: Option<Transaction>,
    manager: Arc<TransactionManager>,
    ended: bool,
}

impl Session {
    pub(crate) fn new(manager: Arc<TransactionManager>) -> Self {
        Self {
            id: SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::SeqCst)),
            transaction: None,
            manager,
            ended: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction
            .as_ref()
            .is_some_and(|txn| txn.state().is_active())
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    pub fn start_transaction(&mut self) -> Result<TransactionId> {
        if self.in_transaction() {
            return Err(DomainError::storage(format!(
                "{} already has an active transaction",
                self.id
            )));
        }

        let txn = Transaction::begin();
        let txn_id = txn.id();
        self.transaction = Some(txn);
        self.manager.record_begin();
        debug!(session = %self.id, transaction = %txn_id, "transaction started");
        Ok(txn_id)
    }

    pub fn stage(&mut self, change: Change) -> Result<()> {
        self.active_mut()?.stage(change)
    }

    /// Writes staged in the active transaction, in issue order.
    pub fn staged(&self) -> Result<&[Change]> {
        match &self.transaction {
            Some(txn) if txn.state().is_active() => Ok(txn.changes()),
            _ => Err(self.no_transaction()),
        }
    }

    pub fn mark_committed(&mut self) -> Result<()> {
        self.active_mut()?.commit()?;
        self.manager.record_commit();
        Ok(())
    }

    pub fn mark_aborted(&mut self) -> Result<()> {
        self.active_mut()?.rollback()?;
        self.manager.record_abort();
        Ok(())
    }

    /// Release the session. An active transaction is rolled back first.
    pub fn end(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        if self.in_transaction() {
            warn!(session = %self.id, "session ended with an active transaction; staged writes discarded");
            if self.mark_aborted().is_err() {
                warn!(session = %self.id, "failed to roll back transaction on release");
            }
        }
        self.manager.release(self.id);
    }

    fn active_mut(&mut self) -> Result<&mut Transaction> {
        let err = self.no_transaction();
        match self.transaction.as_mut() {
            Some(txn) if txn.state().is_active() => Ok(txn),
            _ => Err(err),
        }
    }

    fn no_transaction(&self) -> DomainError {
        DomainError::storage(format!("{} has no active transaction", self.id))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("transaction", &self.transaction)
            .field("ended", &self.ended)
            .finish()
    }
}
