// ============================================================================
// Transaction State
// ============================================================================
//
// A transaction is Active until it is committed or aborted, and never leaves
// a terminal state. While Active it accumulates the session's staged writes;
// the store applies them as one unit at commit.
//
// ============================================================================

use super::Change;
use crate::core::{DomainError, Result};
use std::sync::atomic::{AtomicU64, Ordering};

static TXN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn next() -> Self {
        TransactionId(TXN_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    Aborted,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        *self == TransactionState::Active
    }

    fn as_str(&self) -> &'static str {
        match self {
            TransactionState::Active => "active",
            TransactionState::Committed => "committed",
            TransactionState::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A multi-document transaction and its staged write set.
#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    /// Writes in issue order.
    staged: Vec<Change>,
}

impl Transaction {
    pub fn begin() -> Self {
        Self {
            id: TransactionId::next(),
            state: TransactionState::Active,
            staged: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn changes(&self) -> &[Change] {
        &self.staged
    }

    pub fn stage(&mut self, change: Change) -> Result<()> {
        self.ensure_active("stage a write")?;
        self.staged.push(change);
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        self.ensure_active("commit")?;
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Abort and drop the staged writes.
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_active("roll back")?;
        self.staged.clear();
        self.state = TransactionState::Aborted;
        Ok(())
    }

    fn ensure_active(&self, action: &str) -> Result<()> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(DomainError::storage(format!(
                "cannot {action}: {} is {}",
                self.id, self.state
            )))
        }
    }
}
