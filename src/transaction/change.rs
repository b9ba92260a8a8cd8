// ============================================================================
// Transaction Change Tracking
// ============================================================================
//
// Each Change is a write staged inside a transaction. Nothing is applied
// until commit; rollback simply drops the staged list.
//
// ============================================================================

use crate::core::EntityId;
use serde_json::Value;

/// A single staged document write
#[derive(Debug, Clone)]
pub enum Change {
    /// Insert a document that must not exist yet
    Insert {
        collection: String,
        id: EntityId,
        document: Value,
    },

    /// Replace a document read at `expected_version`
    Replace {
        collection: String,
        id: EntityId,
        expected_version: u64,
        document: Value,
    },
}

impl Change {
    pub fn collection(&self) -> &str {
        match self {
            Change::Insert { collection, .. } => collection,
            Change::Replace { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> EntityId {
        match self {
            Change::Insert { id, .. } | Change::Replace { id, .. } => *id,
        }
    }

    /// Version the stored document must have at commit time. Absent
    /// documents count as version 0.
    pub fn expected_version(&self) -> u64 {
        match self {
            Change::Insert { .. } => 0,
            Change::Replace {
                expected_version, ..
            } => *expected_version,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Change::Insert { .. })
    }
}
