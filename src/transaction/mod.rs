// ============================================================================
// Transaction Management Module
// ============================================================================
//
// Sessions and multi-document transactions for the document store.
//
// - Session: scoped resource, released on end or drop
// - Transaction: Active -> Committed/Aborted with a staged write set
// - Change: a single staged document write, version-checked at commit
//
// ============================================================================

pub mod change;
pub mod manager;
pub mod session;
pub mod state;

pub use change::Change;
pub use manager::{TransactionManager, TransactionStats};
pub use session::{Session, SessionId};
pub use state::{Transaction, TransactionId, TransactionState};
