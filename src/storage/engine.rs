use crate::core::{DomainError, EntityId, ID_FIELD, Result, VERSION_FIELD};
use crate::transaction::Session;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Selection passed to `DocumentStore::find`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Documents whose id is in the list. Unknown ids are skipped.
    Ids(Vec<EntityId>),
}

/// Document store contract - allows pluggable storage backends.
///
/// Documents are JSON objects carrying `id` and `version` fields. Every write
/// is version-checked: the stored version (0 when absent) must equal the
/// version of the incoming document, and the store bumps it on success.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of a collection matching the filter, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    async fn find_by_id(&self, collection: &str, id: EntityId) -> Result<Option<Value>>;

    /// Overwrite the given top-level fields of one document in a single
    /// call. Returns the updated document, or `None` when no document has
    /// that id.
    async fn find_one_and_update(
        &self,
        collection: &str,
        id: EntityId,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>>;

    /// Insert or replace a document. With a session in an active
    /// transaction the write is staged until commit; otherwise it is
    /// applied immediately. Returns the document as it will be stored.
    async fn save(
        &self,
        collection: &str,
        document: Value,
        session: Option<&mut Session>,
    ) -> Result<Value>;

    /// Physically delete a document. Only used to compensate a write on
    /// stores without multi-document transactions.
    async fn remove(&self, collection: &str, id: EntityId) -> Result<bool>;

    fn supports_transactions(&self) -> bool;

    async fn start_session(&self) -> Result<Session>;

    async fn start_transaction(&self, session: &mut Session) -> Result<()> {
        if !self.supports_transactions() {
            return Err(DomainError::storage(
                "multi-document transactions are not supported by this store",
            ));
        }
        session.start_transaction().map(|_| ())
    }

    /// Apply every staged write atomically, or none of them.
    async fn commit_transaction(&self, session: &mut Session) -> Result<()>;

    async fn abort_transaction(&self, session: &mut Session) -> Result<()> {
        session.mark_aborted()
    }

    async fn end_session(&self, session: Session) {
        session.end();
    }
}

pub(crate) fn document_id(document: &Value) -> Result<EntityId> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::storage("document has no id"))
        .and_then(EntityId::parse)
}

pub(crate) fn document_version(document: &Value) -> u64 {
    document
        .get(VERSION_FIELD)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}
