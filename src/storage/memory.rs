use super::Collection;
use super::engine::{DocumentStore, Filter, document_id, document_version};
use crate::config::ServiceConfig;
use crate::core::{DomainError, EntityId, Result, VERSION_FIELD};
use crate::transaction::{Change, Session, TransactionManager, TransactionStats};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock as StdRwLock};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info, warn};

/// Document store kept entirely in process memory.
///
/// Each collection sits behind its own lock. A commit write-locks every
/// collection its transaction touches, in name order, so concurrent commits
/// cannot deadlock and readers observe either none or all of a transaction.
pub struct InMemoryStore {
    /// Collection handles; the registry lock is only held to look one up.
    collections: StdRwLock<HashMap<String, Arc<RwLock<Collection>>>>,
    transactions: Arc<TransactionManager>,
    config: ServiceConfig,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        info!(
            database = %config.database,
            transactions = config.transactions,
            "opening in-memory document store"
        );
        Self {
            collections: StdRwLock::new(HashMap::new()),
            transactions: Arc::new(TransactionManager::new()),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Get a handle on a collection, creating it on first use
    pub fn collection(&self, name: &str) -> Result<Arc<RwLock<Collection>>> {
        if let Some(handle) = self.collections.read()?.get(name) {
            return Ok(Arc::clone(handle));
        }

        let mut collections = self.collections.write()?;
        let handle = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Collection::new(name))));
        Ok(Arc::clone(handle))
    }

    pub async fn count(&self, collection: &str) -> Result<usize> {
        let handle = self.collection(collection)?;
        let guard = handle.read().await;
        Ok(guard.len())
    }

    pub fn transaction_stats(&self) -> TransactionStats {
        self.transactions.stats()
    }

    async fn lock_for_commit(
        &self,
        changes: &[Change],
    ) -> Result<BTreeMap<String, OwnedRwLockWriteGuard<Collection>>> {
        let names: BTreeSet<&str> = changes.iter().map(Change::collection).collect();
        let mut guards = BTreeMap::new();
        for name in names {
            let handle = self.collection(name)?;
            guards.insert(name.to_string(), handle.write_owned().await);
        }
        Ok(guards)
    }

    fn validate(
        guards: &BTreeMap<String, OwnedRwLockWriteGuard<Collection>>,
        changes: &[Change],
    ) -> Result<Vec<u64>> {
        // Later writes to the same document in one transaction chain off the
        // version produced by the earlier ones.
        let mut pending: HashMap<(&str, EntityId), u64> = HashMap::new();
        let mut versions = Vec::with_capacity(changes.len());

        for change in changes {
            let key = (change.collection(), change.id());
            let current = match pending.get(&key) {
                Some(version) => *version,
                None => guards
                    .get(change.collection())
                    .map(|guard| guard.version_of(change.id()))
                    .ok_or_else(|| DomainError::storage("collection lock missing at commit"))?,
            };

            if current != change.expected_version() {
                return Err(DomainError::conflict(format!(
                    "{} '{}' changed since it was read (version {}, expected {})",
                    change.collection(),
                    change.id(),
                    current,
                    change.expected_version()
                )));
            }

            pending.insert(key, current + 1);
            versions.push(current + 1);
        }
        Ok(versions)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        let handle = self.collection(collection)?;
        let guard = handle.read().await;
        Ok(match filter {
            Filter::All => guard.scan(),
            Filter::Ids(ids) => guard.select(ids),
        })
    }

    async fn find_by_id(&self, collection: &str, id: EntityId) -> Result<Option<Value>> {
        let handle = self.collection(collection)?;
        let guard = handle.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        id: EntityId,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>> {
        let handle = self.collection(collection)?;
        let mut guard = handle.write().await;
        Ok(guard.patch(id, fields))
    }

    async fn save(
        &self,
        collection: &str,
        mut document: Value,
        session: Option<&mut Session>,
    ) -> Result<Value> {
        let id = document_id(&document)?;
        let expected_version = document_version(&document);

        if let Some(session) = session.filter(|session| session.in_transaction()) {
            if let Value::Object(fields) = &mut document {
                fields.insert(VERSION_FIELD.to_string(), Value::from(expected_version + 1));
            }
            let change = if expected_version == 0 {
                Change::Insert {
                    collection: collection.to_string(),
                    id,
                    document: document.clone(),
                }
            } else {
                Change::Replace {
                    collection: collection.to_string(),
                    id,
                    expected_version,
                    document: document.clone(),
                }
            };
            session.stage(change)?;
            debug!(session = %session.id(), collection, %id, "write staged");
            return Ok(document);
        }

        let handle = self.collection(collection)?;
        let mut guard = handle.write().await;
        guard.write(id, expected_version, document)
    }

    async fn remove(&self, collection: &str, id: EntityId) -> Result<bool> {
        let handle = self.collection(collection)?;
        let mut guard = handle.write().await;
        Ok(guard.remove(id))
    }

    fn supports_transactions(&self) -> bool {
        self.config.transactions
    }

    async fn start_session(&self) -> Result<Session> {
        Ok(self.transactions.open_session())
    }

    async fn commit_transaction(&self, session: &mut Session) -> Result<()> {
        let changes = session.staged()?.to_vec();
        let mut guards = self.lock_for_commit(&changes).await?;

        let versions = match Self::validate(&guards, &changes) {
            Ok(versions) => versions,
            Err(err) => {
                drop(guards);
                warn!(session = %session.id(), error = %err, "commit rejected; aborting transaction");
                session.mark_aborted()?;
                return Err(err);
            }
        };

        for (change, version) in changes.into_iter().zip(versions) {
            let id = change.id();
            let (collection, document) = match change {
                Change::Insert {
                    collection,
                    document,
                    ..
                }
                | Change::Replace {
                    collection,
                    document,
                    ..
                } => (collection, document),
            };
            if let Some(guard) = guards.get_mut(&collection) {
                guard.put(id, version, document);
            }
        }
        drop(guards);

        session.mark_committed()?;
        debug!(session = %session.id(), "transaction committed");
        Ok(())
    }
}
