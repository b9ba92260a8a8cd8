use super::engine::{DocumentStore, Filter};
use crate::core::{Document, DomainError, EntityId, Result, UPDATED_AT_FIELD};
use crate::transaction::Session;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed view of one collection of a `DocumentStore`.
pub struct Repository<D> {
    store: Arc<dyn DocumentStore>,
    _document: PhantomData<fn() -> D>,
}

impl<D> Clone for Repository<D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _document: PhantomData,
        }
    }
}

impl<D: Document> Repository<D> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _document: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn find_all(&self) -> Result<Vec<D>> {
        decode_all(self.store.find(D::COLLECTION, &Filter::All).await?)
    }

    pub async fn find_by_ids(&self, ids: &[EntityId]) -> Result<Vec<D>> {
        decode_all(
            self.store
                .find(D::COLLECTION, &Filter::Ids(ids.to_vec()))
                .await?,
        )
    }

    pub async fn find_by_id(&self, id: EntityId) -> Result<Option<D>> {
        self.store
            .find_by_id(D::COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Apply a sparse patch in one storage call. `updated_at` is stamped
    /// here; the store bumps the version.
    pub async fn find_one_and_update<P>(&self, id: EntityId, patch: &P) -> Result<Option<D>>
    where
        P: Serialize + Sync,
    {
        let mut fields = match serde_json::to_value(patch)? {
            Value::Object(fields) => fields,
            other => {
                return Err(DomainError::storage(format!(
                    "patch for {} must be an object, got {other}",
                    D::COLLECTION
                )));
            }
        };
        fields.insert(UPDATED_AT_FIELD.to_string(), serde_json::to_value(Utc::now())?);

        self.store
            .find_one_and_update(D::COLLECTION, id, fields)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn save(&self, document: &D, session: Option<&mut Session>) -> Result<D> {
        let stored = self
            .store
            .save(D::COLLECTION, serde_json::to_value(document)?, session)
            .await?;
        decode(stored)
    }

    pub async fn remove(&self, id: EntityId) -> Result<bool> {
        self.store.remove(D::COLLECTION, id).await
    }
}

fn decode<D: Document>(value: Value) -> Result<D> {
    Ok(serde_json::from_value(value)?)
}

fn decode_all<D: Document>(values: Vec<Value>) -> Result<Vec<D>> {
    values.into_iter().map(decode).collect()
}
