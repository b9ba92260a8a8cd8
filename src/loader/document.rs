use super::{BatchFn, BatchLoader};
use crate::core::{Document, EntityId, Result};
use crate::storage::Repository;
use async_trait::async_trait;

/// Batch fetch of documents by id with a single `find` on the collection.
pub struct DocumentFetcher<D> {
    repository: Repository<D>,
}

impl<D: Document> DocumentFetcher<D> {
    pub fn new(repository: Repository<D>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<D: Document> BatchFn<EntityId, D> for DocumentFetcher<D> {
    async fn load(&self, keys: &[EntityId]) -> Result<Vec<D>> {
        self.repository.find_by_ids(keys).await
    }

    fn key_of(&self, value: &D) -> EntityId {
        value.id()
    }
}

pub type DocumentLoader<D> = BatchLoader<EntityId, D, DocumentFetcher<D>>;
