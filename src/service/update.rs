use crate::core::{Document, DomainError, EntityId, Result};
use crate::storage::Repository;
use serde::Serialize;
use tracing::debug;

/// Apply a sparse patch to one document in a single find-and-update call and
/// hand the updated record to `transform`.
///
/// Fails with `NotFound` when no document has `id`; nothing is written in
/// that case.
pub async fn update_by_id<D, P, T, F>(
    repository: &Repository<D>,
    id: EntityId,
    patch: &P,
    transform: F,
) -> Result<T>
where
    D: Document,
    P: Serialize + Sync,
    F: FnOnce(D) -> T,
{
    match repository.find_one_and_update(id, patch).await? {
        Some(updated) => {
            debug!(collection = D::COLLECTION, %id, version = updated.version(), "document updated");
            Ok(transform(updated))
        }
        None => Err(DomainError::not_found(D::COLLECTION, id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, CustomerPatch, NewCustomer};
    use crate::storage::{DocumentStore, InMemoryStore};
    use std::sync::Arc;

    fn repository() -> Repository<Customer> {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        Repository::new(store)
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let customers = repository();
        let patch = CustomerPatch {
            name: Some("X".into()),
            ..CustomerPatch::default()
        };

        let err = update_by_id(&customers, EntityId::new(), &patch, |c| c)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert!(customers.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_patched_fields_change() {
        let customers = repository();
        let original = customers
            .save(
                &Customer::new(NewCustomer::named("Ada").with_metadata("tier", "gold"), None),
                None,
            )
            .await
            .unwrap();

        let patch = CustomerPatch {
            name: Some("X".into()),
            ..CustomerPatch::default()
        };
        let name = update_by_id(&customers, original.id, &patch, |c| c.name)
            .await
            .unwrap();
        assert_eq!(name, "X");

        let stored = customers.find_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored.metadata, original.metadata);
        assert_eq!(stored.status, original.status);
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(stored.version, original.version + 1);
    }
}
