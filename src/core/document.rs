use super::EntityId;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Field every stored document carries as its identity.
pub const ID_FIELD: &str = "id";

/// Store-managed optimistic concurrency counter. A document that was never
/// written has version 0.
pub const VERSION_FIELD: &str = "version";

/// Store-managed modification timestamp.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// A typed record living in one named collection of the document store.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the documents of this type are stored in.
    const COLLECTION: &'static str;

    fn id(&self) -> EntityId;

    fn version(&self) -> u64;
}
