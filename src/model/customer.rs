use crate::core::{Coordinates, Document, EntityId, Metadata, ModelStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Persisted customer record.
///
/// `orders` is the canonical back-reference to every order whose `customer`
/// field points here. It only grows through order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub status: ModelStatus,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub orders: Vec<EntityId>,
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Customer {
    pub fn new(input: NewCustomer, created_by: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            name: input.name,
            coordinates: input.coordinates,
            status: ModelStatus::Active,
            metadata: input.metadata,
            orders: Vec::new(),
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Append an order id to the back-reference list.
    pub fn link_order(&mut self, order_id: EntityId) {
        self.orders.push(order_id);
        self.updated_at = Utc::now();
    }

    pub fn is_active(&self) -> bool {
        self.status == ModelStatus::Active
    }
}

impl Document for Customer {
    const COLLECTION: &'static str = "customers";

    fn id(&self) -> EntityId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
}

impl NewCustomer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(Metadata::new(key, value));
        self
    }

    pub fn with_coordinates(mut self, longitude: f64, latitude: f64) -> Self {
        self.coordinates = Some(Coordinates {
            longitude,
            latitude,
        });
        self
    }
}

/// Fields a caller may change on an existing customer.
///
/// Has no `orders` field: the back-reference list is only written by order
/// creation. `coordinates` is tri-state: absent leaves the stored value,
/// `Some(None)` (an explicit `null`) clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub coordinates: Option<Option<Coordinates>>,
    pub metadata: Option<Vec<Metadata>>,
}

/// Keeps an explicit `null` apart from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Sparse field set applied in a single find-and-update call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CustomerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Some(None)` is written as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Option<Coordinates>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<Metadata>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ModelStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<UserId>,
}

impl CustomerPatch {
    pub fn from_update(update: CustomerUpdate, updated_by: Option<UserId>) -> Self {
        Self {
            name: update.name,
            coordinates: update.coordinates,
            metadata: update.metadata,
            status: None,
            updated_by,
        }
    }

    /// Soft delete.
    pub fn deactivate(updated_by: Option<UserId>) -> Self {
        Self {
            status: Some(ModelStatus::Inactive),
            updated_by,
            ..Self::default()
        }
    }
}
