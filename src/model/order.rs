use crate::core::{Document, EntityId, Metadata, OrderStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted order record. `customer` is the canonical forward reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: EntityId,
    pub number: String,
    pub customer: EntityId,
    #[serde(default)]
    pub order_status: OrderStatus,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Order {
    pub fn new(
        number: impl Into<String>,
        customer: EntityId,
        metadata: Vec<Metadata>,
        created_by: Option<UserId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            number: number.into(),
            customer,
            order_status: OrderStatus::Pending,
            metadata,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> EntityId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Input for creating an order. `customer` is the raw id received from the
/// query layer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    pub number: String,
    pub customer: String,
    #[serde(default)]
    pub metadata: Vec<Metadata>,
}

impl NewOrder {
    pub fn new(number: impl Into<String>, customer: impl ToString) -> Self {
        Self {
            number: number.into(),
            customer: customer.to_string(),
            metadata: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(Metadata::new(key, value));
        self
    }
}

/// Fields a caller may change on an existing order. The owning customer is
/// fixed at creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    pub number: Option<String>,
    pub metadata: Option<Vec<Metadata>>,
    pub order_status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<Metadata>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<UserId>,
}

impl OrderPatch {
    pub fn from_update(update: OrderUpdate, updated_by: Option<UserId>) -> Self {
        Self {
            number: update.number,
            metadata: update.metadata,
            order_status: update.order_status,
            updated_by,
        }
    }

    /// Soft delete.
    pub fn cancel(updated_by: Option<UserId>) -> Self {
        Self {
            order_status: Some(OrderStatus::Cancelled),
            updated_by,
            ..Self::default()
        }
    }
}
