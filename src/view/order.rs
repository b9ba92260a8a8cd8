use super::{CustomerView, Relation};
use crate::context::Loaders;
use crate::core::{EntityId, Metadata, OrderStatus, Result, UserId};
use crate::model::Order;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

/// Read-only order projection whose `customer` relation resolves lazily
/// through the operation's customer loader.
#[derive(Clone)]
pub struct OrderView {
    record: Order,
    loaders: Arc<Loaders>,
}

impl OrderView {
    pub fn new(record: Order, loaders: Arc<Loaders>) -> Self {
        Self { record, loaders }
    }

    pub fn id(&self) -> EntityId {
        self.record.id
    }

    pub fn number(&self) -> &str {
        &self.record.number
    }

    pub fn customer_id(&self) -> EntityId {
        self.record.customer
    }

    pub fn order_status(&self) -> OrderStatus {
        self.record.order_status
    }

    pub fn metadata(&self) -> &[Metadata] {
        &self.record.metadata
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.record.created_by
    }

    pub fn updated_by(&self) -> Option<UserId> {
        self.record.updated_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.record.updated_at
    }

    pub fn record(&self) -> &Order {
        &self.record
    }

    /// Resolve the owning customer; `None` when it no longer exists.
    pub fn customer(&self) -> BoxFuture<'static, Result<Option<CustomerView>>> {
        resolve_customer(self.record.customer, Arc::clone(&self.loaders))
    }

    pub fn customer_relation(&self) -> Relation<Option<CustomerView>> {
        let id = self.record.customer;
        let loaders = Arc::clone(&self.loaders);
        Relation::new(move || resolve_customer(id, Arc::clone(&loaders)))
    }
}

fn resolve_customer(
    id: EntityId,
    loaders: Arc<Loaders>,
) -> BoxFuture<'static, Result<Option<CustomerView>>> {
    let pending = loaders.customers.load(id);
    async move {
        let customer = pending.await?;
        Ok(customer.map(|customer| CustomerView::new(customer, loaders)))
    }
    .boxed()
}

impl std::fmt::Debug for OrderView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderView")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
