use super::{OrderView, Relation};
use crate::context::Loaders;
use crate::core::{Coordinates, EntityId, Metadata, ModelStatus, Result, UserId};
use crate::model::Customer;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

/// Read-only customer projection whose `orders` relation resolves lazily
/// through the operation's order loader.
#[derive(Clone)]
pub struct CustomerView {
    record: Customer,
    loaders: Arc<Loaders>,
}

impl CustomerView {
    pub fn new(record: Customer, loaders: Arc<Loaders>) -> Self {
        Self { record, loaders }
    }

    pub fn id(&self) -> EntityId {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn coordinates(&self) -> Option<&Coordinates> {
        self.record.coordinates.as_ref()
    }

    pub fn status(&self) -> ModelStatus {
        self.record.status
    }

    pub fn metadata(&self) -> &[Metadata] {
        &self.record.metadata
    }

    pub fn order_ids(&self) -> &[EntityId] {
        &self.record.orders
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

    pub fn record(&self) -> &Customer {
        &self.record
    }

    /// Resolve every order id in the back-reference list, positionally.
    /// Ids whose order no longer exists resolve to `None`.
    pub fn orders(&self) -> BoxFuture<'static, Result<Vec<Option<OrderView>>>> {
        resolve_orders(self.record.orders.clone(), Arc::clone(&self.loaders))
    }

    /// The `orders` relation as a deferred accessor.
    pub fn orders_relation(&self) -> Relation<Vec<Option<OrderView>>> {
        let ids = self.record.orders.clone();
        let loaders = Arc::clone(&self.loaders);
        Relation::new(move || resolve_orders(ids.clone(), Arc::clone(&loaders)))
    }
}

fn resolve_orders(
    ids: Vec<EntityId>,
    loaders: Arc<Loaders>,
) -> BoxFuture<'static, Result<Vec<Option<OrderView>>>> {
    let pending = loaders.orders.load_many(ids);
    async move {
        let orders = pending.await?;
        Ok(orders
            .into_iter()
            .map(|order| order.map(|order| OrderView::new(order, Arc::clone(&loaders))))
            .collect())
    }
    .boxed()
}

impl std::fmt::Debug for CustomerView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerView")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}
