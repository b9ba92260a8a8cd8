use super::{TransactionalLinker, update_by_id};
use crate::auth::Operation;
use crate::context::OperationContext;
use crate::core::{EntityId, Result};
use crate::model::{NewOrder, Order, OrderPatch, OrderUpdate};
use crate::storage::{DocumentStore, Repository};
use crate::view::OrderView;
use std::sync::Arc;
use tracing::{debug, info};

/// Order queries and mutations. Creation always goes through the linker.
#[derive(Clone)]
pub struct OrderService {
    orders: Repository<Order>,
    linker: Arc<TransactionalLinker>,
}

impl OrderService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            orders: Repository::new(Arc::clone(&store)),
            linker: Arc::new(TransactionalLinker::new(store)),
        }
    }

    pub async fn orders(&self, ctx: &OperationContext) -> Result<Vec<OrderView>> {
        ctx.authorize(Operation::Orders)?;
        let orders = self.orders.find_all().await?;
        debug!(count = orders.len(), "orders listed");
        Ok(orders.into_iter().map(|order| ctx.order_view(order)).collect())
    }

    pub async fn save_order(&self, ctx: &OperationContext, input: NewOrder) -> Result<OrderView> {
        ctx.authorize(Operation::SaveOrder)?;
        self.linker.create_linked_order(ctx, input).await
    }

    pub async fn get_order_by_id(
        &self,
        ctx: &OperationContext,
        id: &str,
    ) -> Result<Option<OrderView>> {
        ctx.authorize(Operation::GetOrderById)?;
        let id = EntityId::parse(id)?;
        Ok(self
            .orders
            .find_by_id(id)
            .await?
            .map(|order| ctx.order_view(order)))
    }

    pub async fn update_order(
        &self,
        ctx: &OperationContext,
        id: &str,
        update: OrderUpdate,
    ) -> Result<OrderView> {
        ctx.authorize(Operation::UpdateOrder)?;
        let id = EntityId::parse(id)?;
        let patch = OrderPatch::from_update(update, ctx.caller().user_id());
        update_by_id(&self.orders, id, &patch, |order| ctx.order_view(order)).await
    }

    /// Soft delete: the order stays stored with status `Cancelled`.
    pub async fn delete_order(&self, ctx: &OperationContext, id: &str) -> Result<OrderView> {
        ctx.authorize(Operation::DeleteOrder)?;
        let id = EntityId::parse(id)?;
        let patch = OrderPatch::cancel(ctx.caller().user_id());
        let view = update_by_id(&self.orders, id, &patch, |order| ctx.order_view(order)).await?;
        info!(order = %view.id(), "order cancelled");
        Ok(view)
    }
}
