// ============================================================================
// Order Linker
// ============================================================================
//
// Creates an order and appends its id to the owning customer's `orders` list
// as one unit.
//
// - The customer is resolved first. A missing customer fails the call before
//   anything is written.
// - With transaction support both writes are staged in one session and
//   committed together. The customer write is version-checked against the
//   read, so two links racing on the same customer cannot both commit.
// - Without transaction support the order is written first, then the
//   customer; if the customer write fails the order is removed again.
//
// ============================================================================

use crate::context::OperationContext;
use crate::core::{DomainError, EntityId, Result};
use crate::model::{Customer, NewOrder, Order};
use crate::storage::{DocumentStore, Repository};
use crate::transaction::Session;
use crate::view::OrderView;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TransactionalLinker {
    store: Arc<dyn DocumentStore>,
    customers: Repository<Customer>,
    orders: Repository<Order>,
}

impl TransactionalLinker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            customers: Repository::new(Arc::clone(&store)),
            orders: Repository::new(Arc::clone(&store)),
            store,
        }
    }

    /// Persist a new order linked to its customer and return it as a view
    /// bound to `ctx`'s loaders.
    pub async fn create_linked_order(
        &self,
        ctx: &OperationContext,
        input: NewOrder,
    ) -> Result<OrderView> {
        let customer_id = EntityId::parse(&input.customer)?;
        let Some(customer) = self.customers.find_by_id(customer_id).await? else {
            warn!(customer = %customer_id, number = %input.number, "no customer found for order");
            return Err(DomainError::ReferentialPrecondition(input.number));
        };

        let order = Order::new(
            input.number,
            customer.id,
            input.metadata,
            ctx.caller().user_id(),
        );

        let (order, customer) = if self.store.supports_transactions() {
            self.link_in_transaction(order, customer).await?
        } else {
            self.link_with_compensation(order, customer).await?
        };

        info!(order = %order.id, customer = %customer.id, "order linked to customer");
        ctx.loaders().customers.prime(customer.id, customer);
        Ok(ctx.order_view(order))
    }

    async fn link_in_transaction(
        &self,
        order: Order,
        customer: Customer,
    ) -> Result<(Order, Customer)> {
        let mut session = self.store.start_session().await?;
        let outcome = self.write_linked(&mut session, order, customer).await;

        if outcome.is_err() && session.in_transaction() {
            if let Err(err) = self.store.abort_transaction(&mut session).await {
                warn!(session = %session.id(), error = %err, "failed to abort link transaction");
            }
        }
        self.store.end_session(session).await;
        outcome
    }

    async fn write_linked(
        &self,
        session: &mut Session,
        order: Order,
        mut customer: Customer,
    ) -> Result<(Order, Customer)> {
        self.store.start_transaction(session).await?;

        let order = self.orders.save(&order, Some(&mut *session)).await?;
        customer.link_order(order.id);
        let customer = self.customers.save(&customer, Some(&mut *session)).await?;

        self.store.commit_transaction(session).await?;
        Ok((order, customer))
    }

    async fn link_with_compensation(
        &self,
        order: Order,
        mut customer: Customer,
    ) -> Result<(Order, Customer)> {
        let order = self.orders.save(&order, None).await?;
        customer.link_order(order.id);

        match self.customers.save(&customer, None).await {
            Ok(customer) => Ok((order, customer)),
            Err(err) => {
                warn!(order = %order.id, error = %err, "customer link failed; removing order");
                match self.orders.remove(order.id).await {
                    Ok(removed) => debug!(order = %order.id, removed, "order compensated"),
                    Err(undo) => {
                        warn!(order = %order.id, error = %undo, "failed to remove unlinked order")
                    }
                }
                Err(err)
            }
        }
    }
}
