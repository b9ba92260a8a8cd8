use super::update_by_id;
use crate::auth::Operation;
use crate::context::OperationContext;
use crate::core::{EntityId, Result};
use crate::model::{Customer, CustomerPatch, CustomerUpdate, NewCustomer};
use crate::storage::{DocumentStore, Repository};
use crate::view::CustomerView;
use std::sync::Arc;
use tracing::{debug, info};

/// Customer queries and mutations. Every call authorizes first.
#[derive(Clone)]
pub struct CustomerService {
    customers: Repository<Customer>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            customers: Repository::new(store),
        }
    }

    pub async fn customers(&self, ctx: &OperationContext) -> Result<Vec<CustomerView>> {
        ctx.authorize(Operation::Customers)?;
        let customers = self.customers.find_all().await?;
        debug!(count = customers.len(), "customers listed");
        Ok(customers
            .into_iter()
            .map(|customer| ctx.customer_view(customer))
            .collect())
    }

    pub async fn save_customer(
        &self,
        ctx: &OperationContext,
        input: NewCustomer,
    ) -> Result<CustomerView> {
        ctx.authorize(Operation::SaveCustomer)?;
        let customer = Customer::new(input, ctx.caller().user_id());
        let saved = self.customers.save(&customer, None).await?;
        info!(customer = %saved.id, "customer created");
        Ok(ctx.customer_view(saved))
    }

    pub async fn get_customer_by_id(
        &self,
        ctx: &OperationContext,
        id: &str,
    ) -> Result<Option<CustomerView>> {
        ctx.authorize(Operation::GetCustomerById)?;
        let id = EntityId::parse(id)?;
        Ok(self
            .customers
            .find_by_id(id)
            .await?
            .map(|customer| ctx.customer_view(customer)))
    }

    pub async fn update_customer(
        &self,
        ctx: &OperationContext,
        id: &str,
        update: CustomerUpdate,
    ) -> Result<CustomerView> {
        ctx.authorize(Operation::UpdateCustomer)?;
        let id = EntityId::parse(id)?;
        let patch = CustomerPatch::from_update(update, ctx.caller().user_id());
        update_by_id(&self.customers, id, &patch, |customer| {
            ctx.customer_view(customer)
        })
        .await
    }

    /// Soft delete: the customer stays stored with status `Inactive`.
    pub async fn delete_customer(&self, ctx: &OperationContext, id: &str) -> Result<CustomerView> {
        ctx.authorize(Operation::DeleteCustomer)?;
        let id = EntityId::parse(id)?;
        let patch = CustomerPatch::deactivate(ctx.caller().user_id());
        let view = update_by_id(&self.customers, id, &patch, |customer| {
            ctx.customer_view(customer)
        })
        .await?;
        info!(customer = %view.id(), "customer deactivated");
        Ok(view)
    }
}
