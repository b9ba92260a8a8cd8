use crate::auth::{Caller, Operation};
use crate::config::ServiceConfig;
use crate::core::Result;
use crate::loader::{DocumentFetcher, DocumentLoader, LoaderStats};
use crate::model::{Customer, Order};
use crate::storage::{DocumentStore, Repository};
use crate::view::{CustomerView, OrderView};
use std::sync::Arc;

/// The loader pair backing every relation traversal of one operation.
pub struct Loaders {
    pub customers: DocumentLoader<Customer>,
    pub orders: DocumentLoader<Order>,
}

impl Loaders {
    pub fn new(store: Arc<dyn DocumentStore>, max_batch_size: usize) -> Self {
        Self {
            customers: DocumentLoader::new(DocumentFetcher::new(Repository::new(Arc::clone(
                &store,
            ))))
            .with_max_batch_size(max_batch_size),
            orders: DocumentLoader::new(DocumentFetcher::new(Repository::new(store)))
                .with_max_batch_size(max_batch_size),
        }
    }
}

/// State owned by a single top-level operation: who is calling and the
/// fresh loaders its views resolve relations through.
///
/// Build one per incoming query and drop it with the response. Nothing in it
/// is shared with other operations.
pub struct OperationContext {
    caller: Caller,
    loaders: Arc<Loaders>,
}

impl OperationContext {
    pub fn new(caller: Caller, store: Arc<dyn DocumentStore>, config: &ServiceConfig) -> Self {
        Self {
            caller,
            loaders: Arc::new(Loaders::new(store, config.max_batch_size)),
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn authorize(&self, operation: Operation) -> Result<()> {
        self.caller.authorize(operation)
    }

    pub fn loaders(&self) -> Arc<Loaders> {
        Arc::clone(&self.loaders)
    }

    pub fn customer_loader_stats(&self) -> LoaderStats {
        self.loaders.customers.stats()
    }

    pub fn order_loader_stats(&self) -> LoaderStats {
        self.loaders.orders.stats()
    }

    /// Wrap a customer read by this operation, priming the loader with it.
    pub fn customer_view(&self, customer: Customer) -> CustomerView {
        self.loaders.customers.prime(customer.id, customer.clone());
        CustomerView::new(customer, self.loaders())
    }

    /// Wrap an order read by this operation, priming the loader with it.
    pub fn order_view(&self, order: Order) -> OrderView {
        self.loaders.orders.prime(order.id, order.clone());
        OrderView::new(order, self.loaders())
    }
}
