// ============================================================================
// OrderGraph Library
// ============================================================================

pub mod auth;
pub mod config;
pub mod context;
pub mod core;
pub mod loader;
pub mod model;
pub mod service;
pub mod storage;
pub mod transaction;
pub mod view;

// Re-export main types for convenience
pub use auth::{Caller, Decision, Operation, ScopeId, decide, scopes};
pub use config::ServiceConfig;
pub use context::{Loaders, OperationContext};
pub use core::{DomainError, EntityId, ErrorCode, ErrorPayload, Result};
pub use model::{Customer, CustomerUpdate, NewCustomer, NewOrder, Order, OrderUpdate};
pub use service::{CustomerService, OrderService, TransactionalLinker};
pub use storage::{DocumentStore, InMemoryStore};
pub use view::{CustomerView, OrderView, Relation};

use std::sync::Arc;
use tracing::debug;

// ============================================================================
// High-level Client API
// ============================================================================

/// Entry point tying a document store to the customer and order services.
///
/// Each top-level query should run against its own [`OperationContext`],
/// obtained from [`Client::begin_operation`], so loader caches never outlive
/// the query that filled them.
///
/// # Examples
///
/// ```
/// use ordergraph::{Caller, Client, NewCustomer, NewOrder};
///
/// # tokio_test::block_on(async {
/// let client = Client::new();
/// let ctx = client.begin_operation(Caller::system());
///
/// let customer = client
///     .customers()
///     .save_customer(&ctx, NewCustomer::named("Ada"))
///     .await
///     .unwrap();
/// let order = client
///     .orders()
///     .save_order(&ctx, NewOrder::new("A-1", customer.id()))
///     .await
///     .unwrap();
///
/// let owner = order.customer().await.unwrap().unwrap();
/// assert_eq!(owner.order_ids(), &[order.id()]);
/// # });
/// ```
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn DocumentStore>,
    config: ServiceConfig,
    customers: CustomerService,
    orders: OrderService,
}

impl Client {
    /// In-memory store with default configuration.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(InMemoryStore::with_config(config.clone()));
        Self::with_store(store, config)
    }

    /// Configuration from `ORDERGRAPH_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::with_config(ServiceConfig::from_env()?))
    }

    /// Run the services against any store implementation.
    pub fn with_store(store: Arc<dyn DocumentStore>, config: ServiceConfig) -> Self {
        debug!(
            database = %config.database,
            transactions = store.supports_transactions(),
            "client created"
        );
        Self {
            customers: CustomerService::new(Arc::clone(&store)),
            orders: OrderService::new(Arc::clone(&store)),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Fresh context (caller plus empty loaders) for one top-level query.
    pub fn begin_operation(&self, caller: Caller) -> OperationContext {
        OperationContext::new(caller, Arc::clone(&self.store), &self.config)
    }

    pub fn customers(&self) -> &CustomerService {
        &self.customers
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
