//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ordergraph::core::{DomainError, EntityId, Result};
use ordergraph::storage::Filter;
use ordergraph::transaction::Session;
use ordergraph::{Caller, Client, DocumentStore, InMemoryStore, NewCustomer, NewOrder, ServiceConfig};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory store that records how it is called and can be told to fail.
pub struct InstrumentedStore {
    inner: InMemoryStore,
    calls: AtomicUsize,
    batches: Mutex<Vec<(String, Vec<EntityId>)>>,
    fail_finds: AtomicBool,
    fail_customer_saves: AtomicBool,
}

impl InstrumentedStore {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            inner: InMemoryStore::with_config(config),
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
            fail_finds: AtomicBool::new(false),
            fail_customer_saves: AtomicBool::new(false),
        }
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Every call made against the store so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Id-filtered finds against `collection`, in issue order.
    pub fn batches(&self, collection: &str) -> Vec<Vec<EntityId>> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == collection)
            .map(|(_, ids)| ids.clone())
            .collect()
    }

    pub fn reset_counters(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.batches.lock().unwrap().clear();
    }

    pub fn fail_finds(&self, fail: bool) {
        self.fail_finds.store(fail, Ordering::SeqCst);
    }

    pub fn fail_customer_saves(&self, fail: bool) {
        self.fail_customer_saves.store(fail, Ordering::SeqCst);
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InstrumentedStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>> {
        self.touch();
        if let Filter::Ids(ids) = filter {
            self.batches
                .lock()
                .unwrap()
                .push((collection.to_string(), ids.clone()));
        }
        if self.fail_finds.load(Ordering::SeqCst) {
            return Err(DomainError::storage("store unavailable"));
        }
        self.inner.find(collection, filter).await
    }

    async fn find_by_id(&self, collection: &str, id: EntityId) -> Result<Option<Value>> {
        self.touch();
        self.inner.find_by_id(collection, id).await
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        id: EntityId,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>> {
        self.touch();
        self.inner.find_one_and_update(collection, id, fields).await
    }

    async fn save(
        &self,
        collection: &str,
        document: Value,
        session: Option<&mut Session>,
    ) -> Result<Value> {
        self.touch();
        if collection == "customers" && self.fail_customer_saves.load(Ordering::SeqCst) {
            return Err(DomainError::storage("customer write rejected"));
        }
        self.inner.save(collection, document, session).await
    }

    async fn remove(&self, collection: &str, id: EntityId) -> Result<bool> {
        self.touch();
        self.inner.remove(collection, id).await
    }

    fn supports_transactions(&self) -> bool {
        self.inner.supports_transactions()
    }

    async fn start_session(&self) -> Result<Session> {
        self.touch();
        self.inner.start_session().await
    }

    async fn commit_transaction(&self, session: &mut Session) -> Result<()> {
        self.touch();
        self.inner.commit_transaction(session).await
    }
}

pub fn instrumented(config: ServiceConfig) -> (Arc<InstrumentedStore>, Client) {
    let store = Arc::new(InstrumentedStore::new(config.clone()));
    let client = Client::with_store(store.clone(), config);
    (store, client)
}

/// Customer with `orders` order numbers linked to it. Returns the customer id
/// and the order ids in creation order.
pub async fn seed_customer(client: &Client, name: &str, orders: usize) -> (EntityId, Vec<EntityId>) {
    let ctx = client.begin_operation(Caller::system());
    let customer = client
        .customers()
        .save_customer(&ctx, NewCustomer::named(name))
        .await
        .unwrap();

    let mut order_ids = Vec::with_capacity(orders);
    for n in 0..orders {
        let order = client
            .orders()
            .save_order(&ctx, NewOrder::new(format!("{name}-{n}"), customer.id()))
            .await
            .unwrap();
        order_ids.push(order.id());
    }
    (customer.id(), order_ids)
}
