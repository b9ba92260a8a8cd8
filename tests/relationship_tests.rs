/// Relationship tests
///
/// Lazy customer <-> order traversal through views.
/// Run with: cargo test --test relationship_tests

mod common;

use common::{instrumented, seed_customer};
use futures::future::try_join_all;
use ordergraph::{Caller, DocumentStore, ServiceConfig};

#[tokio::test]
async fn test_cycle_resolves_back_to_owner() {
    let (_, client) = instrumented(ServiceConfig::default());
    let (customer_id, orders) = seed_customer(&client, "ada", 1).await;

    let ctx = client.begin_operation(Caller::system());
    let customer = client
        .customers()
        .get_customer_by_id(&ctx, &customer_id.to_string())
        .await
        .unwrap()
        .unwrap();

    let linked = customer.orders().await.unwrap();
    let order = linked[0].as_ref().unwrap();
    assert_eq!(order.id(), orders[0]);

    let owner = order.customer().await.unwrap().unwrap();
    assert_eq!(owner.id(), customer_id);

    // Going around the cycle again stays finite and hits the cache.
    let again = owner.orders().await.unwrap();
    let again_owner = again[0].as_ref().unwrap().customer().await.unwrap().unwrap();
    assert_eq!(again_owner.id(), customer_id);
}

#[tokio::test]
async fn test_views_fetch_nothing_until_called() {
    let (store, client) = instrumented(ServiceConfig::default());
    let (customer_id, _) = seed_customer(&client, "ada", 2).await;

    let ctx = client.begin_operation(Caller::system());
    let customer = client
        .customers()
        .get_customer_by_id(&ctx, &customer_id.to_string())
        .await
        .unwrap()
        .unwrap();
    store.reset_counters();

    let relation = customer.orders_relation();
    assert_eq!(store.calls(), 0);

    let orders = relation.call().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(store.batches("orders").len(), 1);

    // Invoking the accessor again reuses the same loaders.
    relation.call().await.unwrap();
    assert_eq!(store.batches("orders").len(), 1);
}

#[tokio::test]
async fn test_stale_order_id_resolves_to_none() {
    let (store, client) = instrumented(ServiceConfig::default());
    let (customer_id, orders) = seed_customer(&client, "ada", 2).await;
    store.inner().remove("orders", orders[0]).await.unwrap();

    let ctx = client.begin_operation(Caller::system());
    let customer = client
        .customers()
        .get_customer_by_id(&ctx, &customer_id.to_string())
        .await
        .unwrap()
        .unwrap();

    let resolved = customer.orders().await.unwrap();
    assert!(resolved[0].is_none());
    assert_eq!(resolved[1].as_ref().map(|o| o.id()), Some(orders[1]));
}

#[tokio::test]
async fn test_listed_customers_are_not_refetched_from_orders() {
    let (store, client) = instrumented(ServiceConfig::default());
    seed_customer(&client, "ada", 2).await;
    seed_customer(&client, "grace", 2).await;
    store.reset_counters();

    let ctx = client.begin_operation(Caller::system());
    let customers = client.customers().customers(&ctx).await.unwrap();

    let mut owners = Vec::new();
    for customer in &customers {
        for order in customer.orders().await.unwrap().into_iter().flatten() {
            owners.push(order.customer());
        }
    }
    let owners = try_join_all(owners).await.unwrap();

    assert_eq!(owners.len(), 4);
    assert!(owners.iter().all(Option::is_some));
    assert!(store.batches("customers").is_empty());
}

#[tokio::test]
async fn test_order_relation_loads_customer_once_for_many_orders() {
    let (store, client) = instrumented(ServiceConfig::default());
    let (customer_id, _) = seed_customer(&client, "ada", 3).await;
    store.reset_counters();

    let ctx = client.begin_operation(Caller::system());
    let orders = client.orders().orders(&ctx).await.unwrap();
    let relations: Vec<_> = orders.iter().map(|order| order.customer_relation()).collect();
    let owners = try_join_all(relations.iter().map(|relation| relation.call()))
        .await
        .unwrap();

    assert!(owners.iter().all(|owner| owner.as_ref().map(|c| c.id()) == Some(customer_id)));
    assert_eq!(store.batches("customers"), vec![vec![customer_id]]);
}
