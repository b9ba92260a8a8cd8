/// Operation tests
///
/// Authorization, partial updates, soft deletes and error payloads of the
/// customer and order operations.
/// Run with: cargo test --test operation_tests

mod common;

use common::{instrumented, seed_customer};
use ordergraph::core::{Metadata, ModelStatus, OrderStatus};
use ordergraph::{
    Caller, CustomerUpdate, DomainError, EntityId, NewCustomer, NewOrder, OrderUpdate,
    ServiceConfig, scopes,
};

#[tokio::test]
async fn test_denied_operations_never_touch_the_store() {
    let (store, client) = instrumented(ServiceConfig::default());
    let (customer_id, orders) = seed_customer(&client, "ada", 1).await;
    let customer_id = customer_id.to_string();
    let order_id = orders[0].to_string();
    store.reset_counters();

    let ctx = client.begin_operation(Caller::anonymous());
    let customers = client.customers();
    let order_ops = client.orders();

    let results = vec![
        customers.customers(&ctx).await.err(),
        customers.save_customer(&ctx, NewCustomer::named("x")).await.err(),
        customers.get_customer_by_id(&ctx, &customer_id).await.err(),
        customers
            .update_customer(&ctx, &customer_id, CustomerUpdate::default())
            .await
            .err(),
        customers.delete_customer(&ctx, &customer_id).await.err(),
        order_ops.orders(&ctx).await.err(),
        order_ops
            .save_order(&ctx, NewOrder::new("x", &customer_id))
            .await
            .err(),
        order_ops.get_order_by_id(&ctx, &order_id).await.err(),
        order_ops
            .update_order(&ctx, &order_id, OrderUpdate::default())
            .await
            .err(),
        order_ops.delete_order(&ctx, &order_id).await.err(),
    ];

    assert!(results.iter().all(|err| *err == Some(DomainError::AccessDenied)));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_broad_or_specific_scope_is_enough() {
    let (_, client) = instrumented(ServiceConfig::default());
    let (customer_id, _) = seed_customer(&client, "ada", 0).await;
    let id = customer_id.to_string();

    let broad = client.begin_operation(Caller::new(None, [scopes::customer::ALL]));
    let specific = client.begin_operation(Caller::new(None, [scopes::customer::GET_BY_ID]));
    let unrelated = client.begin_operation(Caller::new(
        None,
        [scopes::customer::UPDATE, scopes::order::ALL],
    ));

    assert!(client.customers().get_customer_by_id(&broad, &id).await.is_ok());
    assert!(client.customers().get_customer_by_id(&specific, &id).await.is_ok());
    assert_eq!(
        client
            .customers()
            .get_customer_by_id(&unrelated, &id)
            .await
            .unwrap_err(),
        DomainError::AccessDenied
    );
}

#[tokio::test]
async fn test_audit_fields_follow_caller() {
    let (_, client) = instrumented(ServiceConfig::default());
    let creator = EntityId::new();
    let editor = EntityId::new();

    let ctx = client.begin_operation(Caller::new(Some(creator), [scopes::customer::ALL]));
    let saved = client
        .customers()
        .save_customer(&ctx, NewCustomer::named("ada"))
        .await
        .unwrap();
    assert_eq!(saved.created_by(), Some(creator));
    assert_eq!(saved.updated_by(), None);

    let ctx = client.begin_operation(Caller::new(Some(editor), [scopes::customer::UPDATE]));
    let update = CustomerUpdate {
        name: Some("grace".into()),
        ..CustomerUpdate::default()
    };
    let updated = client
        .customers()
        .update_customer(&ctx, &saved.id().to_string(), update)
        .await
        .unwrap();
    assert_eq!(updated.created_by(), Some(creator));
    assert_eq!(updated.updated_by(), Some(editor));
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let (_, client) = instrumented(ServiceConfig::default());
    let ctx = client.begin_operation(Caller::system());
    let original = client
        .customers()
        .save_customer(
            &ctx,
            NewCustomer::named("ada")
                .with_coordinates(13.4, 52.5)
                .with_metadata("tier", "gold"),
        )
        .await
        .unwrap();

    let ctx = client.begin_operation(Caller::system());
    let update = CustomerUpdate {
        name: Some("X".into()),
        ..CustomerUpdate::default()
    };
    let updated = client
        .customers()
        .update_customer(&ctx, &original.id().to_string(), update)
        .await
        .unwrap();

    assert_eq!(updated.name(), "X");
    assert_eq!(updated.coordinates(), original.coordinates());
    assert_eq!(updated.metadata(), &[Metadata::new("tier", "gold")]);
    assert_eq!(updated.status(), ModelStatus::Active);
    assert_eq!(updated.created_at(), original.created_at());
    assert!(updated.updated_at() >= original.updated_at());
}

#[tokio::test]
async fn test_update_can_clear_coordinates() {
    let (_, client) = instrumented(ServiceConfig::default());
    let ctx = client.begin_operation(Caller::system());
    let original = client
        .customers()
        .save_customer(&ctx, NewCustomer::named("ada").with_coordinates(13.4, 52.5))
        .await
        .unwrap();
    assert!(original.coordinates().is_some());

    let ctx = client.begin_operation(Caller::system());
    let update = CustomerUpdate {
        coordinates: Some(None),
        ..CustomerUpdate::default()
    };
    let cleared = client
        .customers()
        .update_customer(&ctx, &original.id().to_string(), update)
        .await
        .unwrap();
    assert_eq!(cleared.coordinates(), None);
    assert_eq!(cleared.name(), "ada");

    let ctx = client.begin_operation(Caller::system());
    let reread = client
        .customers()
        .get_customer_by_id(&ctx, &original.id().to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reread.coordinates(), None);
}

#[tokio::test]
async fn test_update_of_unknown_id_is_not_found() {
    let (store, client) = instrumented(ServiceConfig::default());
    let ctx = client.begin_operation(Caller::system());
    let missing = EntityId::new().to_string();

    let err = client
        .customers()
        .update_customer(&ctx, &missing, CustomerUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
    assert_eq!(err.payload().code.as_str(), "7001");

    let err = client
        .orders()
        .delete_order(&ctx, &missing)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
    assert_eq!(store.inner().count("customers").await.unwrap(), 0);
    assert_eq!(store.inner().count("orders").await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_customer_is_soft() {
    let (_, client) = instrumented(ServiceConfig::default());
    let (customer_id, orders) = seed_customer(&client, "ada", 1).await;

    let ctx = client.begin_operation(Caller::system());
    let deleted = client
        .customers()
        .delete_customer(&ctx, &customer_id.to_string())
        .await
        .unwrap();
    assert_eq!(deleted.status(), ModelStatus::Inactive);

    let ctx = client.begin_operation(Caller::system());
    let listed = client.customers().customers(&ctx).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status(), ModelStatus::Inactive);
    assert_eq!(listed[0].order_ids(), orders.as_slice());
}

#[tokio::test]
async fn test_delete_order_is_soft_and_keeps_back_reference() {
    let (_, client) = instrumented(ServiceConfig::default());
    let (customer_id, orders) = seed_customer(&client, "ada", 1).await;

    let ctx = client.begin_operation(Caller::system());
    let cancelled = client
        .orders()
        .delete_order(&ctx, &orders[0].to_string())
        .await
        .unwrap();
    assert_eq!(cancelled.order_status(), OrderStatus::Cancelled);

    let owner = cancelled.customer().await.unwrap().unwrap();
    assert_eq!(owner.id(), customer_id);
    assert_eq!(owner.order_ids(), orders.as_slice());
}

#[tokio::test]
async fn test_update_order_fields() {
    let (_, client) = instrumented(ServiceConfig::default());
    let (_, orders) = seed_customer(&client, "ada", 1).await;

    let ctx = client.begin_operation(Caller::system());
    let update = OrderUpdate {
        order_status: Some(OrderStatus::Completed),
        ..OrderUpdate::default()
    };
    let updated = client
        .orders()
        .update_order(&ctx, &orders[0].to_string(), update)
        .await
        .unwrap();

    assert_eq!(updated.order_status(), OrderStatus::Completed);
    assert_eq!(updated.number(), "ada-0");
}

#[tokio::test]
async fn test_lookup_by_id() {
    let (_, client) = instrumented(ServiceConfig::default());
    let (_, orders) = seed_customer(&client, "ada", 1).await;
    let ctx = client.begin_operation(Caller::system());

    let found = client
        .orders()
        .get_order_by_id(&ctx, &orders[0].to_string())
        .await
        .unwrap();
    assert_eq!(found.map(|o| o.id()), Some(orders[0]));

    let absent = client
        .orders()
        .get_order_by_id(&ctx, &EntityId::new().to_string())
        .await
        .unwrap();
    assert!(absent.is_none());

    let err = client
        .customers()
        .get_customer_by_id(&ctx, "")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidIdentifier(_)));
}

#[test]
fn test_error_payload_hides_internal_messages() {
    let err = DomainError::conflict("customers 'abc' changed since it was read");
    let payload = serde_json::to_value(err.payload()).unwrap();

    assert_eq!(payload["code"], "2003");
    assert_eq!(payload["message"], "UNKNOWN ERROR");
    assert_eq!(payload["retryable"], true);

    let denied = serde_json::to_value(DomainError::AccessDenied.payload()).unwrap();
    assert_eq!(denied["code"], "4001");
}
