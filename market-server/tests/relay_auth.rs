//! Location relay authorization tests
//!
//! Verifies the room gate: who may join, who may publish, and that
//! outsiders can never distinguish "forbidden" from "no such order".

mod common;

use common::*;
use market_server::auth::CurrentUser;
use market_server::delivery::AssignmentService;
use market_server::orders::{CreateOrderRequest, OrderItemRequest, OrderService};
use market_server::relay::{LocationHub, RelayService};
use shared::ErrorCode;
use shared::models::Role;

const PIN: &str = "1234";

fn current_user(id: i64, roles: &[Role]) -> CurrentUser {
    CurrentUser {
        id,
        username: format!("user-{id}"),
        roles: roles.to_vec(),
    }
}

struct RelayFixture {
    relay: RelayService,
    assignment: AssignmentService,
    order_id: i64,
    client_id: i64,
    runner_id: i64,
    provider_id: i64,
}

/// One confirmed-ready world: client order, provider product, active runner
async fn fixture(env: &TestEnv) -> RelayFixture {
    let city = seed_city(env, "madrid").await;
    let provider = seed_user(env, "provider", &[Role::Provider], None).await;
    let client = seed_user(env, "client", &[Role::Client], Some(PIN)).await;
    let product = seed_product(env, provider.id, city, "a", 1.0, 10).await;
    let runner = seed_runner(env, "runner", 40.41, -3.70).await;

    let order = OrderService::new(env.pool())
        .create_order(
            client.id,
            CreateOrderRequest {
                items: vec![OrderItemRequest {
                    product_id: product.id,
                    quantity: 1,
                }],
                delivery_address: None,
                destination: None,
                pin: PIN.to_string(),
            },
        )
        .await
        .expect("create order");

    RelayFixture {
        relay: RelayService::new(env.pool(), LocationHub::new()),
        assignment: AssignmentService::new(env.pool()),
        order_id: order.order.id,
        client_id: client.id,
        runner_id: runner.id,
        provider_id: provider.id,
    }
}

#[tokio::test]
async fn outsider_join_is_indistinguishable_from_missing_order() {
    let env = test_env().await;
    let fx = fixture(&env).await;
    let outsider = seed_user(&env, "outsider", &[Role::Client], None).await;
    let outsider = current_user(outsider.id, &[Role::Client]);

    let denied = fx
        .relay
        .join(fx.order_id, &outsider)
        .await
        .expect_err("outsider must be rejected");
    let missing = fx
        .relay
        .join(999_999, &outsider)
        .await
        .expect_err("missing order must be rejected");

    // Same code, same message: existence is not leaked
    assert_eq!(denied.code, missing.code);
    assert_eq!(denied.message, missing.message);
    assert_eq!(denied.code, ErrorCode::OrderNotFound);
}

#[tokio::test]
async fn participants_may_join() {
    let env = test_env().await;
    let fx = fixture(&env).await;
    fx.assignment
        .select_runner(fx.order_id, fx.runner_id, fx.client_id, &[Role::Client])
        .await
        .unwrap();

    for (id, roles) in [
        (fx.client_id, vec![Role::Client]),
        (fx.runner_id, vec![Role::Client, Role::Runner]),
        (fx.provider_id, vec![Role::Provider]),
    ] {
        let user = current_user(id, &roles);
        fx.relay
            .join(fx.order_id, &user)
            .await
            .unwrap_or_else(|e| panic!("participant {id} rejected: {e}"));
    }

    // Admin joins without being a participant
    let admin = seed_user(&env, "admin", &[Role::Admin], None).await;
    fx.relay
        .join(fx.order_id, &current_user(admin.id, &[Role::Admin]))
        .await
        .expect("admin join");
}

#[tokio::test]
async fn only_the_assigned_runner_may_publish() {
    let env = test_env().await;
    let fx = fixture(&env).await;

    let runner = current_user(fx.runner_id, &[Role::Client, Role::Runner]);
    let client = current_user(fx.client_id, &[Role::Client]);

    // Before assignment even the future runner is rejected
    let err = fx
        .relay
        .publish_location(fx.order_id, &runner, 40.41, -3.70)
        .await
        .expect_err("unassigned runner");
    assert_eq!(err.code, ErrorCode::OrderNotFound);

    fx.assignment
        .select_runner(fx.order_id, fx.runner_id, fx.client_id, &[Role::Client])
        .await
        .unwrap();

    // The client can watch but never publish
    let err = fx
        .relay
        .publish_location(fx.order_id, &client, 40.41, -3.70)
        .await
        .expect_err("client publish");
    assert_eq!(err.code, ErrorCode::OrderNotFound);

    // The assigned runner publishes; subscribers receive the payload verbatim
    let (mut rx, trail) = fx.relay.join(fx.order_id, &client).await.unwrap();
    assert!(trail.is_empty());

    let sent = fx
        .relay
        .publish_location(fx.order_id, &runner, 40.4100, -3.7000)
        .await
        .expect("assigned runner publish");

    let received = rx.recv().await.expect("broadcast");
    assert_eq!(received.order_id, fx.order_id);
    assert_eq!(received.runner_id, fx.runner_id);
    assert_eq!(received.point, sent);
    assert_eq!(received.point.lat, 40.4100);
    assert_eq!(received.point.lng, -3.7000);
}

#[tokio::test]
async fn publish_rejects_malformed_coordinates() {
    let env = test_env().await;
    let fx = fixture(&env).await;
    fx.assignment
        .select_runner(fx.order_id, fx.runner_id, fx.client_id, &[Role::Client])
        .await
        .unwrap();

    let runner = current_user(fx.runner_id, &[Role::Runner]);
    let err = fx
        .relay
        .publish_location(fx.order_id, &runner, 120.0, -3.70)
        .await
        .expect_err("latitude out of range");
    assert_eq!(err.code, ErrorCode::InvalidCoordinates);
}

#[tokio::test]
async fn late_joiners_receive_the_trail() {
    let env = test_env().await;
    let fx = fixture(&env).await;
    fx.assignment
        .select_runner(fx.order_id, fx.runner_id, fx.client_id, &[Role::Client])
        .await
        .unwrap();

    let runner = current_user(fx.runner_id, &[Role::Runner]);
    for i in 0..3 {
        fx.relay
            .publish_location(fx.order_id, &runner, 40.41 + f64::from(i) * 0.001, -3.70)
            .await
            .unwrap();
    }

    let client = current_user(fx.client_id, &[Role::Client]);
    let (_rx, trail) = fx.relay.join(fx.order_id, &client).await.unwrap();
    assert_eq!(trail.len(), 3);
    assert!((trail[2].lat - 40.412).abs() < 1e-9);
}
