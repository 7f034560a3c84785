//! Order lifecycle integration tests
//!
//! Exercises the creation transaction, the money snapshots and the
//! conditional-update state machine against a real (throwaway) database,
//! including the races the conditional updates exist to win.

mod common;

use common::*;
use market_server::db::models::OrderStatus;
use market_server::db::repository::{OrderRepository, ProductRepository, RunnerRepository};
use market_server::delivery::AssignmentService;
use market_server::orders::{CreateOrderRequest, Destination, OrderItemRequest, OrderService};
use shared::ErrorCode;
use shared::models::Role;

const PIN: &str = "1234";

fn order_request(items: Vec<(i64, i64)>, pin: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        items: items
            .into_iter()
            .map(|(product_id, quantity)| OrderItemRequest {
                product_id,
                quantity,
            })
            .collect(),
        delivery_address: Some("Calle Mayor 1".to_string()),
        destination: None,
        pin: pin.to_string(),
    }
}

#[tokio::test]
async fn create_order_snapshots_totals_and_decrements_stock() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let bread = seed_product(&env, provider.id, city, "bread", 2.50, 10).await;
    let milk = seed_product(&env, provider.id, city, "milk", 1.20, 4).await;

    let service = OrderService::new(env.pool());
    let order = service
        .create_order(client.id, order_request(vec![(bread.id, 3), (milk.id, 1)], PIN))
        .await
        .expect("create order");

    // qty 3 @ 2.50 + qty 1 @ 1.20 = 8.70
    assert_eq!(order.order.total_price, 8.70);
    assert_eq!(order.order.status, OrderStatus::Pending);
    assert_eq!(order.order.city_id, city);
    assert!(order.order.runner_id.is_none());
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items[0].price_at_purchase, 2.50);
    assert_eq!(order.items[1].price_at_purchase, 1.20);

    let products = ProductRepository::new(env.pool());
    assert_eq!(products.stock_of(bread.id).await.unwrap(), 7);
    assert_eq!(products.stock_of(milk.id).await.unwrap(), 3);
}

#[tokio::test]
async fn total_price_survives_later_price_changes() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let product = seed_product(&env, provider.id, city, "olive oil", 9.99, 5).await;

    let service = OrderService::new(env.pool());
    let order = service
        .create_order(client.id, order_request(vec![(product.id, 2)], PIN))
        .await
        .expect("create order");
    assert_eq!(order.order.total_price, 19.98);

    // Provider doubles the price afterwards
    sqlx::query("UPDATE products SET price = 19.99 WHERE id = ?")
        .bind(product.id)
        .execute(env.db.pool())
        .await
        .unwrap();

    let reloaded = OrderRepository::new(env.pool())
        .find_with_items(order.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.order.total_price, 19.98);
    assert_eq!(reloaded.items[0].price_at_purchase, 9.99);
}

#[tokio::test]
async fn create_order_rejects_multi_city_cart() {
    let env = test_env().await;
    let madrid = seed_city(&env, "madrid").await;
    let valencia = seed_city(&env, "valencia").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let a = seed_product(&env, provider.id, madrid, "a", 1.0, 5).await;
    let b = seed_product(&env, provider.id, valencia, "b", 1.0, 5).await;

    let service = OrderService::new(env.pool());
    let err = service
        .create_order(client.id, order_request(vec![(a.id, 1), (b.id, 1)], PIN))
        .await
        .expect_err("multi-city cart must fail");
    assert_eq!(err.code, ErrorCode::MultiCityCart);

    // Nothing moved
    let products = ProductRepository::new(env.pool());
    assert_eq!(products.stock_of(a.id).await.unwrap(), 5);
    assert_eq!(products.stock_of(b.id).await.unwrap(), 5);
}

#[tokio::test]
async fn create_order_enforces_pin_gate() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let product = seed_product(&env, provider.id, city, "a", 1.0, 5).await;

    let service = OrderService::new(env.pool());

    // No PIN configured
    let no_pin = seed_user(&env, "nopin", &[Role::Client], None).await;
    let err = service
        .create_order(no_pin.id, order_request(vec![(product.id, 1)], PIN))
        .await
        .expect_err("missing PIN must fail");
    assert_eq!(err.code, ErrorCode::PinNotSet);

    // Wrong PIN
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let err = service
        .create_order(client.id, order_request(vec![(product.id, 1)], "9999"))
        .await
        .expect_err("wrong PIN must fail");
    assert_eq!(err.code, ErrorCode::PinInvalid);
}

#[tokio::test]
async fn create_order_rejects_insufficient_stock_before_any_mutation() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let scarce = seed_product(&env, provider.id, city, "saffron", 5.0, 2).await;
    let plenty = seed_product(&env, provider.id, city, "rice", 1.0, 100).await;

    let service = OrderService::new(env.pool());
    let err = service
        .create_order(
            client.id,
            order_request(vec![(plenty.id, 10), (scarce.id, 3)], PIN),
        )
        .await
        .expect_err("overdraw must fail");
    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert!(err.message.contains("saffron"));

    // The satisfiable line was not decremented either
    let products = ProductRepository::new(env.pool());
    assert_eq!(products.stock_of(plenty.id).await.unwrap(), 100);
    assert_eq!(products.stock_of(scarce.id).await.unwrap(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_never_oversell() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client_a = seed_user(&env, "a", &[Role::Client], Some(PIN)).await;
    let client_b = seed_user(&env, "b", &[Role::Client], Some(PIN)).await;
    // Stock 5: two orders of 3 can never both succeed
    let product = seed_product(&env, provider.id, city, "jam", 3.0, 5).await;

    let service_a = OrderService::new(env.pool());
    let service_b = OrderService::new(env.pool());

    let (res_a, res_b) = tokio::join!(
        service_a.create_order(client_a.id, order_request(vec![(product.id, 3)], PIN)),
        service_b.create_order(client_b.id, order_request(vec![(product.id, 3)], PIN)),
    );

    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the racing orders may win");

    let loser = if res_a.is_ok() { res_b } else { res_a };
    assert_eq!(
        loser.expect_err("loser must fail").code,
        ErrorCode::InsufficientStock
    );

    let stock = ProductRepository::new(env.pool())
        .stock_of(product.id)
        .await
        .unwrap();
    assert_eq!(stock, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_confirm_exactly_once() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let product = seed_product(&env, provider.id, city, "a", 1.0, 10).await;
    let runner_a = seed_runner(&env, "runner-a", 40.41, -3.70).await;
    let runner_b = seed_runner(&env, "runner-b", 40.42, -3.71).await;

    let order = OrderService::new(env.pool())
        .create_order(client.id, order_request(vec![(product.id, 1)], PIN))
        .await
        .expect("create order");

    let assign_a = AssignmentService::new(env.pool());
    let assign_b = AssignmentService::new(env.pool());

    let (res_a, res_b) = tokio::join!(
        assign_a.accept_order(order.order.id, runner_a.id),
        assign_b.accept_order(order.order.id, runner_b.id),
    );

    let winners = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one runner may claim the order");

    let (winner_id, loser) = if res_a.is_ok() {
        (runner_a.id, res_b)
    } else {
        (runner_b.id, res_a)
    };
    assert_eq!(
        loser.expect_err("loser must see a conflict").code,
        ErrorCode::OrderNotAvailable
    );

    let confirmed = OrderRepository::new(env.pool())
        .find_by_id(order.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.runner_id, Some(winner_id));
    // Fee snapshot taken at assignment time
    assert_eq!(confirmed.runner_base_fee, Some(1.5));
    assert_eq!(confirmed.runner_per_km_fee, Some(0.4));
}

#[tokio::test]
async fn select_then_accept_loses_the_race() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let product = seed_product(&env, provider.id, city, "a", 1.0, 10).await;
    let chosen = seed_runner(&env, "chosen", 40.41, -3.70).await;
    let late = seed_runner(&env, "late", 40.42, -3.71).await;

    let order = OrderService::new(env.pool())
        .create_order(client.id, order_request(vec![(product.id, 1)], PIN))
        .await
        .unwrap();

    let service = AssignmentService::new(env.pool());
    let confirmed = service
        .select_runner(order.order.id, chosen.id, client.id, &[Role::Client])
        .await
        .expect("manual select");
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.runner_id, Some(chosen.id));

    let err = service
        .accept_order(order.order.id, late.id)
        .await
        .expect_err("accept after select must conflict");
    assert_eq!(err.code, ErrorCode::OrderNotAvailable);
}

#[tokio::test]
async fn select_runner_authorization_and_validation() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let other = seed_user(&env, "other", &[Role::Client], Some(PIN)).await;
    let admin = seed_user(&env, "admin", &[Role::Admin], None).await;
    let product = seed_product(&env, provider.id, city, "a", 1.0, 10).await;
    let runner = seed_runner(&env, "runner", 40.41, -3.70).await;

    let order = OrderService::new(env.pool())
        .create_order(client.id, order_request(vec![(product.id, 1)], PIN))
        .await
        .unwrap();
    let service = AssignmentService::new(env.pool());

    // A stranger cannot assign someone else's order
    let err = service
        .select_runner(order.order.id, runner.id, other.id, &[Role::Client])
        .await
        .expect_err("foreign order");
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    // Unknown runner
    let err = service
        .select_runner(order.order.id, 99_999, client.id, &[Role::Client])
        .await
        .expect_err("unknown runner");
    assert_eq!(err.code, ErrorCode::RunnerNotFound);

    // Inactive runner
    let sleeping = seed_runner(&env, "sleeping", 40.40, -3.70).await;
    RunnerRepository::new(env.pool())
        .update(
            sleeping.id,
            market_server::db::models::RunnerProfileUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = service
        .select_runner(order.order.id, sleeping.id, client.id, &[Role::Client])
        .await
        .expect_err("inactive runner");
    assert_eq!(err.code, ErrorCode::RunnerInactive);

    // Admin may assign on the client's behalf
    let confirmed = service
        .select_runner(order.order.id, runner.id, admin.id, &[Role::Admin])
        .await
        .expect("admin select");
    assert_eq!(confirmed.runner_id, Some(runner.id));

    // Second assignment is no longer possible
    let err = service
        .select_runner(order.order.id, runner.id, client.id, &[Role::Client])
        .await
        .expect_err("already confirmed");
    assert_eq!(err.code, ErrorCode::OrderNotPending);
}

#[tokio::test]
async fn accept_rejects_self_assignment() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    // The client is also a runner, but still may not deliver their own order
    let client_runner = seed_runner(&env, "client-runner", 40.41, -3.70).await;
    let repo = market_server::db::repository::UserRepository::new(env.pool());
    let hash = market_server::auth::pin::hash_pin(PIN).unwrap();
    repo.set_pin(client_runner.id, &hash).await.unwrap();
    let product = seed_product(&env, provider.id, city, "a", 1.0, 10).await;

    let order = OrderService::new(env.pool())
        .create_order(client_runner.id, order_request(vec![(product.id, 1)], PIN))
        .await
        .unwrap();

    let err = AssignmentService::new(env.pool())
        .accept_order(order.order.id, client_runner.id)
        .await
        .expect_err("self-assignment must fail");
    assert_eq!(err.code, ErrorCode::SelfAssignment);
}

#[tokio::test]
async fn completion_guard_is_strict_and_idempotently_failing() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let product = seed_product(&env, provider.id, city, "a", 1.0, 10).await;
    let runner = seed_runner(&env, "runner", 40.41, -3.70).await;
    let impostor = seed_runner(&env, "impostor", 40.42, -3.71).await;

    let order = OrderService::new(env.pool())
        .create_order(client.id, order_request(vec![(product.id, 1)], PIN))
        .await
        .unwrap();
    let service = AssignmentService::new(env.pool());

    // Cannot complete a PENDING order
    let err = service
        .complete_order(order.order.id, runner.id)
        .await
        .expect_err("pending order");
    assert_eq!(err.code, ErrorCode::OrderCompleteRejected);

    service
        .select_runner(order.order.id, runner.id, client.id, &[Role::Client])
        .await
        .unwrap();

    // Only the assigned runner may complete; repeating keeps failing
    for _ in 0..2 {
        let err = service
            .complete_order(order.order.id, impostor.id)
            .await
            .expect_err("impostor");
        assert_eq!(err.code, ErrorCode::OrderCompleteRejected);
    }

    let done = service
        .complete_order(order.order.id, runner.id)
        .await
        .expect("assigned runner completes");
    assert_eq!(done.status, OrderStatus::Completed);

    // COMPLETED is terminal
    let err = service
        .complete_order(order.order.id, runner.id)
        .await
        .expect_err("already completed");
    assert_eq!(err.code, ErrorCode::OrderCompleteRejected);
}

#[tokio::test]
async fn cancel_returns_stock_and_only_from_pending() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let product = seed_product(&env, provider.id, city, "a", 1.0, 5).await;
    let runner = seed_runner(&env, "runner", 40.41, -3.70).await;

    let service = AssignmentService::new(env.pool());
    let orders = OrderService::new(env.pool());
    let products = ProductRepository::new(env.pool());

    let order = orders
        .create_order(client.id, order_request(vec![(product.id, 2)], PIN))
        .await
        .unwrap();
    assert_eq!(products.stock_of(product.id).await.unwrap(), 3);

    let cancelled = service
        .cancel_order(order.order.id, client.id, &[Role::Client])
        .await
        .expect("cancel pending order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(products.stock_of(product.id).await.unwrap(), 5);

    // A confirmed order can no longer be cancelled
    let second = orders
        .create_order(client.id, order_request(vec![(product.id, 1)], PIN))
        .await
        .unwrap();
    service
        .select_runner(second.order.id, runner.id, client.id, &[Role::Client])
        .await
        .unwrap();
    let err = service
        .cancel_order(second.order.id, client.id, &[Role::Client])
        .await
        .expect_err("confirmed order");
    assert_eq!(err.code, ErrorCode::OrderNotAvailable);
}

#[tokio::test]
async fn assignment_snapshots_delivery_distance_when_destination_known() {
    let env = test_env().await;
    let city = seed_city(&env, "madrid").await;
    let provider = seed_user(&env, "provider", &[Role::Provider], None).await;
    let client = seed_user(&env, "client", &[Role::Client], Some(PIN)).await;
    let product = seed_product(&env, provider.id, city, "a", 1.0, 10).await;
    let runner = seed_runner(&env, "runner", 40.4168, -3.7038).await;

    let mut request = order_request(vec![(product.id, 1)], PIN);
    request.destination = Some(Destination {
        lat: 40.4065,
        lng: -3.6896,
    });

    let order = OrderService::new(env.pool())
        .create_order(client.id, request)
        .await
        .unwrap();

    let confirmed = AssignmentService::new(env.pool())
        .select_runner(order.order.id, runner.id, client.id, &[Role::Client])
        .await
        .unwrap();

    // Sol → Retiro is about 1.66 km
    assert_eq!(confirmed.delivery_distance_km, Some(1.66));
    assert_eq!(confirmed.runner_base_fee, Some(1.5));
    assert_eq!(confirmed.runner_per_km_fee, Some(0.4));
}
