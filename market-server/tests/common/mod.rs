//! Shared test fixtures: a throwaway database plus seed helpers

use market_server::auth::pin::hash_pin;
use market_server::db::DbService;
use market_server::db::models::{CityCreate, Product, ProductCreate, RunnerProfileUpdate, User, UserCreate};
use market_server::db::repository::{
    CityRepository, ProductRepository, RunnerRepository, UserRepository,
};
use shared::models::Role;
use tempfile::TempDir;

pub struct TestEnv {
    pub db: DbService,
    // Keeps the database directory alive for the test's duration
    _tmp: TempDir,
}

impl TestEnv {
    pub fn pool(&self) -> sqlx::SqlitePool {
        self.db.pool.clone()
    }
}

pub async fn test_env() -> TestEnv {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("test.db");
    let db = DbService::new(path.to_str().expect("utf8 path"))
        .await
        .expect("open test database");
    TestEnv { db, _tmp: tmp }
}

pub async fn seed_city(env: &TestEnv, slug: &str) -> i64 {
    CityRepository::new(env.pool())
        .create(CityCreate {
            name: slug.to_string(),
            slug: slug.to_string(),
        })
        .await
        .expect("seed city")
        .id
}

/// Create a user; when `pin` is set it is hashed and stored
pub async fn seed_user(env: &TestEnv, name: &str, roles: &[Role], pin: Option<&str>) -> User {
    let repo = UserRepository::new(env.pool());
    let user = repo
        .create(UserCreate {
            email: format!("{name}@example.test"),
            name: name.to_string(),
            roles: roles.to_vec(),
        })
        .await
        .expect("seed user");

    if let Some(pin) = pin {
        let hash = hash_pin(pin).expect("hash pin");
        repo.set_pin(user.id, &hash).await.expect("store pin");
    }

    user
}

pub async fn seed_product(
    env: &TestEnv,
    provider_id: i64,
    city_id: i64,
    name: &str,
    price: f64,
    stock: i64,
) -> Product {
    ProductRepository::new(env.pool())
        .create(ProductCreate {
            provider_id,
            city_id,
            name: name.to_string(),
            price,
            stock,
        })
        .await
        .expect("seed product")
}

/// Create a runner user with an active profile based at `(lat, lng)`
pub async fn seed_runner(env: &TestEnv, name: &str, lat: f64, lng: f64) -> User {
    let user = seed_user(env, name, &[Role::Client, Role::Runner], None).await;
    let runners = RunnerRepository::new(env.pool());
    runners.create_default(user.id).await.expect("create profile");
    runners
        .update(
            user.id,
            RunnerProfileUpdate {
                base_lat: Some(lat),
                base_lng: Some(lng),
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("activate runner");
    user
}
