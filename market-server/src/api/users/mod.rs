//! Users API module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", user_routes())
}

fn user_routes() -> Router<ServerState> {
    Router::new()
        .route("/pin", post(handler::set_pin))
        .route("/roles/runner", post(handler::become_runner))
        .route("/roles/provider", post(handler::become_provider))
}
