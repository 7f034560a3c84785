//! Delivery API module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", delivery_routes())
}

fn delivery_routes() -> Router<ServerState> {
    Router::new()
        .route("/preview-delivery", post(handler::preview_delivery))
        .route("/{id}/select-runner", post(handler::select_runner))
}
