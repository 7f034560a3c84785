//! Runners API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/runners", runner_routes())
}

fn runner_routes() -> Router<ServerState> {
    Router::new().route("/me", get(handler::me).put(handler::update_me))
}
