//! WebSocket handler for the live tracking channel
//!
//! One connection can join any number of order rooms (subject to per-order
//! authorization) and, when it belongs to the assigned runner, publish
//! positions. Publish authorization is re-checked on every frame against
//! the current order row, never against the join. Dropping the connection
//! has no effect on order state.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::relay::RelayService;
use shared::AppError;
use shared::relay::{TrackingEvent, TrackingRequest};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/tracking/ws", get(tracking_ws))
}

#[derive(Debug, Deserialize)]
pub struct TrackingQuery {
    /// Bearer token; browsers cannot set headers on WebSocket upgrades
    token: String,
}

/// GET /api/tracking/ws — upgrade to WebSocket
async fn tracking_ws(
    State(state): State<ServerState>,
    Query(query): Query<TrackingQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let claims = state
        .jwt_service()
        .validate_token(&query.token)
        .map_err(|e| AppError::invalid_token(e.to_string()))?;
    let user = CurrentUser::try_from(claims)
        .map_err(|e| AppError::invalid_token(format!("Malformed JWT claims: {}", e)))?;

    Ok(ws.on_upgrade(move |socket| handle_connection(socket, state, user)))
}

async fn handle_connection(socket: WebSocket, state: ServerState, user: CurrentUser) {
    tracing::info!(user_id = user.id, "Tracking connection established");

    let relay = state.relay_service();
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Events produced by room-forwarding tasks and request handling
    let (event_tx, mut event_rx) = mpsc::channel::<TrackingEvent>(64);

    // order_id → forwarding task for the joined room
    let mut joined: HashMap<i64, JoinHandle<()>> = HashMap::new();

    loop {
        tokio::select! {
            // Incoming frame from the client
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let request: TrackingRequest = match serde_json::from_str(text.as_str()) {
                            Ok(r) => r,
                            Err(e) => {
                                tracing::debug!(user_id = user.id, "Invalid tracking frame: {e}");
                                let _ = event_tx
                                    .send(TrackingEvent::Error {
                                        code: shared::ErrorCode::InvalidRequest.code(),
                                        message: "Invalid frame".to_string(),
                                    })
                                    .await;
                                continue;
                            }
                        };
                        handle_request(request, &relay, &user, &event_tx, &mut joined).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(user_id = user.id, "Tracking socket error: {e}");
                        break;
                    }
                    _ => {} // Binary, Pong — ignore
                }
            }

            // Outgoing event to this subscriber
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        if let Ok(json) = serde_json::to_string(&event) {
                            if ws_sink.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // Cleanup: stop forwarding, reap empty rooms. Order state is untouched.
    for (order_id, handle) in joined {
        handle.abort();
        relay.leave(order_id);
    }
    let _ = ws_sink.close().await;
    tracing::info!(user_id = user.id, "Tracking connection closed");
}

async fn handle_request(
    request: TrackingRequest,
    relay: &RelayService,
    user: &CurrentUser,
    event_tx: &mpsc::Sender<TrackingEvent>,
    joined: &mut HashMap<i64, JoinHandle<()>>,
) {
    match request {
        TrackingRequest::JoinOrder { order_id } => {
            if joined.contains_key(&order_id) {
                return;
            }
            match relay.join(order_id, user).await {
                Ok((rx, trail)) => {
                    let handle = spawn_room_forwarder(rx, event_tx.clone());
                    joined.insert(order_id, handle);
                    let _ = event_tx
                        .send(TrackingEvent::Joined { order_id, trail })
                        .await;
                }
                Err(e) => {
                    let _ = event_tx
                        .send(TrackingEvent::Error {
                            code: e.code.code(),
                            message: e.message,
                        })
                        .await;
                }
            }
        }

        TrackingRequest::UpdateLocation { order_id, lat, lng } => {
            if let Err(e) = relay.publish_location(order_id, user, lat, lng).await {
                let _ = event_tx
                    .send(TrackingEvent::Error {
                        code: e.code.code(),
                        message: e.message,
                    })
                    .await;
            }
        }

        TrackingRequest::LeaveOrder { order_id } => {
            if let Some(handle) = joined.remove(&order_id) {
                handle.abort();
                relay.leave(order_id);
                let _ = event_tx.send(TrackingEvent::Left { order_id }).await;
            }
        }
    }
}

/// Forward a room's broadcast stream into this connection's event queue
fn spawn_room_forwarder(
    mut rx: broadcast::Receiver<crate::relay::LocationBroadcast>,
    event_tx: mpsc::Sender<TrackingEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let event = TrackingEvent::Location {
                        order_id: update.order_id,
                        runner_id: update.runner_id,
                        point: update.point,
                    };
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                // A slow consumer only skips frames, it never kills the room
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Tracking subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
