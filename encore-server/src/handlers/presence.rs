use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use shared::models::{PresenceHeartbeatRequest, PresenceSnapshot};
use tracing::instrument;

use crate::app_state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/presence/heartbeat", post(heartbeat))
        .route("/api/presence/{user_id}", get(presence))
}

#[utoipa::path(
    post,
    path = "/api/presence/heartbeat",
    request_body = PresenceHeartbeatRequest,
    responses((status = 204, description = "Heartbeat recorded")),
    tag = "Presence"
)]
#[instrument(skip(state))]
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PresenceHeartbeatRequest>,
) -> StatusCode {
    state
        .store
        .heartbeat(payload.user_id, payload.status, Utc::now());
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/api/presence/{user_id}",
    responses((status = 200, description = "Presence read", body = PresenceSnapshot)),
    tag = "Presence"
)]
#[instrument(skip(state))]
pub async fn presence(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Json<PresenceSnapshot> {
    Json(state.store.presence(user_id, Utc::now()))
}
