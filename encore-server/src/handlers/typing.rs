use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use shared::models::{ErrorResponse, InboxStreamEvent, TypingRequest, TypingStatusResponse};
use tracing::instrument;

use crate::{app_state::AppState, http::error::AppResult};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/messages/typing", post(set_typing))
        .route("/api/messages/typing/{conversation_id}", get(typing_status))
}

#[derive(Debug, Deserialize)]
pub struct TypingQuery {
    user_id: i64,
}

#[utoipa::path(
    post,
    path = "/api/messages/typing",
    request_body = TypingRequest,
    responses(
        (status = 204, description = "Typing flag updated"),
        (status = 404, description = "Unknown conversation", body = ErrorResponse)
    ),
    tag = "Messages"
)]
#[instrument(skip(state))]
pub async fn set_typing(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TypingRequest>,
) -> AppResult<StatusCode> {
    state.store.set_typing(
        payload.conversation_id,
        payload.user_id,
        payload.is_typing,
        Utc::now(),
    )?;

    state.hub.publish(
        payload.conversation_id,
        &InboxStreamEvent::Typing {
            user_id: payload.user_id,
            is_typing: payload.is_typing,
        },
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Polling fallback for observers without a push stream; staleness up to one
/// poll interval is accepted.
#[utoipa::path(
    get,
    path = "/api/messages/typing/{conversation_id}",
    responses(
        (status = 200, description = "Typing flag read", body = TypingStatusResponse)
    ),
    tag = "Messages"
)]
#[instrument(skip(state))]
pub async fn typing_status(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i64>,
    Query(query): Query<TypingQuery>,
) -> Json<TypingStatusResponse> {
    Json(TypingStatusResponse {
        is_typing: state.store.typing(conversation_id, query.user_id, Utc::now()),
    })
}
