use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use shared::models::{
    ConversationListResponse, ConversationSummary, CustomerMessageRequest, ErrorResponse,
    InboxStreamEvent, Message, MessageListResponse, OpenConversationRequest, ReplyRequest,
    ReplyResponse,
};
use tracing::instrument;

use crate::{app_state::AppState, http::error::AppResult};

pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/admin/support/conversations",
            get(list_conversations).post(open_conversation),
        )
        .route(
            "/api/admin/support/conversations/{conversation_id}/messages",
            get(conversation_messages),
        )
        .route(
            "/api/admin/support/conversations/{conversation_id}/reply",
            post(reply),
        )
        .route(
            "/api/admin/support/conversations/{conversation_id}/read",
            post(mark_read),
        )
}

pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/messages", post(customer_message))
}

/// Appends a message and nudges every open stream for the conversation.
fn deliver(state: &AppState, message: Message) -> Message {
    let conversation_id = message.conversation_id;
    state.hub.publish(
        conversation_id,
        &InboxStreamEvent::MessageNew {
            message: message.clone(),
        },
    );
    if let Ok(conversation) = state.store.conversation(conversation_id) {
        state.hub.publish(
            conversation_id,
            &InboxStreamEvent::ConversationUpdated { conversation },
        );
    }
    message
}

#[utoipa::path(
    get,
    path = "/api/admin/support/conversations",
    responses(
        (status = 200, description = "Conversations retrieved", body = ConversationListResponse)
    ),
    tag = "Support"
)]
#[instrument(skip(state))]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Json<ConversationListResponse> {
    metrics::counter!("support_conversation_lists_total").increment(1);
    Json(ConversationListResponse {
        conversations: state.store.conversations(),
    })
}

#[utoipa::path(
    post,
    path = "/api/admin/support/conversations",
    request_body = OpenConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationSummary),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "Support"
)]
#[instrument(skip(state, payload))]
pub async fn open_conversation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OpenConversationRequest>,
) -> AppResult<impl IntoResponse> {
    let summary = state.store.open_conversation(&payload, Utc::now())?;
    metrics::counter!("support_conversations_opened_total").increment(1);
    Ok((StatusCode::CREATED, Json(summary)))
}

#[utoipa::path(
    get,
    path = "/api/admin/support/conversations/{conversation_id}/messages",
    responses(
        (status = 200, description = "Messages retrieved", body = MessageListResponse),
        (status = 404, description = "Unknown conversation", body = ErrorResponse)
    ),
    tag = "Support"
)]
#[instrument(skip(state))]
pub async fn conversation_messages(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i64>,
) -> AppResult<Json<MessageListResponse>> {
    metrics::counter!("support_message_fetches_total").increment(1);
    let messages = state.store.messages(conversation_id)?;
    Ok(Json(MessageListResponse { messages }))
}

#[utoipa::path(
    post,
    path = "/api/admin/support/conversations/{conversation_id}/reply",
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply persisted", body = ReplyResponse),
        (status = 400, description = "Blank content", body = ErrorResponse),
        (status = 404, description = "Unknown conversation", body = ErrorResponse)
    ),
    tag = "Support"
)]
#[instrument(skip(state, payload))]
pub async fn reply(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i64>,
    Json(payload): Json<ReplyRequest>,
) -> AppResult<Json<ReplyResponse>> {
    let message = state.store.append_message(
        conversation_id,
        &payload.content,
        payload.kind,
        true,
        Utc::now(),
    )?;
    metrics::counter!("support_replies_total").increment(1);

    let message = deliver(&state, message);
    Ok(Json(ReplyResponse { message }))
}

#[utoipa::path(
    post,
    path = "/api/admin/support/conversations/{conversation_id}/read",
    responses(
        (status = 200, description = "Unread counter reset", body = ConversationSummary),
        (status = 404, description = "Unknown conversation", body = ErrorResponse)
    ),
    tag = "Support"
)]
#[instrument(skip(state))]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i64>,
) -> AppResult<Json<ConversationSummary>> {
    let summary = state.store.mark_read(conversation_id)?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = CustomerMessageRequest,
    responses(
        (status = 200, description = "Message persisted", body = ReplyResponse),
        (status = 400, description = "Blank content", body = ErrorResponse),
        (status = 404, description = "Unknown conversation", body = ErrorResponse)
    ),
    tag = "Messages"
)]
#[instrument(skip(state, payload))]
pub async fn customer_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CustomerMessageRequest>,
) -> AppResult<Json<ReplyResponse>> {
    let message = state.store.append_message(
        payload.conversation_id,
        &payload.content,
        payload.kind,
        false,
        Utc::now(),
    )?;
    metrics::counter!("customer_messages_total").increment(1);

    let message = deliver(&state, message);
    Ok(Json(ReplyResponse { message }))
}
