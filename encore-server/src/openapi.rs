use shared::models::{
    ConversationListResponse, ConversationSummary, CustomerMessageRequest, ErrorResponse, Message,
    MessageKind, MessageListResponse, OpenConversationRequest, PresenceHeartbeatRequest,
    PresenceSnapshot, PresenceStatus, ReplyRequest, ReplyResponse, TypingRequest,
    TypingStatusResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Encore Support API",
        version = "1.0.0",
        description = "Support inbox, typing signals, presence, and streaming for the Encore marketplace"
    ),
    paths(
        crate::handlers::support::list_conversations,
        crate::handlers::support::open_conversation,
        crate::handlers::support::conversation_messages,
        crate::handlers::support::reply,
        crate::handlers::support::mark_read,
        crate::handlers::support::customer_message,
        crate::handlers::streaming::conversation_events,
        crate::handlers::typing::set_typing,
        crate::handlers::typing::typing_status,
        crate::handlers::presence::heartbeat,
        crate::handlers::presence::presence,
    ),
    components(
        schemas(
            ConversationListResponse,
            ConversationSummary,
            CustomerMessageRequest,
            ErrorResponse,
            Message,
            MessageKind,
            MessageListResponse,
            OpenConversationRequest,
            PresenceHeartbeatRequest,
            PresenceSnapshot,
            PresenceStatus,
            ReplyRequest,
            ReplyResponse,
            TypingRequest,
            TypingStatusResponse,
        )
    ),
    tags(
        (name = "Support", description = "Admin support inbox"),
        (name = "Messages", description = "Message and typing endpoints"),
        (name = "Presence", description = "Presence heartbeats and lookups")
    )
)]
pub struct ApiDoc;
