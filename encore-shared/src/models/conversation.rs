use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Timestamp;

/// Inbox-level view of a support conversation.
///
/// Created server-side when a customer initiates support contact; mutated by
/// new messages; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConversationSummary {
    /// Unique identifier for the conversation.
    pub id: i64,

    /// Identifier of the customer participant. The support side always uses
    /// the synthetic user id `0`.
    pub customer_user_id: i64,

    /// Display name of the customer.
    pub customer_name: String,

    /// Contact email of the customer.
    pub customer_email: String,

    /// Preview of the most recent message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,

    /// Number of customer messages not yet read by support.
    pub unread: i64,

    /// Timestamp of the most recent activity.
    pub last_activity_at: Timestamp,
}

/// Request body for opening a conversation on behalf of a customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct OpenConversationRequest {
    /// Display name of the customer.
    pub customer_name: String,

    /// Contact email of the customer.
    pub customer_email: String,

    /// Optional first message to seed the thread with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

/// Response body for the conversation-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ConversationListResponse {
    /// Conversations ordered by most recent activity first.
    pub conversations: Vec<ConversationSummary>,
}
