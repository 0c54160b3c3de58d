use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Timestamp;

/// Discriminates plain-text messages from GIF attachments (stored as a URL).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Free-text content.
    #[default]
    Text,
    /// The content field holds a GIF URL.
    Gif,
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MessageKind::Text => write!(f, "text"),
            MessageKind::Gif => write!(f, "gif"),
        }
    }
}

/// A single message in a support conversation.
///
/// Identifiers are integers: clients synthesize a temporary, timestamp-derived
/// id for optimistically appended entries; the server assigns the durable id
/// once the message is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Message {
    /// Unique identifier for the message.
    pub id: i64,

    /// Identifier of the conversation this message belongs to.
    pub conversation_id: i64,

    /// The message content: free text or a GIF URL depending on `kind`.
    pub content: String,

    /// The kind of content carried.
    pub kind: MessageKind,

    /// Which side of the conversation sent the message.
    pub from_support: bool,

    /// Timestamp when the message was created.
    pub created_at: Timestamp,
}

/// Request body for a support-side reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ReplyRequest {
    /// The reply content.
    pub content: String,

    /// The kind of content; defaults to text.
    #[serde(default)]
    pub kind: MessageKind,
}

/// Response body returned after a reply is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ReplyResponse {
    /// The persisted message with its server-assigned identifier.
    pub message: Message,
}

/// Request body for a customer-side message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct CustomerMessageRequest {
    /// Identifier of the conversation to append to.
    pub conversation_id: i64,

    /// The message content.
    pub content: String,

    /// The kind of content; defaults to text.
    #[serde(default)]
    pub kind: MessageKind,
}

/// Response body for the message-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct MessageListResponse {
    /// Messages in creation order.
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_message_serialization_round_trip() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 8, 14, 30, 0).unwrap();
        let message = Message {
            id: 42,
            conversation_id: 7,
            content: "Is the venue still available?".to_string(),
            kind: MessageKind::Text,
            from_support: false,
            created_at: Timestamp(dt),
        };

        let serialized = serde_json::to_string(&message).unwrap();
        let deserialized: Message = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, message);
        assert_eq!(deserialized.id, 42);
        assert_eq!(deserialized.conversation_id, 7);
        assert!(!deserialized.from_support);
    }

    #[test]
    fn test_reply_request_kind_defaults_to_text() {
        let request: ReplyRequest = serde_json::from_str(r#"{"content":"hello"}"#).unwrap();

        assert_eq!(request.kind, MessageKind::Text);
        assert_eq!(request.content, "hello");
    }

    #[test]
    fn test_gif_kind_wire_format() {
        let request = ReplyRequest {
            content: "https://media.example.com/confetti.gif".to_string(),
            kind: MessageKind::Gif,
        };

        let serialized = serde_json::to_string(&request).unwrap();
        assert!(serialized.contains("\"kind\":\"gif\""));
    }

    #[test]
    fn test_message_kind_display() {
        assert_eq!(MessageKind::Text.to_string(), "text");
        assert_eq!(MessageKind::Gif.to_string(), "gif");
    }
}
