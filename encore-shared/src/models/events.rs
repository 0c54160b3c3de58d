use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ConversationSummary, Message};

/// Events carried on a conversation's SSE stream.
///
/// Consumers that cannot hold a stream open fall back to fixed-interval
/// polling; the events therefore only signal *that* something changed — the
/// message list itself is always re-fetched wholesale so both delivery modes
/// share one reconciliation contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboxStreamEvent {
    /// A message was appended to the conversation.
    MessageNew { message: Message },

    /// A participant started or stopped typing.
    Typing { user_id: i64, is_typing: bool },

    /// The conversation's inbox summary changed (preview, unread count).
    ConversationUpdated { conversation: ConversationSummary },
}

impl InboxStreamEvent {
    /// SSE event name for this payload.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            InboxStreamEvent::MessageNew { .. } => "message.new",
            InboxStreamEvent::Typing { .. } => "typing",
            InboxStreamEvent::ConversationUpdated { .. } => "conversation.updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageKind, Timestamp};
    use chrono::{TimeZone, Utc};

    fn sample_message() -> Message {
        Message {
            id: 11,
            conversation_id: 2,
            content: "On my way".to_string(),
            kind: MessageKind::Text,
            from_support: true,
            created_at: Timestamp(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_tagged_round_trip() {
        let event = InboxStreamEvent::MessageNew {
            message: sample_message(),
        };

        let serialized = serde_json::to_string(&event).unwrap();
        assert!(serialized.contains("\"type\":\"message_new\""));

        let deserialized: InboxStreamEvent = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            InboxStreamEvent::MessageNew {
                message: sample_message()
            }
            .event_name(),
            "message.new"
        );
        assert_eq!(
            InboxStreamEvent::Typing {
                user_id: 0,
                is_typing: true
            }
            .event_name(),
            "typing"
        );
    }
}
