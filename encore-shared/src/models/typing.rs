use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Synthetic user identifier used by the support side of every conversation.
pub const SUPPORT_USER_ID: i64 = 0;

/// Sets or clears the typing flag for one user in one conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TypingRequest {
    pub conversation_id: i64,
    pub user_id: i64,
    pub is_typing: bool,
}

/// Current typing flag for the queried user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TypingStatusResponse {
    pub is_typing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_request_round_trip() {
        let request = TypingRequest {
            conversation_id: 9,
            user_id: SUPPORT_USER_ID,
            is_typing: true,
        };

        let serialized = serde_json::to_string(&request).unwrap();
        let deserialized: TypingRequest = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, request);
        assert_eq!(deserialized.user_id, 0);
    }
}
