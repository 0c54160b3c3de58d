use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Timestamp;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Away,
    Offline,
}

/// Reports that a user is still active; an omitted status means `Online`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PresenceHeartbeatRequest {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PresenceStatus>,
}

/// Point-in-time presence for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct PresenceSnapshot {
    pub user_id: i64,
    pub status: PresenceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&PresenceStatus::Online).unwrap(),
            "\"online\""
        );
        assert_eq!(
            serde_json::to_string(&PresenceStatus::Offline).unwrap(),
            "\"offline\""
        );
    }

    #[test]
    fn test_snapshot_omits_unknown_last_seen() {
        let snapshot = PresenceSnapshot {
            user_id: 4,
            status: PresenceStatus::Offline,
            last_seen_at: None,
        };

        let serialized = serde_json::to_string(&snapshot).unwrap();
        assert!(!serialized.contains("last_seen_at"));
    }
}
