use crate::{handlers::streaming::InboxStreamHub, services::support_store::SupportStore};

/// Application state shared across all routes.
pub struct AppState {
    /// Conversation, typing, and presence storage. Stands behind the same
    /// opaque boundary the production stored-procedure database does.
    pub store: SupportStore,

    /// Per-conversation fan-out of inbox stream events.
    pub hub: InboxStreamHub,
}

impl AppState {
    #[must_use]
    pub fn new(sync: &shared::config::SyncConfig) -> Self {
        Self {
            store: SupportStore::new(sync.typing_ttl(), sync.presence_ttl()),
            hub: InboxStreamHub::default(),
        }
    }
}
