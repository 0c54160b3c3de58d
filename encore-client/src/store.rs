use chrono::{DateTime, Utc};
use shared::models::{Message, MessageKind, Timestamp};

/// Classification of one reconciliation pass, derived from the
/// `(length, last id)` fingerprint of the server's array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// First server array applied for this conversation.
    Initial,
    /// Fingerprint unchanged since the previous fetch.
    Unchanged,
    /// The count or the trailing identifier moved.
    NewMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: usize,
    last_id: Option<i64>,
}

impl Fingerprint {
    fn of(messages: &[Message]) -> Self {
        Self {
            len: messages.len(),
            last_id: messages.last().map(|message| message.id),
        }
    }
}

/// Ordered message list for the currently selected conversation.
///
/// The store never merges: each reconciliation replaces the whole list with
/// the server's copy, so the most recent fetch always wins. Optimistic
/// entries appended by [`MessageStore::append_local`] live only until the
/// next reconciliation supersedes them.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    fingerprint: Option<Fingerprint>,
}

impl MessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in creation order, including any optimistic entries.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Replaces local state with the server's array and classifies the
    /// update. The fingerprint tracks server state only, so an optimistic
    /// append does not mask the arrival of its own echo.
    pub fn reconcile(&mut self, server_messages: Vec<Message>) -> Reconciliation {
        let next = Fingerprint::of(&server_messages);
        let reason = match self.fingerprint {
            None => Reconciliation::Initial,
            Some(previous) if previous == next => Reconciliation::Unchanged,
            Some(_) => Reconciliation::NewMessages,
        };

        self.messages = server_messages;
        self.fingerprint = Some(next);
        reason
    }

    /// Appends an optimistic entry with a timestamp-derived temporary id.
    /// Returns `None` without side effects when the trimmed content is empty.
    pub fn append_local(
        &mut self,
        conversation_id: i64,
        content: &str,
        kind: MessageKind,
        from_support: bool,
        now: DateTime<Utc>,
    ) -> Option<Message> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }

        let message = Message {
            id: now.timestamp_millis(),
            conversation_id,
            content: trimmed.to_string(),
            kind,
            from_support,
            created_at: Timestamp(now),
        };
        self.messages.push(message.clone());
        Some(message)
    }

    /// Drops all state, including the fingerprint, so the next reconcile is
    /// classified as an initial load.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.fingerprint = None;
    }
}
