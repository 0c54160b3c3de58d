//! In-memory storage for conversations, messages, typing flags, and
//! presence.
//!
//! The production deployment keeps this data behind a stored-procedure
//! database; everything above this module treats the store as that same
//! opaque boundary, so swapping the implementation does not touch handlers.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Duration, Utc};
use shared::models::{
    ConversationSummary, Message, MessageKind, OpenConversationRequest, PresenceSnapshot,
    PresenceStatus, Timestamp,
};
use thiserror::Error;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
}

#[derive(Debug)]
struct ConversationRecord {
    id: i64,
    customer_user_id: i64,
    customer_name: String,
    customer_email: String,
    unread: i64,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl ConversationRecord {
    fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            customer_user_id: self.customer_user_id,
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            last_message: self.messages.last().map(|message| message.content.clone()),
            unread: self.unread,
            last_activity_at: Timestamp(
                self.messages
                    .last()
                    .map_or(self.created_at, |message| message.created_at.0),
            ),
        }
    }
}

#[derive(Debug)]
struct PresenceRecord {
    last_seen: DateTime<Utc>,
    status: PresenceStatus,
}

#[derive(Debug, Default)]
struct Inner {
    conversations: BTreeMap<i64, ConversationRecord>,
    next_conversation_id: i64,
    next_message_id: i64,
    next_customer_user_id: i64,
    typing: HashMap<(i64, i64), DateTime<Utc>>,
    presence: HashMap<i64, PresenceRecord>,
}

/// Conversation, typing, and presence storage behind a single lock.
///
/// Message and conversation identifiers are monotonically assigned integers;
/// the message list per conversation is append-only and stays in creation
/// order, which is what lets clients detect new arrivals from the
/// `(length, last id)` pair alone.
#[derive(Debug)]
pub struct SupportStore {
    typing_ttl: Duration,
    presence_ttl: Duration,
    inner: Mutex<Inner>,
}

impl SupportStore {
    #[must_use]
    pub fn new(typing_ttl: std::time::Duration, presence_ttl: std::time::Duration) -> Self {
        Self {
            typing_ttl: Duration::from_std(typing_ttl).unwrap_or(Duration::MAX),
            presence_ttl: Duration::from_std(presence_ttl).unwrap_or(Duration::MAX),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a conversation for a customer initiating support contact,
    /// optionally seeding it with a first message.
    pub fn open_conversation(
        &self,
        request: &OpenConversationRequest,
        now: DateTime<Utc>,
    ) -> Result<ConversationSummary, StoreError> {
        if request.customer_name.trim().is_empty() {
            return Err(StoreError::Validation("customer_name is required".into()));
        }
        if request.customer_email.trim().is_empty() {
            return Err(StoreError::Validation("customer_email is required".into()));
        }

        let mut inner = self.lock();
        inner.next_conversation_id += 1;
        inner.next_customer_user_id += 1;
        let id = inner.next_conversation_id;
        let customer_user_id = inner.next_customer_user_id;

        let mut record = ConversationRecord {
            id,
            customer_user_id,
            customer_name: request.customer_name.trim().to_string(),
            customer_email: request.customer_email.trim().to_string(),
            unread: 0,
            created_at: now,
            messages: Vec::new(),
        };

        if let Some(content) = request
            .initial_message
            .as_deref()
            .map(str::trim)
            .filter(|content| !content.is_empty())
        {
            inner.next_message_id += 1;
            record.messages.push(Message {
                id: inner.next_message_id,
                conversation_id: id,
                content: content.to_string(),
                kind: MessageKind::Text,
                from_support: false,
                created_at: Timestamp(now),
            });
            record.unread = 1;
        }

        let summary = record.summary();
        inner.conversations.insert(id, record);
        Ok(summary)
    }

    /// All conversations, most recent activity first.
    #[must_use]
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        let inner = self.lock();
        let mut summaries: Vec<ConversationSummary> = inner
            .conversations
            .values()
            .map(ConversationRecord::summary)
            .collect();
        summaries.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        summaries
    }

    pub fn conversation(&self, conversation_id: i64) -> Result<ConversationSummary, StoreError> {
        let inner = self.lock();
        inner
            .conversations
            .get(&conversation_id)
            .map(ConversationRecord::summary)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {conversation_id}")))
    }

    /// Messages in creation order.
    pub fn messages(&self, conversation_id: i64) -> Result<Vec<Message>, StoreError> {
        let inner = self.lock();
        inner
            .conversations
            .get(&conversation_id)
            .map(|record| record.messages.clone())
            .ok_or_else(|| StoreError::NotFound(format!("conversation {conversation_id}")))
    }

    /// Appends a message and returns it with its assigned identifier.
    /// Customer messages bump the unread counter; support replies do not.
    pub fn append_message(
        &self,
        conversation_id: i64,
        content: &str,
        kind: MessageKind,
        from_support: bool,
        now: DateTime<Utc>,
    ) -> Result<Message, StoreError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation("content must not be blank".into()));
        }

        let mut inner = self.lock();
        inner.next_message_id += 1;
        let id = inner.next_message_id;
        let record = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {conversation_id}")))?;

        let message = Message {
            id,
            conversation_id,
            content: trimmed.to_string(),
            kind,
            from_support,
            created_at: Timestamp(now),
        };
        record.messages.push(message.clone());
        if !from_support {
            record.unread += 1;
        }
        Ok(message)
    }

    /// Resets the unread counter after support has viewed the thread.
    pub fn mark_read(&self, conversation_id: i64) -> Result<ConversationSummary, StoreError> {
        let mut inner = self.lock();
        let record = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {conversation_id}")))?;
        record.unread = 0;
        Ok(record.summary())
    }

    /// Sets or clears the typing flag for one user in one conversation. A set
    /// flag expires on its own so a crashed client cannot pin it on.
    pub fn set_typing(
        &self,
        conversation_id: i64,
        user_id: i64,
        is_typing: bool,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if !inner.conversations.contains_key(&conversation_id) {
            return Err(StoreError::NotFound(format!(
                "conversation {conversation_id}"
            )));
        }
        if is_typing {
            let expires = now + self.typing_ttl;
            inner.typing.insert((conversation_id, user_id), expires);
        } else {
            inner.typing.remove(&(conversation_id, user_id));
        }
        Ok(())
    }

    /// Current typing flag; unknown keys and expired entries read as false.
    #[must_use]
    pub fn typing(&self, conversation_id: i64, user_id: i64, now: DateTime<Utc>) -> bool {
        let inner = self.lock();
        inner
            .typing
            .get(&(conversation_id, user_id))
            .is_some_and(|expires| *expires > now)
    }

    /// Records a heartbeat for `user_id`; an omitted status means online.
    pub fn heartbeat(&self, user_id: i64, status: Option<PresenceStatus>, now: DateTime<Utc>) {
        let mut inner = self.lock();
        inner.presence.insert(
            user_id,
            PresenceRecord {
                last_seen: now,
                status: status.unwrap_or(PresenceStatus::Online),
            },
        );
    }

    /// Presence snapshot with age decay: a stale heartbeat degrades the
    /// reported status to away, then offline.
    #[must_use]
    pub fn presence(&self, user_id: i64, now: DateTime<Utc>) -> PresenceSnapshot {
        let inner = self.lock();
        match inner.presence.get(&user_id) {
            None => PresenceSnapshot {
                user_id,
                status: PresenceStatus::Offline,
                last_seen_at: None,
            },
            Some(record) => {
                let age = now.signed_duration_since(record.last_seen);
                let status = if age <= self.presence_ttl {
                    record.status
                } else if age <= self.presence_ttl * 3 {
                    PresenceStatus::Away
                } else {
                    PresenceStatus::Offline
                };
                PresenceSnapshot {
                    user_id,
                    status,
                    last_seen_at: Some(Timestamp(record.last_seen)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> SupportStore {
        SupportStore::new(
            std::time::Duration::from_secs(10),
            std::time::Duration::from_secs(30),
        )
    }

    fn at(seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, seconds).unwrap()
    }

    fn open(store: &SupportStore, name: &str) -> ConversationSummary {
        store
            .open_conversation(
                &OpenConversationRequest {
                    customer_name: name.to_string(),
                    customer_email: format!("{name}@example.com"),
                    initial_message: Some("Hi, I need a quote".to_string()),
                },
                at(0),
            )
            .unwrap()
    }

    #[test]
    fn test_open_conversation_seeds_initial_message() {
        let store = store();
        let summary = open(&store, "dana");

        assert_eq!(summary.unread, 1);
        assert_eq!(summary.last_message.as_deref(), Some("Hi, I need a quote"));

        let messages = store.messages(summary.id).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].from_support);
    }

    #[test]
    fn test_open_conversation_requires_name_and_email() {
        let store = store();
        let result = store.open_conversation(
            &OpenConversationRequest {
                customer_name: "  ".to_string(),
                customer_email: "a@b.c".to_string(),
                initial_message: None,
            },
            at(0),
        );

        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_message_ids_are_monotonic_across_conversations() {
        let store = store();
        let first = open(&store, "ana");
        let second = open(&store, "ben");

        let m3 = store
            .append_message(first.id, "hello", MessageKind::Text, true, at(1))
            .unwrap();
        let m4 = store
            .append_message(second.id, "hey", MessageKind::Text, true, at(2))
            .unwrap();

        assert!(m4.id > m3.id);
    }

    #[test]
    fn test_append_blank_message_is_rejected() {
        let store = store();
        let summary = open(&store, "dana");

        let result = store.append_message(summary.id, "   ", MessageKind::Text, true, at(1));
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn test_append_to_unknown_conversation_is_not_found() {
        let store = store();
        let result = store.append_message(999, "hello", MessageKind::Text, true, at(1));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_unread_counts_customer_messages_only() {
        let store = store();
        let summary = open(&store, "dana");

        store
            .append_message(summary.id, "reply", MessageKind::Text, true, at(1))
            .unwrap();
        store
            .append_message(summary.id, "another question", MessageKind::Text, false, at(2))
            .unwrap();

        let refreshed = store.conversation(summary.id).unwrap();
        assert_eq!(refreshed.unread, 2);

        let read = store.mark_read(summary.id).unwrap();
        assert_eq!(read.unread, 0);
    }

    #[test]
    fn test_conversations_sorted_by_activity() {
        let store = store();
        let first = open(&store, "ana");
        let second = open(&store, "ben");

        store
            .append_message(first.id, "newer activity", MessageKind::Text, false, at(30))
            .unwrap();

        let listed = store.conversations();
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }

    #[test]
    fn test_typing_flag_set_and_clear() {
        let store = store();
        let summary = open(&store, "dana");

        store.set_typing(summary.id, 0, true, at(1)).unwrap();
        assert!(store.typing(summary.id, 0, at(2)));

        store.set_typing(summary.id, 0, false, at(3)).unwrap();
        assert!(!store.typing(summary.id, 0, at(4)));
    }

    #[test]
    fn test_typing_flag_expires_server_side() {
        let store = store();
        let summary = open(&store, "dana");

        store.set_typing(summary.id, 0, true, at(0)).unwrap();

        // Within the 10s TTL the flag holds; past it, it reads false.
        assert!(store.typing(summary.id, 0, at(9)));
        assert!(!store.typing(summary.id, 0, at(11)));
    }

    #[test]
    fn test_typing_keys_are_per_user() {
        let store = store();
        let summary = open(&store, "dana");

        store
            .set_typing(summary.id, summary.customer_user_id, true, at(0))
            .unwrap();

        assert!(store.typing(summary.id, summary.customer_user_id, at(1)));
        assert!(!store.typing(summary.id, 0, at(1)));
    }

    #[test]
    fn test_presence_decays_with_heartbeat_age() {
        let store = store();
        store.heartbeat(7, None, at(0));

        assert_eq!(store.presence(7, at(10)).status, PresenceStatus::Online);
        assert_eq!(store.presence(7, at(45)).status, PresenceStatus::Away);

        let old = store.presence(7, Utc.with_ymd_and_hms(2025, 6, 1, 12, 5, 0).unwrap());
        assert_eq!(old.status, PresenceStatus::Offline);
        assert!(old.last_seen_at.is_some());
    }

    #[test]
    fn test_presence_unknown_user_is_offline() {
        let store = store();
        let snapshot = store.presence(99, at(0));

        assert_eq!(snapshot.status, PresenceStatus::Offline);
        assert!(snapshot.last_seen_at.is_none());
    }
}
