use chrono::{DateTime, Utc};
use shared::models::{Message, MessageKind};

use crate::{
    store::{MessageStore, Reconciliation},
    viewport::{ScrollEffect, ScrollTracker, ViewportMetrics},
};

/// Lifecycle of the conversation view. There is no error phase: fetch
/// failures leave the session where it was and the next refresh self-heals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No conversation selected.
    Idle,
    /// Initial fetch in flight.
    Loading,
    /// Refreshes are being applied.
    Live,
}

/// Result of applying a fetched message array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMessages {
    pub reason: Reconciliation,
    pub effect: Option<ScrollEffect>,
}

/// Deterministic core of the sync engine: message store, scroll tracking,
/// peer typing flag, and the generation fence that discards responses
/// dispatched for a previously selected conversation.
#[derive(Debug)]
pub struct InboxSession {
    phase: Phase,
    conversation: Option<i64>,
    generation: u64,
    store: MessageStore,
    scroll: ScrollTracker,
    peer_typing: bool,
}

impl Default for InboxSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InboxSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            conversation: None,
            generation: 0,
            store: MessageStore::new(),
            scroll: ScrollTracker::new(),
            peer_typing: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn conversation(&self) -> Option<i64> {
        self.conversation
    }

    /// Fence tag to attach to requests dispatched right now.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    #[must_use]
    pub fn peer_typing(&self) -> bool {
        self.peer_typing
    }

    #[must_use]
    pub fn at_bottom(&self) -> bool {
        self.scroll.at_bottom()
    }

    #[must_use]
    pub fn has_unseen(&self) -> bool {
        self.scroll.has_unseen()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.conversation.is_some()
    }

    /// Switches to `conversation_id`, resetting all per-conversation state
    /// and advancing the fence so late responses for the previous selection
    /// are dropped. Returns the new generation.
    pub fn select(&mut self, conversation_id: i64) -> u64 {
        self.generation += 1;
        self.conversation = Some(conversation_id);
        self.phase = Phase::Loading;
        self.store.clear();
        self.scroll.reset();
        self.peer_typing = false;
        self.generation
    }

    /// Leaves the conversation view entirely.
    pub fn deselect(&mut self) {
        self.generation += 1;
        self.conversation = None;
        self.phase = Phase::Idle;
        self.store.clear();
        self.scroll.reset();
        self.peer_typing = false;
    }

    /// Applies a fetched message array tagged with the generation it was
    /// dispatched under. Returns `None` when the response is fenced out.
    pub fn apply_messages(
        &mut self,
        generation: u64,
        messages: Vec<Message>,
    ) -> Option<AppliedMessages> {
        if !self.is_active() || generation != self.generation {
            return None;
        }

        let reason = self.store.reconcile(messages);
        self.phase = Phase::Live;
        let effect = match reason {
            // Opening a conversation lands the view on the latest message.
            Reconciliation::Initial => Some(ScrollEffect::AutoScroll),
            Reconciliation::NewMessages => Some(self.scroll.on_new_messages()),
            Reconciliation::Unchanged => None,
        };
        Some(AppliedMessages { reason, effect })
    }

    /// Applies a fetched or pushed typing flag. Returns the new value when it
    /// changed, `None` when unchanged or fenced out.
    pub fn apply_typing(&mut self, generation: u64, is_typing: bool) -> Option<bool> {
        if !self.is_active() || generation != self.generation {
            return None;
        }
        if self.peer_typing == is_typing {
            return None;
        }
        self.peer_typing = is_typing;
        Some(is_typing)
    }

    /// Appends an optimistic entry for the current conversation. Blank
    /// content or no selection is a no-op.
    pub fn compose_local(
        &mut self,
        content: &str,
        kind: MessageKind,
        from_support: bool,
        now: DateTime<Utc>,
    ) -> Option<Message> {
        let conversation_id = self.conversation?;
        self.store
            .append_local(conversation_id, content, kind, from_support, now)
    }

    /// Records an explicit user scroll. Returns the new badge visibility when
    /// it changed.
    pub fn observe_viewport(&mut self, metrics: ViewportMetrics) -> Option<bool> {
        let before = self.scroll.has_unseen();
        self.scroll.observe(metrics);
        let after = self.scroll.has_unseen();
        (before != after).then_some(after)
    }

    /// The user clicked the "new messages" pill.
    pub fn jump_to_latest(&mut self) {
        self.scroll.jump_to_latest();
    }
}
