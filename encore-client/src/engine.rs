use std::{sync::Arc, time::Duration};

use chrono::Utc;
use futures_util::StreamExt;
use shared::{
    config::SyncConfig,
    models::{
        ConversationSummary, InboxStreamEvent, Message, MessageKind, ReplyRequest,
        SUPPORT_USER_ID, TypingRequest,
    },
};
use tokio::{
    sync::mpsc,
    time::{Interval, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    error::TransportError,
    session::InboxSession,
    store::Reconciliation,
    transport::{EventStream, SupportTransport},
    typing::{TypingDebounce, TypingSignal},
    viewport::{ScrollEffect, ViewportMetrics},
};

/// How fresh state currently reaches the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Subscribed to the conversation's event stream.
    Push,
    /// Fixed-interval polling fallback.
    Poll,
}

/// Commands accepted by a running engine, sent through [`SyncHandle`].
#[derive(Debug, Clone)]
pub enum SyncCommand {
    /// Re-fetch the conversation list. Independent of the per-conversation
    /// refresh cycle.
    RefreshInbox,
    /// Switch the view to a conversation. `counterpart_user_id` is whose
    /// typing flag to observe.
    Select {
        conversation_id: i64,
        counterpart_user_id: i64,
    },
    Deselect,
    /// Composer activity; drives the typing debounce.
    Keystroke,
    /// Send a message from the local side.
    Send { content: String, kind: MessageKind },
    /// The user scrolled the message container.
    Viewport(ViewportMetrics),
    /// The user clicked the "new messages" pill.
    JumpToLatest,
    Shutdown,
}

/// Notifications emitted by the engine for the host view to render.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    InboxLoaded(Vec<ConversationSummary>),
    Loading { conversation_id: i64 },
    /// The message list was replaced with fresh server state.
    Messages {
        messages: Vec<Message>,
        reason: Reconciliation,
    },
    /// An optimistic entry was appended locally.
    OptimisticAppend(Message),
    ScrollToBottom,
    Badge { visible: bool },
    PeerTyping(bool),
    ConversationUpdated(ConversationSummary),
    Mode(DeliveryMode),
}

/// Fetch results funneled back into the engine loop, tagged with the
/// generation they were dispatched under so stale responses can be dropped.
#[derive(Debug)]
enum FetchOutcome {
    Inbox(Result<Vec<ConversationSummary>, TransportError>),
    Messages {
        generation: u64,
        result: Result<Vec<Message>, TransportError>,
    },
    Typing {
        generation: u64,
        result: Result<bool, TransportError>,
    },
}

/// Cheap cloneable handle for feeding commands to a spawned engine.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    commands: mpsc::UnboundedSender<SyncCommand>,
}

impl SyncHandle {
    pub fn send_command(&self, command: SyncCommand) {
        // A closed channel means the engine shut down; nothing to do.
        let _ = self.commands.send(command);
    }

    pub fn refresh_inbox(&self) {
        self.send_command(SyncCommand::RefreshInbox);
    }

    pub fn select(&self, conversation_id: i64, counterpart_user_id: i64) {
        self.send_command(SyncCommand::Select {
            conversation_id,
            counterpart_user_id,
        });
    }

    pub fn deselect(&self) {
        self.send_command(SyncCommand::Deselect);
    }

    pub fn keystroke(&self) {
        self.send_command(SyncCommand::Keystroke);
    }

    pub fn send_message(&self, content: impl Into<String>, kind: MessageKind) {
        self.send_command(SyncCommand::Send {
            content: content.into(),
            kind,
        });
    }

    pub fn viewport(&self, metrics: ViewportMetrics) {
        self.send_command(SyncCommand::Viewport(metrics));
    }

    pub fn jump_to_latest(&self) {
        self.send_command(SyncCommand::JumpToLatest);
    }

    pub fn shutdown(&self) {
        self.send_command(SyncCommand::Shutdown);
    }
}

/// Keeps one conversation view eventually consistent with the server.
///
/// The engine prefers the push channel and degrades to fixed-interval
/// polling; in both modes every update is a full refetch of the message
/// array, applied through [`InboxSession`] under a generation fence.
pub struct SyncEngine {
    transport: Arc<dyn SupportTransport>,
    user_id: i64,
    poll_interval: Duration,
    session: InboxSession,
    typing: TypingDebounce,
    counterpart: Option<i64>,
    mode: DeliveryMode,
    events: mpsc::UnboundedSender<SyncEvent>,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
}

impl SyncEngine {
    /// Spawns an engine onto the current runtime and returns the command
    /// handle plus the event stream.
    #[must_use]
    pub fn spawn(
        transport: Arc<dyn SupportTransport>,
        sync: &SyncConfig,
        user_id: i64,
    ) -> (SyncHandle, mpsc::UnboundedReceiver<SyncEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let engine = Self {
            transport,
            user_id,
            poll_interval: sync.poll_interval(),
            session: InboxSession::new(),
            typing: TypingDebounce::new(sync.typing_debounce()),
            counterpart: None,
            mode: DeliveryMode::Poll,
            events: event_tx,
            outcomes: outcome_tx,
        };
        tokio::spawn(engine.run(command_rx, outcome_rx));

        (SyncHandle { commands: command_tx }, event_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SyncCommand>,
        mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    ) {
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut push: Option<EventStream> = None;

        loop {
            let typing_wait = self.typing.remaining();
            let polling = push.is_none() && self.session.is_active();

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command, &mut push, &mut poll).await {
                        break;
                    }
                }
                outcome = outcomes.recv() => {
                    if let Some(outcome) = outcome {
                        self.apply_outcome(outcome);
                    }
                }
                _ = poll.tick(), if polling => self.dispatch_refresh(),
                event = Self::next_push(&mut push) => match event {
                    Some(event) => self.handle_push(event),
                    None => {
                        push = None;
                        self.set_mode(DeliveryMode::Poll);
                        self.dispatch_refresh();
                    }
                },
                () = Self::wait_typing(typing_wait), if typing_wait.is_some() => {
                    self.flush_typing_stop();
                }
            }
        }
    }

    async fn next_push(push: &mut Option<EventStream>) -> Option<InboxStreamEvent> {
        match push {
            Some(stream) => stream.next().await,
            None => std::future::pending().await,
        }
    }

    async fn wait_typing(wait: Option<Duration>) {
        match wait {
            Some(wait) => tokio::time::sleep(wait).await,
            None => std::future::pending().await,
        }
    }

    async fn handle_command(
        &mut self,
        command: SyncCommand,
        push: &mut Option<EventStream>,
        poll: &mut Interval,
    ) -> bool {
        match command {
            SyncCommand::RefreshInbox => {
                let transport = Arc::clone(&self.transport);
                let outcomes = self.outcomes.clone();
                tokio::spawn(async move {
                    let result = transport.conversations().await;
                    let _ = outcomes.send(FetchOutcome::Inbox(result));
                });
            }
            SyncCommand::Select {
                conversation_id,
                counterpart_user_id,
            } => {
                self.counterpart = Some(counterpart_user_id);
                self.session.select(conversation_id);
                self.typing.reset();
                // Dropping the previous subscription cancels it; the stale
                // generation fences out any response already in flight.
                *push = None;
                poll.reset();

                self.emit(SyncEvent::Loading { conversation_id });
                self.emit(SyncEvent::Badge { visible: false });
                self.dispatch_refresh();

                match self.transport.subscribe(conversation_id).await {
                    Ok(stream) => {
                        *push = Some(stream);
                        self.set_mode(DeliveryMode::Push);
                    }
                    Err(err) => {
                        debug!(error = %err, conversation_id, "subscribe failed; polling");
                        self.set_mode(DeliveryMode::Poll);
                    }
                }
            }
            SyncCommand::Deselect => {
                self.session.deselect();
                self.typing.reset();
                self.counterpart = None;
                *push = None;
            }
            SyncCommand::Keystroke => self.handle_keystroke(),
            SyncCommand::Send { content, kind } => self.handle_send(&content, kind),
            SyncCommand::Viewport(metrics) => {
                if let Some(visible) = self.session.observe_viewport(metrics) {
                    self.emit(SyncEvent::Badge { visible });
                }
            }
            SyncCommand::JumpToLatest => {
                self.session.jump_to_latest();
                self.emit(SyncEvent::ScrollToBottom);
                self.emit(SyncEvent::Badge { visible: false });
            }
            SyncCommand::Shutdown => return false,
        }
        true
    }

    fn handle_keystroke(&mut self) {
        let Some(conversation_id) = self.session.conversation() else {
            return;
        };
        if self.typing.keystroke() == Some(TypingSignal::Started) {
            self.broadcast_typing(conversation_id, true);
        }
    }

    fn flush_typing_stop(&mut self) {
        let Some(conversation_id) = self.session.conversation() else {
            self.typing.reset();
            return;
        };
        if self.typing.expire() == Some(TypingSignal::Stopped) {
            self.broadcast_typing(conversation_id, false);
        }
    }

    fn broadcast_typing(&self, conversation_id: i64, is_typing: bool) {
        let transport = Arc::clone(&self.transport);
        let request = TypingRequest {
            conversation_id,
            user_id: self.user_id,
            is_typing,
        };
        tokio::spawn(async move {
            if let Err(err) = transport.set_typing(request).await {
                debug!(error = %err, "failed to broadcast typing flag");
            }
        });
    }

    fn handle_send(&mut self, content: &str, kind: MessageKind) {
        let from_support = self.user_id == SUPPORT_USER_ID;
        let Some(message) = self
            .session
            .compose_local(content, kind, from_support, Utc::now())
        else {
            // Blank content, or nothing selected: no append, no request.
            return;
        };

        self.emit(SyncEvent::OptimisticAppend(message.clone()));
        self.emit(SyncEvent::ScrollToBottom);

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            let result = if from_support {
                transport
                    .send_reply(
                        message.conversation_id,
                        ReplyRequest {
                            content: message.content.clone(),
                            kind,
                        },
                    )
                    .await
                    .map(|_| ())
            } else {
                transport
                    .send_customer_message(shared::models::CustomerMessageRequest {
                        conversation_id: message.conversation_id,
                        content: message.content.clone(),
                        kind,
                    })
                    .await
                    .map(|_| ())
            };

            // Best-effort: the optimistic entry stays until the next refresh
            // contradicts it.
            if let Err(err) = result {
                warn!(error = %err, conversation_id = message.conversation_id, "send failed");
            }
        });
    }

    /// Dispatches the message and typing fetches for the active conversation,
    /// tagged with the current generation.
    fn dispatch_refresh(&self) {
        let Some(conversation_id) = self.session.conversation() else {
            return;
        };
        let generation = self.session.generation();

        let transport = Arc::clone(&self.transport);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let result = transport.messages(conversation_id).await;
            let _ = outcomes.send(FetchOutcome::Messages { generation, result });
        });

        if let Some(counterpart) = self.counterpart {
            let transport = Arc::clone(&self.transport);
            let outcomes = self.outcomes.clone();
            tokio::spawn(async move {
                let result = transport.typing_status(conversation_id, counterpart).await;
                let _ = outcomes.send(FetchOutcome::Typing { generation, result });
            });
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Inbox(Ok(conversations)) => {
                self.emit(SyncEvent::InboxLoaded(conversations));
            }
            FetchOutcome::Inbox(Err(err)) => {
                debug!(error = %err, "inbox fetch failed");
            }
            FetchOutcome::Messages { generation, result } => match result {
                Ok(messages) => {
                    if let Some(applied) = self.session.apply_messages(generation, messages) {
                        self.emit(SyncEvent::Messages {
                            messages: self.session.messages().to_vec(),
                            reason: applied.reason,
                        });
                        match applied.effect {
                            Some(ScrollEffect::AutoScroll) => self.emit(SyncEvent::ScrollToBottom),
                            Some(ScrollEffect::Badge) => {
                                self.emit(SyncEvent::Badge { visible: true });
                            }
                            None => {}
                        }
                    }
                }
                Err(err) => {
                    // Swallowed: the next refresh self-heals.
                    debug!(error = %err, "message refresh failed");
                }
            },
            FetchOutcome::Typing { generation, result } => match result {
                Ok(is_typing) => {
                    if let Some(flag) = self.session.apply_typing(generation, is_typing) {
                        self.emit(SyncEvent::PeerTyping(flag));
                    }
                }
                Err(err) => {
                    debug!(error = %err, "typing refresh failed");
                }
            },
        }
    }

    fn handle_push(&mut self, event: InboxStreamEvent) {
        match event {
            InboxStreamEvent::MessageNew { message } => {
                // Refetch instead of patching so push and poll share one
                // reconciliation contract.
                if self.session.conversation() == Some(message.conversation_id) {
                    self.dispatch_refresh();
                }
            }
            InboxStreamEvent::Typing { user_id, is_typing } => {
                if Some(user_id) == self.counterpart {
                    let generation = self.session.generation();
                    if let Some(flag) = self.session.apply_typing(generation, is_typing) {
                        self.emit(SyncEvent::PeerTyping(flag));
                    }
                }
            }
            InboxStreamEvent::ConversationUpdated { conversation } => {
                self.emit(SyncEvent::ConversationUpdated(conversation));
            }
        }
    }

    fn set_mode(&mut self, mode: DeliveryMode) {
        if self.mode != mode {
            self.mode = mode;
            self.emit(SyncEvent::Mode(mode));
        }
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }
}
