//! Engine loop tests driven by a mocked transport.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use shared::{
    config::SyncConfig,
    models::{InboxStreamEvent, Message, MessageKind, SUPPORT_USER_ID, Timestamp, TypingRequest},
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    engine::{DeliveryMode, SyncEngine, SyncEvent},
    error::TransportError,
    store::Reconciliation,
    transport::{MockSupportTransport, SupportTransport},
};

const CUSTOMER: i64 = 42;

fn message(id: i64, conversation_id: i64, content: &str) -> Message {
    Message {
        id,
        conversation_id,
        content: content.to_string(),
        kind: MessageKind::Text,
        from_support: false,
        created_at: Timestamp(Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap()),
    }
}

fn no_push() -> Result<crate::transport::EventStream, TransportError> {
    Err(TransportError::Decode("push unavailable".to_string()))
}

/// Waits for the first event matching `predicate`, discarding the rest.
async fn wait_for<F>(events: &mut UnboundedReceiver<SyncEvent>, mut predicate: F) -> SyncEvent
where
    F: FnMut(&SyncEvent) -> bool,
{
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("timed out waiting for sync event")
            .expect("engine closed its event channel");
        if predicate(&event) {
            return event;
        }
    }
}

fn spawn_support(mock: MockSupportTransport) -> (crate::SyncHandle, UnboundedReceiver<SyncEvent>) {
    let transport: Arc<dyn SupportTransport> = Arc::new(mock);
    SyncEngine::spawn(transport, &SyncConfig::default(), SUPPORT_USER_ID)
}

#[tokio::test(start_paused = true)]
async fn test_select_loads_and_scrolls_to_bottom() {
    let mut mock = MockSupportTransport::new();
    mock.expect_subscribe().returning(|_| no_push());
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_messages()
        .returning(|id| Ok(vec![message(1, id, "welcome")]));

    let (handle, mut events) = spawn_support(mock);
    handle.select(7, CUSTOMER);

    let loading = wait_for(&mut events, |e| matches!(e, SyncEvent::Loading { .. })).await;
    assert_eq!(loading, SyncEvent::Loading { conversation_id: 7 });

    let loaded = wait_for(&mut events, |e| matches!(e, SyncEvent::Messages { .. })).await;
    let SyncEvent::Messages { messages, reason } = loaded else {
        unreachable!();
    };
    assert_eq!(reason, Reconciliation::Initial);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "welcome");

    wait_for(&mut events, |e| matches!(e, SyncEvent::ScrollToBottom)).await;
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_poll_ticks_pick_up_new_messages() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut mock = MockSupportTransport::new();
    mock.expect_subscribe().returning(|_| no_push());
    mock.expect_typing_status().returning(|_, _| Ok(false));
    let fetch_calls = Arc::clone(&calls);
    mock.expect_messages().returning(move |id| {
        if fetch_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![message(1, id, "first")])
        } else {
            Ok(vec![message(1, id, "first"), message(2, id, "second")])
        }
    });

    let (handle, mut events) = spawn_support(mock);
    handle.select(3, CUSTOMER);

    let grown = wait_for(&mut events, |e| {
        matches!(
            e,
            SyncEvent::Messages {
                reason: Reconciliation::NewMessages,
                ..
            }
        )
    })
    .await;
    let SyncEvent::Messages { messages, .. } = grown else {
        unreachable!();
    };
    assert_eq!(messages.len(), 2);
    assert!(calls.load(Ordering::SeqCst) >= 2);
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_optimistic_send_appears_before_any_response() {
    let mut mock = MockSupportTransport::new();
    mock.expect_subscribe().returning(|_| no_push());
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_messages()
        .returning(|id| Ok(vec![message(1, id, "earlier")]));
    mock.expect_send_reply()
        .returning(|id, request| Ok(message(99, id, &request.content)));

    let (handle, mut events) = spawn_support(mock);
    handle.select(5, CUSTOMER);
    handle.send_message("Hello", MessageKind::Text);

    let appended = wait_for(&mut events, |e| {
        matches!(e, SyncEvent::OptimisticAppend(_))
    })
    .await;
    let SyncEvent::OptimisticAppend(entry) = appended else {
        unreachable!();
    };
    assert_eq!(entry.content, "Hello");
    assert!(entry.from_support);

    // The append is followed by an immediate scroll, not a server round trip.
    wait_for(&mut events, |e| matches!(e, SyncEvent::ScrollToBottom)).await;
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_blank_send_is_a_noop() {
    let mut mock = MockSupportTransport::new();
    mock.expect_subscribe().returning(|_| no_push());
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_messages()
        .returning(|id| Ok(vec![message(1, id, "earlier")]));
    mock.expect_send_reply().times(0);

    let (handle, mut events) = spawn_support(mock);
    handle.select(5, CUSTOMER);
    handle.send_message("   \t ", MessageKind::Text);
    handle.shutdown();

    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        seen.push(event);
    }
    assert!(
        !seen
            .iter()
            .any(|e| matches!(e, SyncEvent::OptimisticAppend(_)))
    );
}

#[tokio::test(start_paused = true)]
async fn test_switch_discards_stale_conversation_response() {
    let mut mock = MockSupportTransport::new();
    mock.expect_subscribe().returning(|_| no_push());
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_messages()
        .returning(|id| Ok(vec![message(id * 10, id, &format!("conversation {id}"))]));

    let (handle, mut events) = spawn_support(mock);
    // Both commands are queued before the engine runs either, so the fetch
    // dispatched for conversation 1 can complete after the switch to 2.
    handle.select(1, CUSTOMER);
    handle.select(2, CUSTOMER);

    // Once the view is on conversation 2, a late response for conversation 1
    // must never be applied.
    wait_for(&mut events, |e| {
        matches!(e, SyncEvent::Loading { conversation_id: 2 })
    })
    .await;

    let loaded = wait_for(&mut events, |e| matches!(e, SyncEvent::Messages { .. })).await;
    let SyncEvent::Messages { messages, .. } = loaded else {
        unreachable!();
    };
    assert!(messages.iter().all(|m| m.conversation_id == 2));
    handle.shutdown();

    while let Some(event) = events.recv().await {
        if let SyncEvent::Messages { messages, .. } = event {
            assert!(messages.iter().all(|m| m.conversation_id == 2));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_push_subscription_drives_refetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut mock = MockSupportTransport::new();
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_subscribe().returning(|id| {
        let nudge = InboxStreamEvent::MessageNew {
            message: message(2, id, "pushed"),
        };
        let stream = futures_util::stream::iter(vec![nudge]).chain(futures_util::stream::pending());
        let stream: crate::transport::EventStream = Box::pin(stream);
        Ok(stream)
    });
    let fetch_calls = Arc::clone(&calls);
    mock.expect_messages().returning(move |id| {
        if fetch_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(vec![message(1, id, "first")])
        } else {
            Ok(vec![message(1, id, "first"), message(2, id, "pushed")])
        }
    });

    let (handle, mut events) = spawn_support(mock);
    handle.select(4, CUSTOMER);

    let mode = wait_for(&mut events, |e| matches!(e, SyncEvent::Mode(_))).await;
    assert_eq!(mode, SyncEvent::Mode(DeliveryMode::Push));

    let grown = wait_for(&mut events, |e| {
        matches!(
            e,
            SyncEvent::Messages {
                reason: Reconciliation::NewMessages,
                ..
            }
        )
    })
    .await;
    let SyncEvent::Messages { messages, .. } = grown else {
        unreachable!();
    };
    assert_eq!(messages.last().unwrap().content, "pushed");
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_push_typing_event_toggles_indicator() {
    let mut mock = MockSupportTransport::new();
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_messages()
        .returning(|id| Ok(vec![message(1, id, "hi")]));
    mock.expect_subscribe().returning(|_| {
        let typing = InboxStreamEvent::Typing {
            user_id: CUSTOMER,
            is_typing: true,
        };
        let stream =
            futures_util::stream::iter(vec![typing]).chain(futures_util::stream::pending());
        let stream: crate::transport::EventStream = Box::pin(stream);
        Ok(stream)
    });

    let (handle, mut events) = spawn_support(mock);
    handle.select(4, CUSTOMER);

    let typing = wait_for(&mut events, |e| matches!(e, SyncEvent::PeerTyping(_))).await;
    assert_eq!(typing, SyncEvent::PeerTyping(true));
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_keystrokes_broadcast_typing_start_and_stop() {
    let (typing_tx, mut typing_rx) = tokio::sync::mpsc::unbounded_channel::<TypingRequest>();

    let mut mock = MockSupportTransport::new();
    mock.expect_subscribe().returning(|_| no_push());
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_messages()
        .returning(|id| Ok(vec![message(1, id, "hi")]));
    mock.expect_set_typing().returning(move |request| {
        let _ = typing_tx.send(request);
        Ok(())
    });

    let (handle, mut events) = spawn_support(mock);
    handle.select(6, CUSTOMER);
    wait_for(&mut events, |e| matches!(e, SyncEvent::Messages { .. })).await;

    handle.keystroke();
    handle.keystroke();

    let started = tokio::time::timeout(Duration::from_secs(30), typing_rx.recv())
        .await
        .expect("no typing start broadcast")
        .unwrap();
    assert!(started.is_typing);
    assert_eq!(started.user_id, SUPPORT_USER_ID);
    assert_eq!(started.conversation_id, 6);

    // After the inactivity window the flag clears on its own.
    let stopped = tokio::time::timeout(Duration::from_secs(30), typing_rx.recv())
        .await
        .expect("no typing stop broadcast")
        .unwrap();
    assert!(!stopped.is_typing);
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_jump_to_latest_clears_badge() {
    let mut mock = MockSupportTransport::new();
    mock.expect_subscribe().returning(|_| no_push());
    mock.expect_typing_status().returning(|_, _| Ok(false));
    mock.expect_messages()
        .returning(|id| Ok(vec![message(1, id, "hi")]));

    let (handle, mut events) = spawn_support(mock);
    handle.select(8, CUSTOMER);
    wait_for(&mut events, |e| matches!(e, SyncEvent::Messages { .. })).await;

    handle.jump_to_latest();

    wait_for(&mut events, |e| matches!(e, SyncEvent::ScrollToBottom)).await;
    let badge = wait_for(&mut events, |e| matches!(e, SyncEvent::Badge { .. })).await;
    assert_eq!(badge, SyncEvent::Badge { visible: false });
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_refresh_inbox_is_independent_of_selection() {
    let mut mock = MockSupportTransport::new();
    mock.expect_conversations().returning(|| Ok(Vec::new()));

    let (handle, mut events) = spawn_support(mock);
    handle.refresh_inbox();

    let inbox = wait_for(&mut events, |e| matches!(e, SyncEvent::InboxLoaded(_))).await;
    assert_eq!(inbox, SyncEvent::InboxLoaded(Vec::new()));
    handle.shutdown();
}
