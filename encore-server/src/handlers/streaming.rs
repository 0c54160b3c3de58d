use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, Mutex, PoisonError},
};

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures_util::{Stream, StreamExt};
use shared::models::InboxStreamEvent;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::instrument;

use crate::{app_state::AppState, http::error::AppResult};

const CHANNEL_CAPACITY: usize = 64;

/// Per-conversation fan-out of [`InboxStreamEvent`]s.
///
/// Broadcast semantics: several inbox tabs may watch the same conversation.
/// A receiver that lags past the channel capacity silently misses events,
/// which is acceptable — consumers refetch the full message array on every
/// nudge, so a missed event costs one poll interval at worst.
#[derive(Debug, Default)]
pub struct InboxStreamHub {
    channels: Mutex<HashMap<i64, broadcast::Sender<InboxStreamEvent>>>,
}

impl InboxStreamHub {
    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<i64, broadcast::Sender<InboxStreamEvent>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a receiver for one conversation's events.
    pub fn subscribe(&self, conversation_id: i64) -> broadcast::Receiver<InboxStreamEvent> {
        let mut channels = self.lock();
        channels
            .entry(conversation_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Delivers an event to current subscribers. Returns how many receivers
    /// were reached.
    pub fn publish(&self, conversation_id: i64, event: &InboxStreamEvent) -> usize {
        let mut channels = self.lock();
        let Some(sender) = channels.get(&conversation_id) else {
            return 0;
        };
        if sender.receiver_count() == 0 {
            channels.remove(&conversation_id);
            return 0;
        }
        sender.send(event.clone()).unwrap_or(0)
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/admin/support/conversations/{conversation_id}/events",
        get(conversation_events),
    )
}

/// SSE stream of a conversation's events, with keep-alive comments so idle
/// streams survive proxies.
#[utoipa::path(
    get,
    path = "/api/admin/support/conversations/{conversation_id}/events",
    responses(
        (status = 200, description = "Event stream opened"),
        (status = 404, description = "Unknown conversation", body = shared::models::ErrorResponse)
    ),
    tag = "Support"
)]
#[instrument(skip(state))]
pub async fn conversation_events(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i64>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    state.store.conversation(conversation_id)?;
    metrics::counter!("support_stream_subscriptions_total").increment(1);

    let receiver = state.hub.subscribe(conversation_id);
    let stream = BroadcastStream::new(receiver).filter_map(|received| async move {
        match received {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(data) => Some(Ok(Event::default().event(event.event_name()).data(data))),
                Err(_) => None,
            },
            // Lagged receivers miss events; the client's next refetch heals.
            Err(_) => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
