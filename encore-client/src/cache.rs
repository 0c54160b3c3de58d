use std::{
    collections::HashMap,
    fmt::Display,
    future::Future,
    hash::Hash,
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use tokio::sync::{Mutex, watch};

use crate::clock::{Clock, SystemClock};

/// Error surfaced to every caller sharing a failed fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("fetch failed: {0}")]
    Fetch(String),
}

enum Slot<V> {
    Ready {
        value: V,
        fetched_at: Instant,
    },
    Pending(watch::Receiver<Option<Result<V, CacheError>>>),
}

enum Role<V> {
    Hit(V),
    Follower(watch::Receiver<Option<Result<V, CacheError>>>),
    Leader(watch::Sender<Option<Result<V, CacheError>>>),
}

/// Get-or-fetch cache with a TTL window and single-flight deduplication:
/// at most one fetch is in flight per key, and concurrent callers share its
/// outcome. Used for counterpart online-status lookups, where every open
/// conversation row would otherwise issue its own request.
///
/// Failed fetches are not cached; the next caller retries.
pub struct FetchCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> FetchCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value when fresh; otherwise runs `fetch` — or, if
    /// another caller is already fetching this key, waits for that caller's
    /// outcome instead.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let role = {
            let mut slots = self.slots.lock().await;
            match slots.get(&key) {
                Some(Slot::Ready { value, fetched_at })
                    if self.clock.now().duration_since(*fetched_at) < self.ttl =>
                {
                    Role::Hit(value.clone())
                }
                Some(Slot::Pending(receiver)) => Role::Follower(receiver.clone()),
                _ => {
                    let (sender, receiver) = watch::channel(None);
                    slots.insert(key.clone(), Slot::Pending(receiver));
                    Role::Leader(sender)
                }
            }
        };

        match role {
            Role::Hit(value) => Ok(value),
            Role::Follower(mut receiver) => loop {
                if let Some(result) = receiver.borrow_and_update().clone() {
                    return result;
                }
                if receiver.changed().await.is_err() {
                    return Err(CacheError::Fetch("shared fetch was dropped".to_string()));
                }
            },
            Role::Leader(sender) => {
                let result = fetch()
                    .await
                    .map_err(|err| CacheError::Fetch(err.to_string()));

                let mut slots = self.slots.lock().await;
                match &result {
                    Ok(value) => {
                        slots.insert(
                            key,
                            Slot::Ready {
                                value: value.clone(),
                                fetched_at: self.clock.now(),
                            },
                        );
                    }
                    Err(_) => {
                        slots.remove(&key);
                    }
                }
                drop(slots);

                // Followers may all have given up; that is fine.
                let _ = sender.send(Some(result.clone()));
                result
            }
        }
    }

    /// Drops the cached value for `key`, forcing the next caller to fetch.
    pub async fn invalidate(&self, key: &K) {
        self.slots.lock().await.remove(key);
    }
}
