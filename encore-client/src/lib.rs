#![cfg_attr(not(test), forbid(unsafe_code))]

//! Conversation sync engine for the Encore support inbox.
//!
//! The engine keeps a client-side view of one support conversation eventually
//! consistent with the server. It subscribes to the conversation's event
//! stream when it can and falls back to fixed-interval polling when it
//! cannot; in both modes the message list is replaced wholesale with the
//! server's copy, so the freshest fetch always wins.

pub mod cache;
pub mod clock;
pub mod engine;
#[cfg(test)]
mod engine_tests;
pub mod error;
pub mod session;
pub mod store;
pub mod transport;
pub mod typing;
pub mod viewport;

pub use cache::{CacheError, FetchCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{DeliveryMode, SyncCommand, SyncEngine, SyncEvent, SyncHandle};
pub use error::TransportError;
pub use session::{InboxSession, Phase};
pub use store::{MessageStore, Reconciliation};
pub use transport::{EventStream, HttpTransport, SupportTransport};
pub use typing::{TypingDebounce, TypingSignal};
pub use viewport::{NEAR_BOTTOM_PX, ScrollEffect, ScrollTracker, ViewportMetrics};
