use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::clock::{Clock, SystemClock};

/// Transition to broadcast to the other side of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    Started,
    Stopped,
}

/// Sender-side typing state: the first keystroke of a burst starts the flag,
/// and an inactivity window of composer silence clears it. Every keystroke
/// re-arms the window.
pub struct TypingDebounce {
    window: Duration,
    clock: Arc<dyn Clock>,
    active: bool,
    deadline: Option<Instant>,
}

impl std::fmt::Debug for TypingDebounce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingDebounce")
            .field("window", &self.window)
            .field("active", &self.active)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl TypingDebounce {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            active: false,
            deadline: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Time left until the flag should clear, saturating at zero.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Records composer activity. Returns [`TypingSignal::Started`] when this
    /// keystroke begins a burst; later keystrokes only re-arm the window.
    pub fn keystroke(&mut self) -> Option<TypingSignal> {
        self.deadline = Some(self.clock.now() + self.window);
        if self.active {
            None
        } else {
            self.active = true;
            Some(TypingSignal::Started)
        }
    }

    /// Checks the injected clock against the armed window. Returns
    /// [`TypingSignal::Stopped`] once the window has elapsed.
    pub fn poll(&mut self) -> Option<TypingSignal> {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => self.expire(),
            _ => None,
        }
    }

    /// Clears the flag unconditionally; used when an external timer has
    /// already slept through the window.
    pub fn expire(&mut self) -> Option<TypingSignal> {
        self.deadline = None;
        if self.active {
            self.active = false;
            Some(TypingSignal::Stopped)
        } else {
            None
        }
    }

    /// Forgets all state without emitting a signal, e.g. when the selected
    /// conversation changes.
    pub fn reset(&mut self) {
        self.active = false;
        self.deadline = None;
    }
}
