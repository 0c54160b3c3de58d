/// Distance from the bottom edge, in pixels, within which the view still
/// counts as "at the bottom".
pub const NEAR_BOTTOM_PX: f64 = 50.0;

/// Geometry of the message-list scroll container, reported by the host view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ViewportMetrics {
    #[must_use]
    pub fn distance_from_bottom(&self) -> f64 {
        (self.content_height - self.viewport_height - self.scroll_top).max(0.0)
    }

    #[must_use]
    pub fn at_bottom(&self) -> bool {
        self.distance_from_bottom() <= NEAR_BOTTOM_PX
    }
}

/// What the host view should do after new messages arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEffect {
    /// Scroll smoothly to the bottom.
    AutoScroll,
    /// Leave the scroll position alone and show the "new messages" pill.
    Badge,
}

/// Decides between auto-scrolling and raising the "new messages" affordance.
///
/// A fresh tracker assumes the view is at the bottom with nothing unseen,
/// which is also the state after every conversation switch.
#[derive(Debug, Clone, Copy)]
pub struct ScrollTracker {
    at_bottom: bool,
    unseen: bool,
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self {
            at_bottom: true,
            unseen: false,
        }
    }
}

impl ScrollTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    #[must_use]
    pub fn has_unseen(&self) -> bool {
        self.unseen
    }

    /// Records an explicit user scroll. Scrolling back to the bottom clears
    /// the unseen flag without a click on the pill.
    pub fn observe(&mut self, metrics: ViewportMetrics) {
        self.at_bottom = metrics.at_bottom();
        if self.at_bottom {
            self.unseen = false;
        }
    }

    /// Classifies a new-message arrival against the current scroll position.
    pub fn on_new_messages(&mut self) -> ScrollEffect {
        if self.at_bottom {
            ScrollEffect::AutoScroll
        } else {
            self.unseen = true;
            ScrollEffect::Badge
        }
    }

    /// The user clicked the pill: jump down and clear it.
    pub fn jump_to_latest(&mut self) {
        self.at_bottom = true;
        self.unseen = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
