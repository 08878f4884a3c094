//! Pan-gesture debouncing.
//!
//! Rapid successive pan events within the window collapse into a single
//! region commit: every new event restarts the timer (it is never queued),
//! so only the last settled position triggers a fetch. The state machine
//! takes explicit timestamps, keeping the single-fetch-per-settle guarantee
//! testable without an event loop; the engine feeds it the clock and sleeps
//! until [`PanDebouncer::deadline`].

use std::time::{Duration, Instant};

use crate::geo::Coordinate;

/// Default settle window for pan gestures.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Restart-on-activity debounce timer holding the latest pan position.
#[derive(Debug)]
pub struct PanDebouncer {
    window: Duration,

    /// Latest position seen in the current gesture burst.
    pending: Option<Coordinate>,

    /// When the current burst settles, if one is active.
    deadline: Option<Instant>,
}

impl PanDebouncer {
    /// Create a debouncer with the given settle window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Create a debouncer with the default window.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }

    /// Record a pan event at `now`.
    ///
    /// Replaces any pending position and restarts the settle timer.
    pub fn record_pan(&mut self, center: Coordinate, now: Instant) {
        self.pending = Some(center);
        self.deadline = Some(now + self.window);
    }

    /// When the pending gesture settles, if one is active.
    ///
    /// The engine sleeps until this instant; a newer pan moves it forward.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a pan is waiting to settle.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the settled position if the window has elapsed at `now`.
    ///
    /// Returns `None` while the timer is still running or when nothing is
    /// pending. Taking clears the state, so each burst settles exactly once.
    pub fn take_settled(&mut self, now: Instant) -> Option<Coordinate> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Drop any pending gesture without settling it.
    ///
    /// Used on mode switches: a pan that was still settling when the user
    /// entered Contribute must not fire afterwards.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }
}
