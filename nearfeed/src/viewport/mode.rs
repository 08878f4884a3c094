//! Browse/contribute mode transitions.
//!
//! `Browse ⇄ Contribute`, each reachable only from the other, no terminal
//! state. Entering Contribute snapshots the current center as the pinned
//! anchor (the viewport stops following gestures) and may stage a candidate
//! location for the new report. Exiting unpins and hands back a fresh
//! region snapshot for the caller to reload against.

use tracing::debug;

use crate::geo::Coordinate;

use super::{Mode, SearchRegion, ViewportState};

/// Result of a mode transition request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeChange {
    /// Contribute entered; `anchor` is the pinned center.
    Entered { anchor: Coordinate },

    /// Browse restored; the caller must reset-and-load against `reload`,
    /// a fresh snapshot whose sequence id supersedes any in-flight fetch.
    Exited { reload: SearchRegion },

    /// The requested mode was already active; nothing happened.
    Unchanged,
}

/// Governs the browse/contribute toggle.
///
/// Owns the pinned anchor and the staged candidate location while in
/// Contribute mode; consults and flips the mode owned by [`ViewportState`].
/// Lives for the whole session.
#[derive(Debug, Default)]
pub struct ModeController {
    anchor: Option<Coordinate>,
    staged: Option<Coordinate>,
}

impl ModeController {
    /// Create a controller in Browse mode with nothing pinned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter Contribute mode.
    ///
    /// Snapshots the current center as the pinned anchor. Calling while
    /// already in Contribute is a no-op: the existing anchor is kept, no
    /// duplicate snapshot is taken.
    pub fn enter_contribute(&mut self, viewport: &mut ViewportState) -> ModeChange {
        if viewport.mode() == Mode::Contribute {
            debug!("Already contributing, ignoring mode toggle");
            return ModeChange::Unchanged;
        }

        let anchor = viewport.region().center;
        self.anchor = Some(anchor);
        self.staged = None;
        viewport.set_mode(Mode::Contribute);
        debug!(anchor = %anchor, "Entered contribute mode");
        ModeChange::Entered { anchor }
    }

    /// Exit Contribute mode and restore Browse.
    ///
    /// Unpins the anchor, drops any staged candidate, and mints a fresh
    /// region snapshot for the caller to reload against. Calling while
    /// already in Browse is a no-op.
    pub fn exit_contribute(&mut self, viewport: &mut ViewportState) -> ModeChange {
        if viewport.mode() == Mode::Browse {
            debug!("Already browsing, ignoring mode toggle");
            return ModeChange::Unchanged;
        }

        self.anchor = None;
        self.staged = None;
        viewport.set_mode(Mode::Browse);
        let reload = viewport.refresh_region();
        debug!(seq = %reload.seq, "Exited contribute mode");
        ModeChange::Exited { reload }
    }

    /// The pinned anchor, while in Contribute mode.
    pub fn anchor(&self) -> Option<Coordinate> {
        self.anchor
    }

    /// Stage a candidate location for the new report.
    ///
    /// Only meaningful in Contribute mode (the anchor must be pinned); the
    /// caller validates the candidate against the search region first.
    /// Returns `false` when no anchor is pinned.
    pub fn stage_candidate(&mut self, candidate: Coordinate) -> bool {
        if self.anchor.is_none() {
            return false;
        }
        self.staged = Some(candidate);
        true
    }

    /// The currently staged candidate location, if any.
    ///
    /// Read by the (external) contribution form when submitting the report.
    pub fn staged_candidate(&self) -> Option<Coordinate> {
        self.staged
    }
}
