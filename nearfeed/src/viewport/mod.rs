//! Viewport state: the current search region and interaction mode.
//!
//! The viewport exclusively owns the active [`SearchRegion`]. Regions are
//! immutable snapshots; every pan, radius change, filter change, or refresh
//! supersedes the current region with a new one carrying a freshly
//! incremented sequence id. The sequence id is the basis for stale-response
//! detection in the paginator: a fetch completion whose region sequence no
//! longer matches the active one is discarded.

mod mode;

pub use mode::{ModeChange, ModeController};

use thiserror::Error;
use tracing::debug;

use crate::geo::Coordinate;

/// Monotonic sequence id identifying a region snapshot.
///
/// Strictly increasing for the lifetime of the owning [`ViewportState`];
/// never reused. Owned per instance rather than by a process-wide counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionSeq(u64);

impl RegionSeq {
    /// Raw counter value, for logs and diagnostics.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RegionSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable snapshot of the circular search area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRegion {
    /// Center of the search circle.
    pub center: Coordinate,
    /// Radius of the search circle in meters. Always > 0.
    pub radius_m: u32,
    /// Snapshot sequence id.
    pub seq: RegionSeq,
}

impl SearchRegion {
    /// Whether a coordinate lies within this region's circle.
    pub fn contains(&self, c: Coordinate) -> bool {
        crate::geo::is_within_radius(self.center, c, f64::from(self.radius_m))
    }
}

/// Interaction mode. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Read-only discovery: viewport changes trigger fetches.
    Browse,
    /// Staging a new report: the viewport is pinned and fetches are gated.
    Contribute,
}

impl Mode {
    /// Short label for display and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Browse => "browse",
            Mode::Contribute => "contribute",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors from viewport operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewportError {
    /// Radius must be strictly positive.
    #[error("invalid radius: {0} m")]
    InvalidRadius(u32),

    /// Center coordinate out of range or not finite.
    #[error("invalid region center: ({0}, {1})")]
    InvalidRegion(f64, f64),
}

/// Owner of the current search region and mode.
///
/// All mutations mint a new region snapshot; the previous snapshot is
/// superseded, never edited in place. Rejections happen here, before any
/// fetch is attempted, so invalid input never reaches the network layer.
#[derive(Debug)]
pub struct ViewportState {
    region: SearchRegion,
    mode: Mode,
    next_seq: u64,
}

impl ViewportState {
    /// Create a viewport centered on `center` with the given radius.
    ///
    /// # Errors
    ///
    /// Rejects a non-positive radius or an out-of-range center.
    pub fn new(center: Coordinate, radius_m: u32) -> Result<Self, ViewportError> {
        if radius_m == 0 {
            return Err(ViewportError::InvalidRadius(radius_m));
        }
        if !center.is_valid() {
            return Err(ViewportError::InvalidRegion(center.lat, center.lng));
        }
        Ok(Self {
            region: SearchRegion {
                center,
                radius_m,
                seq: RegionSeq(1),
            },
            mode: Mode::Browse,
            next_seq: 2,
        })
    }

    /// The current region snapshot.
    pub fn region(&self) -> SearchRegion {
        self.region
    }

    /// The current interaction mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Move the region center, minting a new snapshot.
    ///
    /// Returns `Ok(Some(region))` with the superseding snapshot - the
    /// "region changed" signal the caller forwards to the paginator - or
    /// `Ok(None)` when the viewport is pinned in Contribute mode and the
    /// move is ignored.
    pub fn set_center(&mut self, center: Coordinate) -> Result<Option<SearchRegion>, ViewportError> {
        if !center.is_valid() {
            return Err(ViewportError::InvalidRegion(center.lat, center.lng));
        }
        if self.mode == Mode::Contribute {
            debug!(mode = %self.mode, "Viewport pinned, ignoring center change");
            return Ok(None);
        }
        Ok(Some(self.advance(center, self.region.radius_m)))
    }

    /// Change the region radius, minting a new snapshot.
    ///
    /// Same return contract as [`ViewportState::set_center`]. A zero radius
    /// is rejected before any fetch is attempted.
    pub fn set_radius(&mut self, radius_m: u32) -> Result<Option<SearchRegion>, ViewportError> {
        if radius_m == 0 {
            return Err(ViewportError::InvalidRadius(radius_m));
        }
        if self.mode == Mode::Contribute {
            debug!(mode = %self.mode, "Viewport pinned, ignoring radius change");
            return Ok(None);
        }
        Ok(Some(self.advance(self.region.center, radius_m)))
    }

    /// Mint a new snapshot at the current center and radius.
    ///
    /// Used for refresh-in-place and filter changes: the geometry is
    /// unchanged but the new sequence id supersedes any in-flight fetch.
    pub fn refresh_region(&mut self) -> SearchRegion {
        self.advance(self.region.center, self.region.radius_m)
    }

    fn advance(&mut self, center: Coordinate, radius_m: u32) -> SearchRegion {
        let seq = RegionSeq(self.next_seq);
        self.next_seq += 1;
        self.region = SearchRegion {
            center,
            radius_m,
            seq,
        };
        debug!(seq = %seq, center = %center, radius_m, "Region superseded");
        self.region
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }
}
