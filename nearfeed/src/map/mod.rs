//! Map view synchronization.
//!
//! The concrete map widget lives outside this crate; the engine drives it
//! through the [`MapSurface`] trait and receives its user gestures back as
//! [`FeedEvent`]s. The [`MapSyncAdapter`] owns all display-derived state
//! (marker handles, last rendered fingerprint) and is the only writer of
//! surface primitives - no other component touches the map. It holds no
//! authority over search semantics: gestures are forwarded, never applied
//! locally.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::feed::{Category, FeedItem, ItemGroup, ItemId};
use crate::geo::Coordinate;
use crate::query::{GeocodeError, LocationError, QueryError};
use crate::sync::FeedEvent;
use crate::viewport::{RegionSeq, SearchRegion};

/// One map marker, standing for a whole item group.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// Group bucket key; doubles as the marker handle id.
    pub key: String,
    /// Marker position (the representative's coordinate).
    pub position: Coordinate,
    /// Representative category, for marker styling.
    pub category: Category,
    /// Popup body: the representative's content.
    pub popup: String,
    /// Number of items collapsed into this marker.
    pub member_count: usize,
}

/// One side-panel row. Panel rows and markers are click-synchronized
/// through the shared group key.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelEntry {
    /// Group bucket key shared with the marker (if one exists).
    pub key: String,
    /// Representative item id.
    pub item_id: ItemId,
    /// Representative category.
    pub category: Category,
    /// Representative content.
    pub content: String,
    /// Representative creation time.
    pub created_at: DateTime<Utc>,
    /// Representative view count.
    pub view_count: u64,
    /// Number of items in the group.
    pub member_count: usize,
    /// Whether a marker exists for this row. Rows without one (malformed
    /// representative coordinates) still render in the panel.
    pub has_marker: bool,
}

/// User-facing notifications raised on external failures.
///
/// Every notice accompanies preserved prior state - the view never
/// regresses to an empty or inconsistent display on error.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Geolocation failed; the view fell back to the default region.
    LocationFallback(LocationError),

    /// A nearby query failed; current items are kept and the user may
    /// retry.
    QueryFailed(QueryError),

    /// The detail/view path was rate limited. Distinct from
    /// [`Notice::QueryFailed`]: retrying within the window will not help.
    RateLimited,

    /// Address search matched nothing; the previous region stands.
    AddressNotFound(String),

    /// Address search failed to reach the geocoder.
    GeocodeFailed(GeocodeError),

    /// A staged report location fell outside the pinned search region.
    CandidateOutsideRegion,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::LocationFallback(e) => {
                write!(f, "Could not get your location ({}); showing the default area", e)
            }
            Notice::QueryFailed(e) => {
                write!(f, "Could not load nearby reports ({}); tap to retry", e)
            }
            Notice::RateLimited => {
                write!(f, "Too many requests; please wait a moment")
            }
            Notice::AddressNotFound(q) => {
                write!(f, "No location found for \"{}\"", q)
            }
            Notice::GeocodeFailed(e) => {
                write!(f, "Address search failed ({})", e)
            }
            Notice::CandidateOutsideRegion => {
                write!(f, "Pick a spot inside the search circle")
            }
        }
    }
}

/// Rendering primitives implemented by the concrete map widget.
///
/// Implementations only draw; they never decide. All calls arrive from the
/// single engine task, so implementations need no internal locking.
///
/// # Implementors
///
/// - Platform adapters wrapping a real map widget (outside this crate)
/// - Recording doubles in tests
pub trait MapSurface: Send {
    /// Draw or update the single circular search overlay.
    fn set_region_overlay(&mut self, center: Coordinate, radius_m: u32);

    /// Replace the full marker set.
    fn replace_markers(&mut self, markers: &[MarkerSpec]);

    /// Replace the side-panel list.
    fn set_panel(&mut self, entries: &[PanelEntry]);

    /// Open the popup for a group and highlight its panel row.
    fn focus(&mut self, key: &str);

    /// Re-center the visible map without changing the search region.
    fn set_view_center(&mut self, center: Coordinate);

    /// Show a user-facing notification.
    fn show_notice(&mut self, notice: &Notice);

    /// Show a single item in full (detail view).
    fn show_item_detail(&mut self, item: &FeedItem);
}

/// Fingerprint of the last render, for idempotence.
#[derive(Debug, Clone, PartialEq)]
struct RenderedView {
    seq: RegionSeq,
    groups: Vec<(String, ItemId, usize)>,
}

/// Translates engine state into [`MapSurface`] primitives and map gestures
/// back into [`FeedEvent`]s.
pub struct MapSyncAdapter<S: MapSurface> {
    surface: S,
    events: mpsc::UnboundedSender<FeedEvent>,
    /// Marker positions by group key; display-derived, rebuilt per render.
    markers: HashMap<String, Coordinate>,
    rendered: Option<RenderedView>,
}

impl<S: MapSurface> std::fmt::Debug for MapSyncAdapter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSyncAdapter")
            .field("marker_count", &self.markers.len())
            .field("rendered_seq", &self.rendered.as_ref().map(|r| r.seq))
            .finish()
    }
}

impl<S: MapSurface> MapSyncAdapter<S> {
    /// Create an adapter over a surface, forwarding gestures to `events`.
    pub fn new(surface: S, events: mpsc::UnboundedSender<FeedEvent>) -> Self {
        Self {
            surface,
            events,
            markers: HashMap::new(),
            rendered: None,
        }
    }

    /// Render a region and its groups.
    ///
    /// Idempotent: a repeated call with the same region snapshot and group
    /// composition issues no surface calls. Groups whose representative has
    /// no usable coordinate get a panel row but no marker.
    pub fn render(&mut self, region: &SearchRegion, groups: &[ItemGroup]) {
        let fingerprint = RenderedView {
            seq: region.seq,
            groups: groups
                .iter()
                .map(|g| (g.key.clone(), g.representative().id, g.len()))
                .collect(),
        };
        if self.rendered.as_ref() == Some(&fingerprint) {
            debug!(seq = %region.seq, "Render skipped, view unchanged");
            return;
        }

        self.surface
            .set_region_overlay(region.center, region.radius_m);

        let markers: Vec<MarkerSpec> = groups
            .iter()
            .filter(|g| g.has_mappable_representative())
            .map(|g| {
                let rep = g.representative();
                MarkerSpec {
                    key: g.key.clone(),
                    position: rep.coordinate,
                    category: rep.category,
                    popup: rep.content.clone(),
                    member_count: g.len(),
                }
            })
            .collect();

        let dropped = groups.len() - markers.len();
        if dropped > 0 {
            warn!(dropped, "Groups without usable coordinates excluded from markers");
        }

        self.surface.replace_markers(&markers);
        self.markers = markers
            .iter()
            .map(|m| (m.key.clone(), m.position))
            .collect();

        let panel: Vec<PanelEntry> = groups
            .iter()
            .map(|g| {
                let rep = g.representative();
                PanelEntry {
                    key: g.key.clone(),
                    item_id: rep.id,
                    category: rep.category,
                    content: rep.content.clone(),
                    created_at: rep.created_at,
                    view_count: rep.view_count,
                    member_count: g.len(),
                    has_marker: self.markers.contains_key(&g.key),
                }
            })
            .collect();
        self.surface.set_panel(&panel);

        debug!(
            seq = %region.seq,
            markers = markers.len(),
            panel_rows = panel.len(),
            "Rendered map view"
        );
        self.rendered = Some(fingerprint);
    }

    /// Focus a group from either a marker click or a panel click.
    ///
    /// Both paths converge here: the popup opens, the panel row highlights,
    /// and - when the group has a marker - the map re-centers on it. Groups
    /// without a marker focus the panel row only.
    pub fn select_group(&mut self, key: &str) {
        if let Some(position) = self.markers.get(key).copied() {
            self.surface.set_view_center(position);
        }
        self.surface.focus(key);
    }

    /// Clear all markers and panel rows.
    ///
    /// Used on mode switches; the next render rebuilds from scratch.
    pub fn clear(&mut self) {
        self.surface.replace_markers(&[]);
        self.surface.set_panel(&[]);
        self.markers.clear();
        self.rendered = None;
    }

    /// Show a user-facing notification.
    pub fn notify(&mut self, notice: Notice) {
        self.surface.show_notice(&notice);
    }

    /// Show a single item in full.
    pub fn show_item_detail(&mut self, item: &FeedItem) {
        self.surface.show_item_detail(item);
    }

    /// Map drag settled at a new center. Forwarded, never applied locally.
    pub fn on_user_pan(&self, center: Coordinate) {
        let _ = self.events.send(FeedEvent::PanGesture(center));
    }

    /// Radius selector changed.
    pub fn on_user_radius_change(&self, radius_m: u32) {
        let _ = self.events.send(FeedEvent::SetRadius(radius_m));
    }

    /// Marker or panel row clicked.
    pub fn on_group_selected(&self, key: &str) {
        let _ = self.events.send(FeedEvent::SelectGroup(key.to_string()));
    }

    /// Bare map click. Meaningful in Contribute mode, where it stages the
    /// candidate report location; ignored by the engine otherwise.
    pub fn on_map_click(&self, position: Coordinate) {
        let _ = self.events.send(FeedEvent::StageCandidate(position));
    }

    /// Access the underlying surface (tests inspect recorded calls).
    pub fn surface(&self) -> &S {
        &self.surface
    }
}
