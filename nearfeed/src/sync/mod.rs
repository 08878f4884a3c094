//! Proximity feed synchronization engine.
//!
//! `SyncEngine` ties the viewport, paginator, grouper, and map adapter
//! together under a single event-driven task. All state transitions run on
//! that task, triggered by discrete [`FeedEvent`]s; network calls are
//! spawned and their completions return to the task as messages, filtered
//! through the paginator's stale-response guard. Nothing blocks the loop.
//!
//! # Architecture
//!
//! ```text
//!  gestures/controls ──► FeedEvent channel ──► SyncEngine (one task)
//!                                               │  ViewportState
//!                                               │  FeedPaginator ◄── fetch
//!                                               │  ResultGrouper     completions
//!                                               ▼
//!                                          MapSyncAdapter ──► MapSurface
//! ```
//!
//! # Ordering
//!
//! Region changes are totally ordered by the viewport's sequence id. Fetch
//! completions are applied in arrival order but discarded when their ticket
//! no longer matches the active sequence, so the effective order always
//! follows the most recent region regardless of network arrival order.

mod debounce;

pub use debounce::{PanDebouncer, DEFAULT_DEBOUNCE_WINDOW};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::feed::{
    group_items, FeedItem, FeedPaginator, FetchTicket, ItemId, PageOutcome,
};
use crate::geo::Coordinate;
use crate::map::{MapSurface, MapSyncAdapter, Notice};
use crate::query::{
    GeocodeError, Geocoder, LocationError, LocationSource, NearbyQuery, QueryError, QueryFilters,
    QueryPage, QueryService,
};
use crate::viewport::{Mode, ModeChange, ModeController, SearchRegion, ViewportError, ViewportState};

/// External inputs to the engine.
///
/// Gestures from the map surface and abstracted user controls both arrive
/// through this vocabulary; the engine is the only consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Map drag moved the view. Debounced; only the settled position
    /// commits a region change.
    PanGesture(Coordinate),

    /// Radius selector changed. Commits immediately.
    SetRadius(u32),

    /// Category / time-window filters changed. Resets the feed in place.
    SetFilters(QueryFilters),

    /// Refresh-in-place: re-fetch the current region.
    Refresh,

    /// Infinite-scroll trigger: fetch the next page.
    LoadMore,

    /// Recenter on the device position.
    LocateMe,

    /// Free-text address search.
    SearchAddress(String),

    /// Switch to Contribute mode.
    EnterContribute,

    /// Switch back to Browse mode.
    ExitContribute,

    /// Bare map click; stages the report location while contributing.
    StageCandidate(Coordinate),

    /// Marker or panel row clicked.
    SelectGroup(String),

    /// Open one item in full (records a view upstream).
    OpenItem(ItemId),
}

/// Completions of spawned external calls, fed back into the engine task.
#[derive(Debug)]
enum Completion {
    Fetch {
        ticket: FetchTicket,
        outcome: Result<QueryPage, QueryError>,
    },
    Located(Result<Coordinate, LocationError>),
    Geocoded {
        query: String,
        result: Result<Coordinate, GeocodeError>,
    },
    Detail {
        id: ItemId,
        outcome: Result<FeedItem, QueryError>,
    },
}

/// The synchronization engine.
///
/// Owns every component and all mutable state; runs as a single task via
/// [`SyncEngine::run`]. Collaborator seams are wired with `with_*` setters.
pub struct SyncEngine<S: MapSurface> {
    viewport: ViewportState,
    mode: ModeController,
    paginator: FeedPaginator,
    adapter: MapSyncAdapter<S>,
    query: Arc<dyn QueryService>,
    geocoder: Option<Arc<dyn Geocoder>>,
    location: Option<Arc<dyn LocationSource>>,
    filters: QueryFilters,
    debouncer: PanDebouncer,
    group_precision: usize,
    default_center: Coordinate,
    location_timeout: std::time::Duration,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: Option<mpsc::UnboundedReceiver<Completion>>,
}

impl<S: MapSurface> std::fmt::Debug for SyncEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("mode", &self.viewport.mode())
            .field("region_seq", &self.viewport.region().seq)
            .field("items", &self.paginator.items().len())
            .field("loading", &self.paginator.is_loading())
            .field("has_geocoder", &self.geocoder.is_some())
            .field("has_location", &self.location.is_some())
            .finish()
    }
}

impl<S: MapSurface> SyncEngine<S> {
    /// Create an engine over a surface and query service.
    ///
    /// `events` is the sender half of the channel later passed to
    /// [`SyncEngine::run`]; the map adapter uses it to forward gestures.
    ///
    /// # Errors
    ///
    /// Rejects a configuration whose default region is invalid.
    pub fn new(
        config: &FeedConfig,
        surface: S,
        query: Arc<dyn QueryService>,
        events: mpsc::UnboundedSender<FeedEvent>,
    ) -> Result<Self, ViewportError> {
        let viewport = ViewportState::new(config.default_center, config.default_radius_m)?;
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Ok(Self {
            viewport,
            mode: ModeController::new(),
            paginator: FeedPaginator::new(config.page_size),
            adapter: MapSyncAdapter::new(surface, events),
            query,
            geocoder: None,
            location: None,
            filters: QueryFilters::default(),
            debouncer: PanDebouncer::new(config.debounce_window),
            group_precision: config.group_precision,
            default_center: config.default_center,
            location_timeout: config.geolocation_timeout,
            completions_tx,
            completions_rx: Some(completions_rx),
        })
    }

    /// Set the geocoding collaborator for address search.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Set the device location source for recenter-to-my-location.
    pub fn with_location_source(mut self, source: Arc<dyn LocationSource>) -> Self {
        self.location = Some(source);
        self
    }

    /// Run the engine until `shutdown` fires or the event channel closes.
    ///
    /// Issues the initial load for the configured default region, then
    /// processes events, fetch completions, and debounce settling on one
    /// task.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<FeedEvent>, shutdown: CancellationToken) {
        let mut completions = match self.completions_rx.take() {
            Some(rx) => rx,
            None => {
                warn!("Engine completion channel already consumed");
                return;
            }
        };

        info!(region = %self.viewport.region().seq, "Feed sync engine started");
        let region = self.viewport.region();
        self.start_reset(region);

        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                _ = shutdown.cancelled() => break,
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                Some(completion) = completions.recv() => self.handle_completion(completion),
                _ = sleep_until(deadline), if deadline.is_some() => {
                    let now = tokio::time::Instant::now().into_std();
                    if let Some(center) = self.debouncer.take_settled(now) {
                        debug!(center = %center, "Pan settled");
                        self.commit_center(center);
                    }
                }
            }
        }

        info!("Feed sync engine stopped");
    }

    fn handle_event(&mut self, event: FeedEvent) {
        match event {
            FeedEvent::PanGesture(center) => {
                if self.viewport.mode() == Mode::Contribute {
                    debug!("Viewport pinned, dropping pan gesture");
                    return;
                }
                if !center.is_valid() {
                    warn!(lat = center.lat, lng = center.lng, "Dropping malformed pan gesture");
                    return;
                }
                let now = tokio::time::Instant::now().into_std();
                self.debouncer.record_pan(center, now);
            }

            FeedEvent::SetRadius(radius_m) => {
                if self.viewport.mode() == Mode::Contribute {
                    debug!("Viewport pinned, dropping radius change");
                    return;
                }
                match self.viewport.set_radius(radius_m) {
                    Ok(Some(region)) => self.start_reset(region),
                    Ok(None) => {}
                    Err(error) => warn!(error = %error, "Rejected radius change"),
                }
            }

            FeedEvent::SetFilters(filters) => {
                if self.viewport.mode() == Mode::Contribute {
                    debug!("Filter controls disabled while contributing");
                    return;
                }
                self.filters = filters;
                let region = self.viewport.refresh_region();
                self.start_reset(region);
            }

            FeedEvent::Refresh => {
                if self.viewport.mode() == Mode::Contribute {
                    return;
                }
                let region = self.viewport.refresh_region();
                self.start_reset(region);
            }

            FeedEvent::LoadMore => {
                if self.viewport.mode() == Mode::Contribute {
                    return;
                }
                match self.paginator.begin_load_more() {
                    Some(ticket) => self.spawn_fetch(ticket),
                    None => debug!("Load-more suppressed (loading or exhausted)"),
                }
            }

            FeedEvent::LocateMe => {
                if self.viewport.mode() == Mode::Contribute {
                    return;
                }
                match &self.location {
                    Some(source) => {
                        let fut = source.current_position(self.location_timeout);
                        let tx = self.completions_tx.clone();
                        tokio::spawn(async move {
                            let _ = tx.send(Completion::Located(fut.await));
                        });
                    }
                    None => self.apply_location(Err(LocationError::Unavailable)),
                }
            }

            FeedEvent::SearchAddress(query) => {
                if self.viewport.mode() == Mode::Contribute {
                    return;
                }
                match &self.geocoder {
                    Some(geocoder) => {
                        let fut = geocoder.resolve(&query);
                        let tx = self.completions_tx.clone();
                        tokio::spawn(async move {
                            let _ = tx.send(Completion::Geocoded {
                                query,
                                result: fut.await,
                            });
                        });
                    }
                    None => {
                        warn!("No geocoder configured, dropping address search");
                        self.adapter.notify(Notice::AddressNotFound(query));
                    }
                }
            }

            FeedEvent::EnterContribute => {
                if let ModeChange::Entered { anchor } = self.mode.enter_contribute(&mut self.viewport)
                {
                    // Browse markers and the item list go together; any
                    // in-flight fetch becomes stale via the abandoned region.
                    self.debouncer.cancel();
                    self.paginator.abandon();
                    self.adapter.clear();
                    info!(anchor = %anchor, "Entered contribute mode");
                }
            }

            FeedEvent::ExitContribute => {
                if let ModeChange::Exited { reload } = self.mode.exit_contribute(&mut self.viewport)
                {
                    info!(seq = %reload.seq, "Exited contribute mode, reloading");
                    self.start_reset(reload);
                }
            }

            FeedEvent::StageCandidate(position) => {
                if self.viewport.mode() != Mode::Contribute {
                    debug!("Ignoring map click outside contribute mode");
                    return;
                }
                let region = self.viewport.region();
                if !region.contains(position) {
                    self.adapter.notify(Notice::CandidateOutsideRegion);
                    return;
                }
                self.mode.stage_candidate(position);
                debug!(position = %position, "Staged candidate report location");
            }

            FeedEvent::SelectGroup(key) => self.adapter.select_group(&key),

            FeedEvent::OpenItem(id) => {
                let fut = self.query.item_detail(id);
                let tx = self.completions_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(Completion::Detail {
                        id,
                        outcome: fut.await,
                    });
                });
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Fetch { ticket, outcome } => {
                match self.paginator.complete(ticket, outcome) {
                    PageOutcome::Applied { appended, has_more } => {
                        info!(
                            seq = %ticket.seq,
                            appended,
                            has_more,
                            total = self.paginator.items().len(),
                            "Applied feed page"
                        );
                        self.render();
                    }
                    PageOutcome::Stale => {
                        debug!(seq = %ticket.seq, "Dropped stale feed page");
                    }
                    PageOutcome::Failed(error) => {
                        warn!(seq = %ticket.seq, error = %error, "Feed fetch failed");
                        let notice = match error {
                            QueryError::RateLimited => Notice::RateLimited,
                            other => Notice::QueryFailed(other),
                        };
                        self.adapter.notify(notice);
                    }
                }
            }

            Completion::Located(result) => self.apply_location(result),

            Completion::Geocoded { query, result } => match result {
                Ok(center) => self.commit_center(center),
                Err(GeocodeError::NotFound(_)) => {
                    info!(query = %query, "Address not found, keeping current region");
                    self.adapter.notify(Notice::AddressNotFound(query));
                }
                Err(error) => {
                    warn!(query = %query, error = %error, "Geocoding failed");
                    self.adapter.notify(Notice::GeocodeFailed(error));
                }
            },

            Completion::Detail { id, outcome } => match outcome {
                Ok(item) => self.adapter.show_item_detail(&item),
                Err(QueryError::RateLimited) => {
                    warn!(item = %id, "Detail fetch rate limited");
                    self.adapter.notify(Notice::RateLimited);
                }
                Err(error) => {
                    warn!(item = %id, error = %error, "Detail fetch failed");
                    self.adapter.notify(Notice::QueryFailed(error));
                }
            },
        }
    }

    /// Apply a geolocation result: recenter on success, fall back to the
    /// configured default region on failure.
    fn apply_location(&mut self, result: Result<Coordinate, LocationError>) {
        match result {
            Ok(center) => self.commit_center(center),
            Err(error) => {
                warn!(error = %error, "Geolocation failed, using default region");
                self.adapter.notify(Notice::LocationFallback(error));
                self.commit_center(self.default_center);
            }
        }
    }

    /// Commit a new center and reload, unless the viewport rejects it.
    fn commit_center(&mut self, center: Coordinate) {
        match self.viewport.set_center(center) {
            Ok(Some(region)) => self.start_reset(region),
            Ok(None) => debug!("Viewport pinned, center change ignored"),
            Err(error) => warn!(error = %error, "Rejected center change"),
        }
    }

    fn start_reset(&mut self, region: SearchRegion) {
        let ticket = self.paginator.begin_reset(region, self.filters.clone());
        self.spawn_fetch(ticket);
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let region = match self.paginator.active_region() {
            Some(region) => region,
            None => return,
        };
        let query = NearbyQuery {
            center: region.center,
            radius_m: region.radius_m,
            filters: self.paginator.filters().clone(),
            page: ticket.page,
            page_size: ticket.page_size,
        };
        debug!(seq = %ticket.seq, page = ticket.page, "Dispatching nearby query");

        let fut = self.query.query_nearby(query);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Completion::Fetch {
                ticket,
                outcome: fut.await,
            });
        });
    }

    /// Regroup the accumulated items and push them to the surface.
    fn render(&mut self) {
        let region = match self.paginator.active_region() {
            Some(region) => region,
            None => return,
        };
        let groups = group_items(self.paginator.items(), self.group_precision);
        self.adapter.render(&region, &groups);
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Category;
    use crate::map::{MarkerSpec, PanelEntry};
    use chrono::{TimeZone, Utc};
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    // ------------------------------------------------------------------
    // Doubles
    // ------------------------------------------------------------------

    /// Surface that records calls into shared state.
    #[derive(Default)]
    struct TestSurface {
        markers: Arc<Mutex<Vec<Vec<MarkerSpec>>>>,
        notices: Arc<Mutex<Vec<Notice>>>,
    }

    impl MapSurface for TestSurface {
        fn set_region_overlay(&mut self, _center: Coordinate, _radius_m: u32) {}
        fn replace_markers(&mut self, markers: &[MarkerSpec]) {
            self.markers.lock().unwrap().push(markers.to_vec());
        }
        fn set_panel(&mut self, _entries: &[PanelEntry]) {}
        fn focus(&mut self, _key: &str) {}
        fn set_view_center(&mut self, _center: Coordinate) {}
        fn show_notice(&mut self, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
        fn show_item_detail(&mut self, _item: &FeedItem) {}
    }

    /// Query service answering from a script, recording every call.
    struct ScriptedService {
        calls: Arc<Mutex<Vec<NearbyQuery>>>,
        script: Mutex<Vec<Result<QueryPage, QueryError>>>,
    }

    impl ScriptedService {
        fn new(script: Vec<Result<QueryPage, QueryError>>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                script: Mutex::new(script),
            }
        }
    }

    impl QueryService for ScriptedService {
        fn query_nearby(
            &self,
            query: NearbyQuery,
        ) -> BoxFuture<'static, Result<QueryPage, QueryError>> {
            self.calls.lock().unwrap().push(query);
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.is_empty() {
                    Ok(QueryPage {
                        items: Vec::new(),
                        total_pages: 1,
                    })
                } else {
                    script.remove(0)
                }
            };
            Box::pin(async move { next })
        }

        fn item_detail(&self, _id: ItemId) -> BoxFuture<'static, Result<FeedItem, QueryError>> {
            Box::pin(async move { Err(QueryError::RateLimited) })
        }
    }

    fn make_item(id: u64) -> FeedItem {
        FeedItem {
            id: ItemId(id),
            coordinate: Coordinate::new_unchecked(37.5665, 126.9780),
            category: Category::Parking,
            content: format!("report {}", id),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            view_count: 0,
            author: None,
            address: None,
        }
    }

    fn full_page(start: u64, size: usize) -> QueryPage {
        QueryPage {
            items: (start..start + size as u64).map(make_item).collect(),
            total_pages: 10,
        }
    }

    fn make_engine(
        script: Vec<Result<QueryPage, QueryError>>,
    ) -> (
        SyncEngine<TestSurface>,
        Arc<Mutex<Vec<NearbyQuery>>>,
        Arc<Mutex<Vec<Notice>>>,
    ) {
        let surface = TestSurface::default();
        let notices = Arc::clone(&surface.notices);
        let service = Arc::new(ScriptedService::new(script));
        let calls = Arc::clone(&service.calls);
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = SyncEngine::new(&FeedConfig::default(), surface, service, tx).unwrap();
        (engine, calls, notices)
    }

    /// Drain every completion the spawned fetch tasks produced so far.
    async fn drain_completions(engine: &mut SyncEngine<TestSurface>) {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        let mut rx = engine.completions_rx.take().unwrap();
        while let Ok(completion) = rx.try_recv() {
            engine.handle_completion(completion);
        }
        engine.completions_rx = Some(rx);
    }

    // ------------------------------------------------------------------
    // Reducer tests (no run loop)
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_refresh_fetches_current_region() {
        let (mut engine, calls, _) = make_engine(vec![Ok(full_page(0, 10))]);

        engine.handle_event(FeedEvent::Refresh);
        drain_completions(&mut engine).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].page, 1);
        assert_eq!(calls[0].center, engine.viewport.region().center);
    }

    #[tokio::test]
    async fn test_load_more_requests_next_page() {
        let (mut engine, calls, _) =
            make_engine(vec![Ok(full_page(0, 10)), Ok(full_page(10, 10))]);

        engine.handle_event(FeedEvent::Refresh);
        drain_completions(&mut engine).await;
        engine.handle_event(FeedEvent::LoadMore);
        drain_completions(&mut engine).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].page, 2);
        assert_eq!(engine.paginator.items().len(), 20);
    }

    #[tokio::test]
    async fn test_exhausted_feed_load_more_is_noop() {
        let (mut engine, calls, _) = make_engine(vec![Ok(QueryPage {
            items: (0..7).map(make_item).collect(),
            total_pages: 1,
        })]);

        engine.handle_event(FeedEvent::Refresh);
        drain_completions(&mut engine).await;
        assert!(!engine.paginator.cursor().has_more);

        engine.handle_event(FeedEvent::LoadMore);
        drain_completions(&mut engine).await;

        // No second network call recorded.
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_contribute_mode_gates_fetch_events() {
        let (mut engine, calls, _) = make_engine(vec![Ok(full_page(0, 10))]);

        engine.handle_event(FeedEvent::Refresh);
        drain_completions(&mut engine).await;

        engine.handle_event(FeedEvent::EnterContribute);
        let seq_before = engine.viewport.region().seq;

        engine.handle_event(FeedEvent::PanGesture(
            Coordinate::new(37.6, 127.1).unwrap(),
        ));
        engine.handle_event(FeedEvent::SetRadius(2000));
        engine.handle_event(FeedEvent::Refresh);
        engine.handle_event(FeedEvent::LoadMore);
        engine.handle_event(FeedEvent::SetFilters(QueryFilters {
            category: Some(Category::Weather),
            days: None,
        }));
        drain_completions(&mut engine).await;

        // Nothing moved, nothing fetched.
        assert_eq!(engine.viewport.region().seq, seq_before);
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert!(!engine.debouncer.is_pending());
    }

    #[tokio::test]
    async fn test_mode_roundtrip_clears_then_reloads() {
        let (mut engine, calls, _) =
            make_engine(vec![Ok(full_page(0, 10)), Ok(full_page(50, 5))]);

        engine.handle_event(FeedEvent::Refresh);
        drain_completions(&mut engine).await;
        assert_eq!(engine.paginator.items().len(), 10);

        engine.handle_event(FeedEvent::EnterContribute);
        assert!(engine.paginator.items().is_empty());

        engine.handle_event(FeedEvent::ExitContribute);
        drain_completions(&mut engine).await;

        assert_eq!(calls.lock().unwrap().len(), 2);
        assert_eq!(engine.paginator.items().len(), 5);
        assert_eq!(engine.viewport.mode(), Mode::Browse);
    }

    #[tokio::test]
    async fn test_stage_candidate_inside_region() {
        let (mut engine, _, notices) = make_engine(vec![]);

        engine.handle_event(FeedEvent::EnterContribute);
        // ~50 m from the pinned anchor: inside the 500 m default radius.
        let inside = Coordinate::new(37.5669, 126.9780).unwrap();
        engine.handle_event(FeedEvent::StageCandidate(inside));

        assert_eq!(engine.mode.staged_candidate(), Some(inside));
        assert!(notices.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stage_candidate_outside_region_notifies() {
        let (mut engine, _, notices) = make_engine(vec![]);

        engine.handle_event(FeedEvent::EnterContribute);
        // ~5.5 km away: outside the 500 m default radius.
        let outside = Coordinate::new(37.6165, 126.9780).unwrap();
        engine.handle_event(FeedEvent::StageCandidate(outside));

        assert_eq!(engine.mode.staged_candidate(), None);
        assert_eq!(
            notices.lock().unwrap().as_slice(),
            &[Notice::CandidateOutsideRegion]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_preserves_items_and_notifies() {
        let (mut engine, _, notices) = make_engine(vec![
            Ok(full_page(0, 10)),
            Err(QueryError::Status(503)),
        ]);

        engine.handle_event(FeedEvent::Refresh);
        drain_completions(&mut engine).await;
        engine.handle_event(FeedEvent::LoadMore);
        drain_completions(&mut engine).await;

        assert_eq!(engine.paginator.items().len(), 10);
        assert_eq!(engine.paginator.cursor().page_number, 2);
        assert!(matches!(
            notices.lock().unwrap().as_slice(),
            [Notice::QueryFailed(QueryError::Status(503))]
        ));
    }

    #[tokio::test]
    async fn test_detail_rate_limit_is_distinct_notice() {
        let (mut engine, _, notices) = make_engine(vec![]);

        engine.handle_event(FeedEvent::OpenItem(ItemId(7)));
        drain_completions(&mut engine).await;

        assert_eq!(notices.lock().unwrap().as_slice(), &[Notice::RateLimited]);
    }

    #[tokio::test]
    async fn test_locate_without_source_falls_back_to_default() {
        let (mut engine, calls, notices) = make_engine(vec![Ok(full_page(0, 10))]);
        let default_center = engine.default_center;

        engine.handle_event(FeedEvent::LocateMe);
        drain_completions(&mut engine).await;

        assert!(matches!(
            notices.lock().unwrap().as_slice(),
            [Notice::LocationFallback(LocationError::Unavailable)]
        ));
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].center, default_center);
    }

    #[tokio::test]
    async fn test_filters_flow_into_query() {
        let (mut engine, calls, _) = make_engine(vec![Ok(full_page(0, 10))]);
        let filters = QueryFilters {
            category: Some(Category::Parking),
            days: Some(7),
        };

        engine.handle_event(FeedEvent::SetFilters(filters.clone()));
        drain_completions(&mut engine).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filters, filters);
    }
}
