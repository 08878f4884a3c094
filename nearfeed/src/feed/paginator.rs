//! Feed pagination with stale-response suppression.
//!
//! The paginator is a synchronous state machine around a ticket protocol:
//! the driver asks it to begin a reset or a load-more, receives a
//! [`FetchTicket`] describing the request to perform, does the I/O, and
//! hands the outcome back through [`FeedPaginator::complete`]. Keeping the
//! state transitions synchronous makes the stale-response guard and the
//! pagination invariants testable without a network or a runtime.
//!
//! # Invariants
//!
//! - At most one ticket is in flight per paginator instance.
//! - `page_number` only increases, and only after a successful, non-stale
//!   completion.
//! - A completion whose region sequence no longer matches the active one is
//!   discarded without touching any state.
//! - A failed completion clears `loading` but leaves the cursor and the
//!   accumulated items exactly as they were.

use tracing::debug;

use crate::feed::item::FeedItem;
use crate::query::{QueryError, QueryFilters, QueryPage};
use crate::viewport::{RegionSeq, SearchRegion};

/// Default page size requested from the query service.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Position in the paginated result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// Next page to request, 1-indexed.
    pub page_number: u32,

    /// Whether the service may have further pages. Frozen to `false` once a
    /// short page is returned; only a reset thaws it.
    pub has_more: bool,
}

impl PageCursor {
    /// Cursor state at the start of a fresh region.
    fn first() -> Self {
        Self {
            page_number: 1,
            has_more: true,
        }
    }
}

/// Description of the fetch the driver must perform for the paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// Region snapshot the request belongs to. Completions are matched
    /// against the active sequence with this.
    pub seq: RegionSeq,

    /// 1-indexed page to request.
    pub page: u32,

    /// Page size to request.
    pub page_size: usize,
}

/// Result of applying a fetch completion.
#[derive(Debug)]
pub enum PageOutcome {
    /// The page was appended to the item list.
    Applied {
        /// Items appended by this page.
        appended: usize,
        /// Cursor state after the append.
        has_more: bool,
    },

    /// The response belonged to a superseded region (or arrived with no
    /// request outstanding) and was discarded without state changes.
    Stale,

    /// The fetch for the current region failed; cursor and items are
    /// untouched and the error is surfaced for a retry affordance.
    Failed(QueryError),
}

/// Tracks the page cursor and accumulated items for the current region.
#[derive(Debug)]
pub struct FeedPaginator {
    cursor: PageCursor,
    items: Vec<FeedItem>,
    region: Option<SearchRegion>,
    filters: QueryFilters,
    loading: bool,
    page_size: usize,
}

impl FeedPaginator {
    /// Create a paginator requesting `page_size` items per page.
    pub fn new(page_size: usize) -> Self {
        Self {
            cursor: PageCursor::first(),
            items: Vec::new(),
            region: None,
            filters: QueryFilters::default(),
            loading: false,
            page_size,
        }
    }

    /// Create a paginator with the default page size.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }

    /// Items accumulated for the current region, in service order.
    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    /// Current cursor state.
    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Whether a fetch is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The region the accumulated items belong to.
    pub fn active_region(&self) -> Option<SearchRegion> {
        self.region
    }

    /// Filters applied to the current region's fetches.
    pub fn filters(&self) -> &QueryFilters {
        &self.filters
    }

    /// Start over for a new region: clear items, rewind the cursor, and
    /// return the ticket for page 1.
    ///
    /// Any fetch already in flight is logically superseded - its completion
    /// will no longer match the active sequence and will be discarded. No
    /// transport-level cancellation is required.
    pub fn begin_reset(&mut self, region: SearchRegion, filters: QueryFilters) -> FetchTicket {
        self.items.clear();
        self.cursor = PageCursor::first();
        self.region = Some(region);
        self.filters = filters;
        self.loading = true;

        debug!(seq = %region.seq, "Paginator reset");
        FetchTicket {
            seq: region.seq,
            page: 1,
            page_size: self.page_size,
        }
    }

    /// Request the next page of the current region.
    ///
    /// Returns `None` - guaranteed no fetch - while a request is in flight,
    /// after the cursor froze, or before any region was loaded.
    pub fn begin_load_more(&mut self) -> Option<FetchTicket> {
        if self.loading || !self.cursor.has_more {
            return None;
        }
        let region = self.region?;

        self.loading = true;
        Some(FetchTicket {
            seq: region.seq,
            page: self.cursor.page_number,
            page_size: self.page_size,
        })
    }

    /// Apply a fetch completion.
    ///
    /// Stale completions (ticket sequence no longer active, or nothing
    /// outstanding) are discarded without touching any state - including the
    /// `loading` flag, which belongs to the superseding request.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<QueryPage, QueryError>,
    ) -> PageOutcome {
        let active = match self.region {
            Some(region) => region.seq,
            None => return PageOutcome::Stale,
        };
        if ticket.seq != active || !self.loading {
            debug!(ticket = %ticket.seq, active = %active, "Discarding stale response");
            return PageOutcome::Stale;
        }

        match outcome {
            Ok(page) => {
                let appended = page.items.len();
                let has_more = appended == self.page_size;
                self.items.extend(page.items);
                self.cursor.page_number += 1;
                self.cursor.has_more = has_more;
                self.loading = false;
                PageOutcome::Applied { appended, has_more }
            }
            Err(error) => {
                self.loading = false;
                PageOutcome::Failed(error)
            }
        }
    }

    /// Abandon the current region without loading another.
    ///
    /// Used when entering Contribute mode: the item list is dropped along
    /// with the cleared markers, and any in-flight completion becomes stale.
    pub fn abandon(&mut self) {
        self.items.clear();
        self.cursor = PageCursor::first();
        self.region = None;
        self.loading = false;
    }
}
