//! External service seams.
//!
//! The backend that actually computes nearby results is an opaque external
//! collaborator. This module defines the trait boundaries the engine talks
//! through - nearby query, geocoding, device location - together with their
//! typed errors and the reqwest-backed implementations. Traits return boxed
//! futures so they stay object-safe and implementations can be swapped for
//! in-memory doubles in tests.

mod geocode;
mod http;
mod location;

pub use geocode::{GeocodeError, Geocoder, HttpGeocoder};
pub use http::{HttpQueryService, DEFAULT_HTTP_TIMEOUT_SECS};
pub use location::{
    FixedLocationSource, LocationError, LocationSource, UnavailableLocationSource,
    DEFAULT_LOCATION_TIMEOUT,
};

use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;

use crate::feed::{Category, FeedItem, ItemId};
use crate::geo::Coordinate;

/// Optional narrowing filters for a nearby query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    /// Restrict results to one category.
    pub category: Option<Category>,

    /// Restrict results to reports created within the last `days` days.
    pub days: Option<u32>,
}

/// Everything needed to request one page of nearby results.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    /// Center of the search circle.
    pub center: Coordinate,
    /// Radius of the search circle in meters.
    pub radius_m: u32,
    /// Narrowing filters.
    pub filters: QueryFilters,
    /// 1-indexed page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: usize,
}

/// One page of nearby results as returned by the service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    /// Items on this page, in the service's own order (typically recency).
    pub items: Vec<FeedItem>,

    /// Total page count reported by the service. Informational; the cursor
    /// freezes on short pages, not on this value.
    pub total_pages: u32,
}

/// Errors from the nearby-query service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Http(String),

    /// Non-success HTTP status other than 429.
    #[error("server returned HTTP {0}")]
    Status(u16),

    /// HTTP 429: too many requests within the window. Distinct from other
    /// failures - not retriable until the window passes.
    #[error("rate limited by the server")]
    RateLimited,

    /// Response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl QueryError {
    /// Whether an immediate user-triggered retry is sensible.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, QueryError::RateLimited)
    }
}

/// The nearby-results service the paginator fetches from.
///
/// Implementations must be idempotent for identical arguments within the
/// data's freshness window. `page` is 1-indexed.
///
/// # Implementors
///
/// - [`HttpQueryService`] - production implementation over reqwest
/// - In-memory doubles in unit and integration tests
pub trait QueryService: Send + Sync {
    /// Fetch one page of items near a point.
    fn query_nearby(&self, query: NearbyQuery) -> BoxFuture<'static, Result<QueryPage, QueryError>>;

    /// Fetch a single item in full.
    ///
    /// Records a view on the external system, which rate-limits this path;
    /// expect [`QueryError::RateLimited`] under rapid repeat views.
    fn item_detail(&self, id: ItemId) -> BoxFuture<'static, Result<FeedItem, QueryError>>;
}
