//! NearFeed - proximity feed synchronization for a map-centric community board.
//!
//! Users browse or contribute short-lived, location-tagged status reports
//! (parking, wait times, weather) near a point of interest. This crate is
//! the engine that keeps four things consistent under continuous input:
//! a bounded circular search region, a paginated server-backed result set,
//! spatial grouping of near-duplicate reports, and an interactive map view.
//!
//! The external pieces - the backend that computes nearby results, the map
//! widget, geocoding, device location - sit behind trait seams
//! ([`query::QueryService`], [`map::MapSurface`], [`query::Geocoder`],
//! [`query::LocationSource`]); the engine owns everything between them.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nearfeed::config::FeedConfig;
//! use nearfeed::query::HttpQueryService;
//! use nearfeed::sync::{FeedEvent, SyncEngine};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = FeedConfig::load("nearfeed.ini".as_ref())?;
//! let service = Arc::new(HttpQueryService::new(&config.query.base_url)?);
//! let (events, rx) = mpsc::unbounded_channel();
//!
//! let engine = SyncEngine::new(&config, surface, service, events.clone())?;
//! let shutdown = CancellationToken::new();
//! tokio::spawn(engine.run(rx, shutdown.clone()));
//!
//! // Wire user controls to the channel:
//! events.send(FeedEvent::SetRadius(1000))?;
//! ```

pub mod config;
pub mod feed;
pub mod geo;
pub mod map;
pub mod query;
pub mod sync;
pub mod telemetry;
pub mod viewport;

pub use config::FeedConfig;
pub use feed::{FeedItem, FeedPaginator, ItemGroup};
pub use geo::Coordinate;
pub use map::{MapSurface, MapSyncAdapter};
pub use query::QueryService;
pub use sync::{FeedEvent, SyncEngine};
pub use viewport::{Mode, SearchRegion, ViewportState};
