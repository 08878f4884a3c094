//! Device location input.
//!
//! The engine asks for a single-shot current position with a timeout and
//! never accepts cached or stale results; platform geolocation is adapted
//! behind the [`LocationSource`] trait.

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::geo::Coordinate;

/// Default single-shot position timeout.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the device location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user denied the position request.
    #[error("location permission denied")]
    Denied,

    /// No position provider is available.
    #[error("location unavailable")]
    Unavailable,

    /// No fix arrived within the timeout.
    #[error("location request timed out")]
    Timeout,
}

/// Single-shot current-position provider.
///
/// Implementations must return a fresh fix - never a cached position - or
/// fail within the given timeout.
///
/// # Implementors
///
/// - Platform adapters (outside this crate)
/// - [`FixedLocationSource`] - always reports one position
/// - [`UnavailableLocationSource`] - always fails
pub trait LocationSource: Send + Sync {
    /// Request the current position.
    fn current_position(
        &self,
        timeout: Duration,
    ) -> BoxFuture<'static, Result<Coordinate, LocationError>>;
}

/// Location source that always reports one fixed position.
///
/// Useful as a deterministic source in tests and kiosks pinned to a venue.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationSource {
    position: Coordinate,
}

impl FixedLocationSource {
    /// Create a source that always reports `position`.
    pub fn new(position: Coordinate) -> Self {
        Self { position }
    }
}

impl LocationSource for FixedLocationSource {
    fn current_position(
        &self,
        _timeout: Duration,
    ) -> BoxFuture<'static, Result<Coordinate, LocationError>> {
        let position = self.position;
        Box::pin(async move { Ok(position) })
    }
}

/// Location source that always fails.
///
/// Useful for testing the fallback-to-default-region path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocationSource;

impl LocationSource for UnavailableLocationSource {
    fn current_position(
        &self,
        _timeout: Duration,
    ) -> BoxFuture<'static, Result<Coordinate, LocationError>> {
        Box::pin(async move { Err(LocationError::Unavailable) })
    }
}
