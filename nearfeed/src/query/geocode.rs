//! Address search via an external geocoding collaborator.

use futures::future::BoxFuture;
use serde::Deserialize;
use thiserror::Error;

use crate::geo::Coordinate;

use super::QueryError;

/// Errors from address resolution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// The query matched no location. The previous region stays
    /// authoritative; this is not a failure of the service.
    #[error("no location found for {0:?}")]
    NotFound(String),

    /// Transport or server failure.
    #[error("geocoding failed: {0}")]
    Http(String),

    /// Response body did not match the expected shape.
    #[error("failed to decode geocode response: {0}")]
    Decode(String),
}

/// Resolves free-text address queries to coordinates.
///
/// # Implementors
///
/// - [`HttpGeocoder`] - production implementation over reqwest
/// - In-memory doubles in tests
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text query to a coordinate.
    fn resolve(&self, query: &str) -> BoxFuture<'static, Result<Coordinate, GeocodeError>>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    lat: f64,
    lng: f64,
}

/// Production [`Geocoder`] over HTTP.
///
/// Endpoint, relative to the configured base URL:
/// `GET /geocode?q=<query>` → `{"lat": .., "lng": ..}` or 404.
pub struct HttpGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGeocoder {
    /// Create a geocoder against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                super::http::DEFAULT_HTTP_TIMEOUT_SECS,
            ))
            .build()
            .map_err(|e| QueryError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl Geocoder for HttpGeocoder {
    fn resolve(&self, query: &str) -> BoxFuture<'static, Result<Coordinate, GeocodeError>> {
        let url = format!("{}/geocode", self.base_url);
        let query_text = query.to_string();
        let request = self.client.get(&url).query(&[("q", query_text.as_str())]);

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| GeocodeError::Http(e.to_string()))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(GeocodeError::NotFound(query_text));
            }
            if !response.status().is_success() {
                return Err(GeocodeError::Http(format!(
                    "HTTP {}",
                    response.status()
                )));
            }

            let body: GeocodeResponse = response
                .json()
                .await
                .map_err(|e| GeocodeError::Decode(e.to_string()))?;

            Coordinate::new(body.lat, body.lng)
                .map_err(|e| GeocodeError::Decode(e.to_string()))
        })
    }
}
