//! Reqwest-backed nearby-query service.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;

use crate::feed::{FeedItem, ItemId};

use super::{NearbyQuery, QueryError, QueryPage, QueryService};

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Production [`QueryService`] over HTTP.
///
/// Endpoints, relative to the configured base URL:
/// - `GET /posts/nearby?lat&lng&radius&page&size[&category][&days]`
/// - `GET /posts/{id}`
pub struct HttpQueryService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQueryService {
    /// Create a service against `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, QueryError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Create a service with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QueryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn map_status(status: StatusCode) -> Option<QueryError> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            Some(QueryError::RateLimited)
        } else if !status.is_success() {
            Some(QueryError::Status(status.as_u16()))
        } else {
            None
        }
    }
}

impl QueryService for HttpQueryService {
    fn query_nearby(&self, query: NearbyQuery) -> BoxFuture<'static, Result<QueryPage, QueryError>> {
        let url = format!("{}/posts/nearby", self.base_url);
        let mut request = self
            .client
            .get(&url)
            .query(&[
                ("lat", query.center.lat.to_string()),
                ("lng", query.center.lng.to_string()),
                ("radius", query.radius_m.to_string()),
                ("page", query.page.to_string()),
                ("size", query.page_size.to_string()),
            ]);

        if let Some(category) = query.filters.category {
            request = request.query(&[("category", category.as_str())]);
        }
        if let Some(days) = query.filters.days {
            request = request.query(&[("days", days.to_string())]);
        }

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| QueryError::Http(e.to_string()))?;

            if let Some(err) = Self::map_status(response.status()) {
                return Err(err);
            }

            response
                .json::<QueryPage>()
                .await
                .map_err(|e| QueryError::Decode(e.to_string()))
        })
    }

    fn item_detail(&self, id: ItemId) -> BoxFuture<'static, Result<FeedItem, QueryError>> {
        let url = format!("{}/posts/{}", self.base_url, id);
        let request = self.client.get(&url);

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| QueryError::Http(e.to_string()))?;

            if let Some(err) = Self::map_status(response.status()) {
                return Err(err);
            }

            response
                .json::<FeedItem>()
                .await
                .map_err(|e| QueryError::Decode(e.to_string()))
        })
    }
}
