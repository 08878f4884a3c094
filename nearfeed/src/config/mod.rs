//! Engine configuration.
//!
//! `FeedConfig` combines everything needed to construct the engine: feed
//! behavior (page size, grouping precision, debounce window), the default
//! region used at startup and as the geolocation fallback, and the query
//! service endpoint. Values load from an INI file with sensible defaults
//! for anything absent.

use std::path::Path;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::feed::DEFAULT_PAGE_SIZE;
use crate::geo::{Coordinate, DEFAULT_BUCKET_PRECISION};
use crate::query::DEFAULT_LOCATION_TIMEOUT;
use crate::sync::DEFAULT_DEBOUNCE_WINDOW;

/// Default search radius in meters.
pub const DEFAULT_RADIUS_M: u32 = 500;

/// Radius choices offered by the selector control, in meters.
pub const DEFAULT_RADIUS_CHOICES_M: &[u32] = &[300, 500, 1000, 2000];

/// Default region center: Seoul City Hall.
///
/// Used at startup before any recenter and as the fallback when
/// geolocation is denied or unavailable.
const DEFAULT_CENTER_LAT: f64 = 37.5665;
const DEFAULT_CENTER_LNG: f64 = 126.9780;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read or parsed as INI.
    #[error("failed to read config file: {0}")]
    Read(String),

    /// A key holds a value of the wrong shape.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Offending `section.key`.
        key: String,
        /// Raw value as found in the file.
        value: String,
    },
}

/// Query service endpoint configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Base URL of the feed service.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_secs: crate::query::DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Items requested per page.
    pub page_size: usize,

    /// Decimal digits for marker grouping.
    pub group_precision: usize,

    /// Pan-gesture settle window.
    pub debounce_window: Duration,

    /// Region used at startup and as the geolocation fallback.
    pub default_center: Coordinate,

    /// Radius of the default region in meters.
    pub default_radius_m: u32,

    /// Radius choices offered to the user, in meters.
    pub radius_choices_m: Vec<u32>,

    /// Timeout for the single-shot device position request.
    pub geolocation_timeout: Duration,

    /// Query service endpoint.
    pub query: QueryConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            group_precision: DEFAULT_BUCKET_PRECISION,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            // Both components are compile-time constants inside valid range.
            default_center: Coordinate::new_unchecked(DEFAULT_CENTER_LAT, DEFAULT_CENTER_LNG),
            default_radius_m: DEFAULT_RADIUS_M,
            radius_choices_m: DEFAULT_RADIUS_CHOICES_M.to_vec(),
            geolocation_timeout: DEFAULT_LOCATION_TIMEOUT,
            query: QueryConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Load configuration from an INI file.
    ///
    /// A missing file yields the defaults; a present-but-malformed file is
    /// an error. Recognized keys:
    ///
    /// ```ini
    /// [feed]
    /// page_size = 10
    /// group_precision = 5
    /// debounce_ms = 300
    /// default_lat = 37.5665
    /// default_lng = 126.9780
    /// default_radius_m = 500
    /// radius_choices_m = 300,500,1000,2000
    /// geolocation_timeout_secs = 10
    ///
    /// [query]
    /// base_url = https://feed.example.com/api
    /// timeout_secs = 30
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        let mut config = Self::default();

        if let Some(feed) = ini.section(Some("feed")) {
            if let Some(raw) = feed.get("page_size") {
                config.page_size = parse_value("feed.page_size", raw)?;
            }
            if let Some(raw) = feed.get("group_precision") {
                config.group_precision = parse_value("feed.group_precision", raw)?;
            }
            if let Some(raw) = feed.get("debounce_ms") {
                let ms: u64 = parse_value("feed.debounce_ms", raw)?;
                config.debounce_window = Duration::from_millis(ms);
            }
            let lat = match feed.get("default_lat") {
                Some(raw) => parse_value("feed.default_lat", raw)?,
                None => config.default_center.lat,
            };
            let lng = match feed.get("default_lng") {
                Some(raw) => parse_value("feed.default_lng", raw)?,
                None => config.default_center.lng,
            };
            config.default_center =
                Coordinate::new(lat, lng).map_err(|_| ConfigError::InvalidValue {
                    key: "feed.default_lat/default_lng".to_string(),
                    value: format!("{}, {}", lat, lng),
                })?;
            if let Some(raw) = feed.get("default_radius_m") {
                config.default_radius_m = parse_value("feed.default_radius_m", raw)?;
                if config.default_radius_m == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "feed.default_radius_m".to_string(),
                        value: raw.to_string(),
                    });
                }
            }
            if let Some(raw) = feed.get("radius_choices_m") {
                config.radius_choices_m = parse_list("feed.radius_choices_m", raw)?;
            }
            if let Some(raw) = feed.get("geolocation_timeout_secs") {
                let secs: u64 = parse_value("feed.geolocation_timeout_secs", raw)?;
                config.geolocation_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(query) = ini.section(Some("query")) {
            if let Some(raw) = query.get("base_url") {
                config.query.base_url = raw.to_string();
            }
            if let Some(raw) = query.get("timeout_secs") {
                config.query.timeout_secs = parse_value("query.timeout_secs", raw)?;
            }
        }

        Ok(config)
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the grouping precision.
    pub fn with_group_precision(mut self, precision: usize) -> Self {
        self.group_precision = precision;
        self
    }

    /// Set the pan-gesture settle window.
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Set the default region.
    pub fn with_default_region(mut self, center: Coordinate, radius_m: u32) -> Self {
        self.default_center = center;
        self.default_radius_m = radius_m;
        self
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn parse_list(key: &str, raw: &str) -> Result<Vec<u32>, ConfigError> {
    raw.split(',')
        .map(|part| parse_value(key, part))
        .collect()
}
