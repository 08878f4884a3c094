//! Feed item model.
//!
//! Items are owned by the external query service; the engine deserializes
//! and reads them but never mutates or persists them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Opaque identifier for a feed item, assigned by the external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Report category.
///
/// A closed set of variants rather than free-form strings; unknown
/// categories from the service deserialize to [`Category::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Parking,
    WaitTime,
    Weather,
    Crowd,
    Event,
    Closure,
    Other,
}

impl Category {
    /// Short label for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Parking => "parking",
            Category::WaitTime => "wait_time",
            Category::Weather => "weather",
            Category::Crowd => "crowd",
            Category::Event => "event",
            Category::Closure => "closure",
            Category::Other => "other",
        }
    }

    /// Parse a service category name; anything unrecognized is `Other`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "parking" => Category::Parking,
            "wait_time" => Category::WaitTime,
            "weather" => Category::Weather,
            "crowd" => Category::Crowd,
            "event" => Category::Event,
            "closure" => Category::Closure,
            _ => Category::Other,
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Category::from_name(&name))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A short-lived, location-tagged status report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Service-assigned identifier.
    pub id: ItemId,

    /// Reported position. May be malformed for legacy items; callers check
    /// [`Coordinate::is_valid`] before doing geometry with it.
    pub coordinate: Coordinate,

    /// Report category.
    pub category: Category,

    /// Free-text report body.
    pub content: String,

    /// Server-side creation time.
    pub created_at: DateTime<Utc>,

    /// Number of detail views recorded by the service.
    pub view_count: u64,

    /// Display name of the reporting user, when the service exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Reverse-geocoded address, when the service exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl FeedItem {
    /// Whether the item carries a usable position for map placement.
    pub fn has_mappable_coordinate(&self) -> bool {
        self.coordinate.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_item(id: u64, lat: f64, lng: f64) -> FeedItem {
        FeedItem {
            id: ItemId(id),
            coordinate: Coordinate::new_unchecked(lat, lng),
            category: Category::Parking,
            content: "lot behind the market is full".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            view_count: 3,
            author: None,
            address: None,
        }
    }

    #[test]
    fn test_item_deserializes_from_service_json() {
        let json = r#"{
            "id": 42,
            "coordinate": {"lat": 37.5665, "lng": 126.978},
            "category": "wait_time",
            "content": "about 20 minutes at the door",
            "createdAt": "2025-06-01T12:00:00Z",
            "viewCount": 7
        }"#;

        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, ItemId(42));
        assert_eq!(item.category, Category::WaitTime);
        assert_eq!(item.view_count, 7);
        assert!(item.author.is_none());
        assert!(item.has_mappable_coordinate());
    }

    #[test]
    fn test_unknown_category_maps_to_other() {
        let json = r#"{
            "id": 1,
            "coordinate": {"lat": 37.5, "lng": 127.0},
            "category": "lost_and_found",
            "content": "x",
            "createdAt": "2025-06-01T12:00:00Z",
            "viewCount": 0
        }"#;

        let item: FeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.category, Category::Other);
    }

    #[test]
    fn test_mappable_coordinate_check() {
        assert!(make_item(1, 37.5, 127.0).has_mappable_coordinate());
        assert!(!make_item(2, f64::NAN, 127.0).has_mappable_coordinate());
        assert!(!make_item(3, 91.0, 127.0).has_mappable_coordinate());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::WaitTime.to_string(), "wait_time");
        assert_eq!(Category::Other.to_string(), "other");
    }
}
