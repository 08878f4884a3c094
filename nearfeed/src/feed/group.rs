//! Spatial grouping of near-duplicate feed items.
//!
//! Items whose coordinates round to the same bucket key collapse into one
//! [`ItemGroup`] and are shown as a single map marker. Groups are derived
//! data: recomputed from the accumulated item list on every render, never
//! cached or incrementally maintained. Feed pages are small (tens of items),
//! so the O(n) pass per render is negligible.

use std::collections::HashMap;

use crate::feed::item::FeedItem;
use crate::geo::bucket_key;

/// A set of feed items treated as one map marker.
///
/// Invariant: `members` is non-empty and preserves first-seen order, so the
/// representative is always the first item the query service returned for
/// this bucket. The service's own ordering (typically recency) is trusted
/// and not re-sorted here.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGroup {
    /// Rounded-coordinate bucket key shared by all members.
    pub key: String,

    /// Member items in first-seen order.
    pub members: Vec<FeedItem>,
}

impl ItemGroup {
    /// The item displayed for the whole group.
    pub fn representative(&self) -> &FeedItem {
        &self.members[0]
    }

    /// Number of items in the group.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members. Never true for groups produced by
    /// [`group_items`].
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the representative carries a usable position.
    ///
    /// Groups without one are excluded from marker rendering but still
    /// listed in the side panel.
    pub fn has_mappable_representative(&self) -> bool {
        self.representative().has_mappable_coordinate()
    }
}

/// Group items by rounded-coordinate bucket key.
///
/// Groups appear in first-seen key order; members within a group appear in
/// input order. Items with malformed coordinates share the NaN sentinel
/// bucket so they remain eligible for side-panel display.
///
/// Running this twice over the same input yields identical keys, member
/// orders, and representatives.
pub fn group_items(items: &[FeedItem], precision: usize) -> Vec<ItemGroup> {
    let mut groups: Vec<ItemGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let key = bucket_key(item.coordinate, precision);
        match index.get(&key) {
            Some(&slot) => groups[slot].members.push(item.clone()),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(ItemGroup {
                    key,
                    members: vec![item.clone()],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::item::{Category, ItemId};
    use crate::geo::Coordinate;
    use chrono::{TimeZone, Utc};

    fn make_item(id: u64, lat: f64, lng: f64) -> FeedItem {
        FeedItem {
            id: ItemId(id),
            coordinate: Coordinate::new_unchecked(lat, lng),
            category: Category::Parking,
            content: format!("report {}", id),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            view_count: 0,
            author: None,
            address: None,
        }
    }

    #[test]
    fn test_groups_preserve_first_seen_order() {
        let items = vec![
            make_item(1, 37.51, 127.01),
            make_item(2, 37.52, 127.02),
            make_item(3, 37.51, 127.01),
        ];

        let groups = group_items(&items, 5);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].representative().id, ItemId(1));
        assert_eq!(groups[0].members[1].id, ItemId(3));
        assert_eq!(groups[1].representative().id, ItemId(2));
    }

    #[test]
    fn test_sub_meter_neighbors_share_group_at_precision_5() {
        let items = vec![
            make_item(1, 37.500001, 127.000001),
            make_item(2, 37.500002, 127.000002),
        ];

        assert_eq!(group_items(&items, 5).len(), 1);
        assert_eq!(group_items(&items, 6).len(), 2);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let items = vec![
            make_item(1, 37.51, 127.01),
            make_item(2, 37.52, 127.02),
            make_item(3, 37.51, 127.01),
            make_item(4, f64::NAN, 127.0),
        ];

        let first = group_items(&items, 5);
        let second = group_items(&items, 5);

        let keys: Vec<&str> = first.iter().map(|g| g.key.as_str()).collect();
        let keys_again: Vec<&str> = second.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, keys_again);

        let reps: Vec<ItemId> = first.iter().map(|g| g.representative().id).collect();
        let reps_again: Vec<ItemId> = second.iter().map(|g| g.representative().id).collect();
        assert_eq!(reps, reps_again);
    }

    #[test]
    fn test_malformed_coordinates_share_sentinel_group() {
        let items = vec![
            make_item(1, f64::NAN, 127.0),
            make_item(2, f64::NAN, f64::NAN),
            make_item(3, 37.5, 127.0),
        ];

        let groups = group_items(&items, 5);

        // Two distinct malformed keys: "NaN_127.00000" and "NaN_NaN".
        assert_eq!(groups.len(), 3);
        let unmappable: Vec<_> = groups
            .iter()
            .filter(|g| !g.has_mappable_representative())
            .collect();
        assert_eq!(unmappable.len(), 2);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        assert!(group_items(&[], 5).is_empty());
    }

    #[test]
    fn test_representative_is_first_member() {
        let items = vec![
            make_item(9, 37.5, 127.0),
            make_item(1, 37.5, 127.0),
            make_item(5, 37.5, 127.0),
        ];

        let groups = group_items(&items, 5);
        assert_eq!(groups.len(), 1);
        // Service ordering trusted: first returned item represents the group.
        assert_eq!(groups[0].representative().id, ItemId(9));
    }
}
