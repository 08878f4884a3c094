//! Feed domain: items, spatial grouping, and pagination.
//!
//! Items are owned by the external query service and only read here. The
//! grouper derives map-marker groups from the accumulated list on every
//! render; the paginator owns the page cursor and the list itself, applying
//! fetch completions through a stale-response guard keyed on region
//! sequence ids.

mod group;
mod item;
mod paginator;

pub use group::{group_items, ItemGroup};
pub use item::{Category, FeedItem, ItemId};
pub use paginator::{FeedPaginator, FetchTicket, PageCursor, PageOutcome, DEFAULT_PAGE_SIZE};
