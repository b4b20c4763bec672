//! Content source storage trait.

use dailyread_types::{ContentSource, NewContentSource, SourceId, Timestamp};

use crate::StoreError;

pub trait ContentSourceStore: Send + Sync {
    /// Insert a new source. `order_index: None` appends after the last one.
    fn put_source(&self, new: NewContentSource, now: Timestamp) -> Result<ContentSource, StoreError>;

    fn get_source(&self, id: SourceId) -> Result<Option<ContentSource>, StoreError>;

    /// All sources, enabled or not, in fallback order.
    fn list_sources(&self) -> Result<Vec<ContentSource>, StoreError>;

    /// Enable or disable a source; fails with `NotFound` for an unknown id.
    fn set_enabled(&self, id: SourceId, enabled: bool) -> Result<ContentSource, StoreError>;
}

/// Fallback order: ascending `order_index`, ties broken by id.
pub fn sort_sources(sources: &mut [ContentSource]) {
    sources.sort_by_key(|s| (s.order_index, s.id));
}

/// The `order_index` an appended source receives.
pub fn next_order_index(sources: &[ContentSource]) -> u32 {
    sources
        .iter()
        .map(|s| s.order_index.saturating_add(1))
        .max()
        .unwrap_or(0)
}
