//! Daily content from external sources.
//!
//! Sources are tried in fallback order until one returns a usable body.
//! Which source goes first is the polling algorithm's only decision;
//! the rest of the enabled sources follow in `order_index` order.

pub mod client;
pub mod daily;
pub mod error;
pub mod normalize;
pub mod selection;

pub use client::{HttpSourceClient, SourceFetcher};
pub use daily::{DailyContentService, DailyOutcome, DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL};
pub use error::SourceError;
pub use normalize::normalize_article;
pub use selection::{effective_algorithm, enabled_in_order, fallback_order, select_next};
