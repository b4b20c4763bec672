//! Pre-built [`tracing::Span`] constructors.
//!
//! Consistent span names and fields make traces easy to filter and
//! correlate across crates.

use tracing::{info_span, Span};

/// Span covering one HTTP action handled by the site API.
pub fn http_span(action: &str) -> Span {
    info_span!("http", action = %action)
}

/// Span covering one fetch attempt against a content source.
pub fn source_attempt_span(source_id: u64, name: &str) -> Span {
    info_span!("source_attempt", source_id, name = %name)
}

/// Span covering one periodic sweep of codes and idle sessions.
pub fn sweep_span() -> Span {
    info_span!("sweep")
}
