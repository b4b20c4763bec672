//! The canonical daily-content record.

use serde::{Deserialize, Serialize};

/// A normalised article, independent of which upstream produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyArticle {
    pub id: String,
    pub title: String,
    pub author: String,
    pub content: String,
}
