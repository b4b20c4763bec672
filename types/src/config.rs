//! Entries of the durable key/value configuration table.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// One row of the `(key, value, description, updated_at)` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub value: String,
    pub description: String,
    pub updated_at: Timestamp,
}

impl ConfigEntry {
    pub fn new(value: impl Into<String>, description: impl Into<String>, now: Timestamp) -> Self {
        Self {
            value: value.into(),
            description: description.into(),
            updated_at: now,
        }
    }
}
