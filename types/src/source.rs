//! External content sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ParseError, Timestamp};

pub type SourceId = u64;

/// How the next content source is chosen from the enabled set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollingAlgorithm {
    /// Always start from the first enabled source by `order_index`.
    #[default]
    Sequential,
    /// Draw uniformly from the enabled set.
    Random,
}

impl PollingAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for PollingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PollingAlgorithm {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            other => Err(ParseError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A configured upstream providing daily content.
///
/// Disabled sources are never selected but stay in the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSource {
    pub id: SourceId,
    pub name: String,
    pub url: String,
    pub enabled: bool,
    /// Position in the deterministic fallback order (ascending).
    pub order_index: u32,
    /// Per-source override of the global polling algorithm.
    pub polling_algorithm: Option<PollingAlgorithm>,
    pub created_at: Timestamp,
}

/// Fields supplied when registering a new source.
#[derive(Clone, Debug)]
pub struct NewContentSource {
    pub name: String,
    pub url: String,
    pub enabled: bool,
    /// `None` appends after the current last source.
    pub order_index: Option<u32>,
    pub polling_algorithm: Option<PollingAlgorithm>,
}

impl NewContentSource {
    pub fn enabled(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            order_index: None,
            polling_algorithm: None,
        }
    }
}
