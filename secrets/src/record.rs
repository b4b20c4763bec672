use std::fmt;

use dailyread_crypto::KeyBytes;
use dailyread_types::Timestamp;

/// Where the active key came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Supplied by the operator through process configuration; never persisted here.
    Operator,
    /// Read back from the config table.
    Persisted,
    /// Generated by this call and won the insert.
    Generated,
}

impl KeyOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyOrigin::Operator => "operator",
            KeyOrigin::Persisted => "persisted",
            KeyOrigin::Generated => "generated",
        }
    }
}

impl fmt::Display for KeyOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The deployment's credential key together with its provenance.
#[derive(Clone)]
pub struct SecretRecord {
    pub key: KeyBytes,
    pub origin: KeyOrigin,
    /// `None` for operator keys, which this component never persists.
    pub persisted_at: Option<Timestamp>,
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("key", &"<redacted>")
            .field("origin", &self.origin)
            .field("persisted_at", &self.persisted_at)
            .finish()
    }
}
