//! Key/value configuration table.

use dailyread_types::ConfigEntry;

use crate::StoreError;

/// Generic `(key, value, description, updated_at)` table.
///
/// Holds both the persisted credential key and runtime settings. Call
/// sites outside the secret store go through [`crate::Settings`] instead
/// of using raw strings.
pub trait ConfigStore: Send + Sync {
    fn get_entry(&self, key: &str) -> Result<Option<ConfigEntry>, StoreError>;

    /// Insert, or overwrite the existing row for `key`.
    fn upsert_entry(&self, key: &str, entry: &ConfigEntry) -> Result<(), StoreError>;

    /// Insert `entry` only if `key` is absent, in a single atomic step.
    ///
    /// Returns the row that is stored afterwards: `entry` when this call
    /// inserted it, otherwise the row that was already there.
    fn insert_if_absent(&self, key: &str, entry: &ConfigEntry) -> Result<ConfigEntry, StoreError>;

    /// Returns whether a row was removed.
    fn delete_entry(&self, key: &str) -> Result<bool, StoreError>;

    /// All rows, ordered by key.
    fn list_entries(&self) -> Result<Vec<(String, ConfigEntry)>, StoreError>;
}
