//! Typed settings over the in-memory config table.

use std::sync::Arc;

use dailyread_nullables::{NullClock, NullConfigStore};
use dailyread_store::{keys, ConfigStore, Settings, StoreError};
use dailyread_types::{PollingAlgorithm, Timestamp};

fn settings() -> (Arc<NullConfigStore>, Arc<NullClock>, Settings) {
    let store = Arc::new(NullConfigStore::new());
    let clock = Arc::new(NullClock::new(42));
    let settings = Settings::new(store.clone(), clock.clone());
    (store, clock, settings)
}

#[test]
fn typed_values_round_trip() {
    let (_store, _clock, settings) = settings();
    settings.set_bool(keys::MAIL_ENABLED, false).unwrap();
    settings.set_u64("retention_days", 30).unwrap();
    assert_eq!(settings.get_bool(keys::MAIL_ENABLED).unwrap(), Some(false));
    assert_eq!(settings.get_u64("retention_days").unwrap(), Some(30));
    assert_eq!(settings.get_bool("absent").unwrap(), None);
}

#[test]
fn rows_carry_description_and_timestamp() {
    let (store, clock, settings) = settings();
    clock.set(99);
    settings.set_string(keys::MAIL_ENDPOINT, "https://relay.example").unwrap();
    let entry = store.get_entry(keys::MAIL_ENDPOINT).unwrap().unwrap();
    assert_eq!(entry.description, "mail relay endpoint URL");
    assert_eq!(entry.updated_at, Timestamp::new(99));
}

#[test]
fn unparseable_values_are_errors_not_defaults() {
    let (_store, _clock, settings) = settings();
    settings.set_string(keys::MAIL_ENABLED, "maybe").unwrap();
    assert!(matches!(
        settings.get_bool(keys::MAIL_ENABLED),
        Err(StoreError::Serialization(_))
    ));

    settings.set_string(keys::SOURCE_POLLING_ALGORITHM, "round-robin").unwrap();
    assert!(settings
        .get_parsed::<PollingAlgorithm>(keys::SOURCE_POLLING_ALGORITHM)
        .is_err());
    settings.set_string(keys::SOURCE_POLLING_ALGORITHM, " random ").unwrap();
    assert_eq!(
        settings.get_parsed::<PollingAlgorithm>(keys::SOURCE_POLLING_ALGORITHM).unwrap(),
        Some(PollingAlgorithm::Random)
    );
}

#[test]
fn remove_deletes_the_row() {
    let (_store, _clock, settings) = settings();
    settings.set_string(keys::MAIL_FROM_NAME, "Daily Read").unwrap();
    assert!(settings.remove(keys::MAIL_FROM_NAME).unwrap());
    assert_eq!(settings.get_string(keys::MAIL_FROM_NAME).unwrap(), None);
}
