//! Key bootstrap and credential encryption against in-memory and LMDB stores.

use std::sync::{Arc, Barrier};
use std::thread;

use dailyread_crypto::KeyBytes;
use dailyread_nullables::{NullClock, NullConfigStore};
use dailyread_secrets::{CipherError, CredentialCipher, KeyOrigin, SecretError, SecretStore};
use dailyread_store::{keys, ConfigStore};
use dailyread_store_lmdb::LmdbEnvironment;
use dailyread_types::{Clock, ConfigEntry, Timestamp};

fn null_store() -> (Arc<NullConfigStore>, SecretStore) {
    let config = Arc::new(NullConfigStore::new());
    let clock: Arc<dyn Clock> = Arc::new(NullClock::new(1_000));
    let secrets = SecretStore::new(config.clone(), clock);
    (config, secrets)
}

#[test]
fn first_call_generates_and_persists() {
    let (config, secrets) = null_store();
    let record = secrets.get_or_create_key().unwrap();
    assert_eq!(record.origin, KeyOrigin::Generated);
    assert_eq!(record.persisted_at, Some(Timestamp::new(1_000)));

    let stored = config.get_entry(keys::CREDENTIAL_KEY).unwrap().unwrap();
    assert_eq!(KeyBytes::decode(&stored.value).unwrap(), record.key);
}

#[test]
fn repeated_calls_return_identical_keys() {
    let (_config, secrets) = null_store();
    let first = secrets.get_or_create_key().unwrap();
    let second = secrets.get_or_create_key().unwrap();
    assert_eq!(first.key, second.key);
    assert_eq!(second.origin, KeyOrigin::Persisted);
}

#[test]
fn operator_key_wins_and_is_not_persisted() {
    let (config, secrets) = null_store();
    let secrets = secrets.with_operator_key(Some("  operator-secret  ")).unwrap();
    let record = secrets.get_or_create_key().unwrap();
    assert_eq!(record.origin, KeyOrigin::Operator);
    assert_eq!(record.key.as_bytes(), b"operator-secret");
    assert!(record.persisted_at.is_none());
    assert!(config.get_entry(keys::CREDENTIAL_KEY).unwrap().is_none());
}

#[test]
fn blank_operator_key_is_ignored() {
    let (_config, secrets) = null_store();
    let secrets = secrets.with_operator_key(Some("   ")).unwrap();
    assert!(!secrets.has_operator_key());
    assert_eq!(secrets.get_or_create_key().unwrap().origin, KeyOrigin::Generated);
}

#[test]
fn corrupt_persisted_key_is_reported_and_kept() {
    let (config, secrets) = null_store();
    config
        .upsert_entry(keys::CREDENTIAL_KEY, &ConfigEntry::new("%%% not base64", "", Timestamp::EPOCH))
        .unwrap();
    assert!(matches!(secrets.get_or_create_key(), Err(SecretError::Corrupt(_))));
    assert_eq!(
        config.get_entry(keys::CREDENTIAL_KEY).unwrap().unwrap().value,
        "%%% not base64"
    );
}

#[test]
fn unavailable_store_is_surfaced() {
    let (config, secrets) = null_store();
    config.set_unavailable(true);
    assert!(matches!(secrets.get_or_create_key(), Err(SecretError::Unavailable(_))));

    let cipher = CredentialCipher::new(secrets);
    assert!(matches!(cipher.encrypt("pw"), Err(CipherError::Secret(_))));
    assert!(cipher.decrypt_or_unset("enc:v1:AAAA").is_err());
    assert!(!cipher.is_initialized());

    config.set_unavailable(false);
    assert!(cipher.encrypt("pw").is_ok());
    assert!(cipher.is_initialized());
}

#[test]
fn concurrent_bootstrap_converges_on_one_key() {
    let (config, secrets) = null_store();
    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let secrets = secrets.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                secrets.get_or_create_key().unwrap().key
            })
        })
        .collect();
    let returned: Vec<KeyBytes> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(returned.windows(2).all(|pair| pair[0] == pair[1]));

    let stored = config.get_entry(keys::CREDENTIAL_KEY).unwrap().unwrap();
    assert_eq!(KeyBytes::decode(&stored.value).unwrap(), returned[0]);
}

#[test]
fn key_survives_restart_on_lmdb() {
    let dir = tempfile::tempdir().unwrap();
    let clock: Arc<dyn Clock> = Arc::new(NullClock::new(50));

    let (first_key, sealed) = {
        let env = LmdbEnvironment::open(dir.path(), 16, 16 * 1024 * 1024).unwrap();
        let secrets = SecretStore::new(Arc::new(env.config_store()), clock.clone());
        let cipher = CredentialCipher::new(secrets.clone());
        let sealed = cipher.encrypt("relay-password").unwrap();
        (secrets.get_or_create_key().unwrap().key, sealed)
    };

    let env = LmdbEnvironment::open(dir.path(), 16, 16 * 1024 * 1024).unwrap();
    let secrets = SecretStore::new(Arc::new(env.config_store()), clock);
    let record = secrets.get_or_create_key().unwrap();
    assert_eq!(record.key, first_key);
    assert_eq!(record.origin, KeyOrigin::Persisted);

    let cipher = CredentialCipher::new(secrets);
    assert_eq!(cipher.decrypt(&sealed).unwrap(), "relay-password");
}

#[test]
fn empty_input_passes_through() {
    let (config, secrets) = null_store();
    let cipher = CredentialCipher::new(secrets);
    assert_eq!(cipher.encrypt("").unwrap(), "");
    assert_eq!(cipher.decrypt("").unwrap(), "");
    assert_eq!(cipher.decrypt_or_unset("").unwrap(), None);
    // Nothing was bootstrapped for empty input.
    assert!(config.get_entry(keys::CREDENTIAL_KEY).unwrap().is_none());
}

#[test]
fn foreign_ciphertext_fails_closed() {
    let (_a_config, a) = null_store();
    let (_b_config, b) = null_store();
    let sealed = CredentialCipher::new(a).encrypt("secret").unwrap();
    let other = CredentialCipher::new(b);

    assert!(matches!(other.decrypt(&sealed), Err(CipherError::Decrypt(_))));
    assert_eq!(other.decrypt_or_unset(&sealed).unwrap(), None);
    assert!(matches!(other.decrypt("plain text"), Err(CipherError::Decrypt(_))));
}

#[test]
fn cipher_shared_across_threads() {
    let (_config, secrets) = null_store();
    let cipher = Arc::new(CredentialCipher::new(secrets));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cipher = Arc::clone(&cipher);
            thread::spawn(move || {
                let plaintext = format!("credential-{i}");
                let sealed = cipher.encrypt(&plaintext).unwrap();
                assert_eq!(cipher.decrypt(&sealed).unwrap(), plaintext);
                cipher.record().unwrap().key.clone()
            })
        })
        .collect();
    let returned: Vec<KeyBytes> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(returned.windows(2).all(|pair| pair[0] == pair[1]));
}
