//! Ledger behaviour over the in-memory store and over LMDB.

use std::sync::Arc;

use dailyread_nullables::{NullClock, NullCodeStore};
use dailyread_store::VerificationCodeStore;
use dailyread_store_lmdb::LmdbEnvironment;
use dailyread_types::VerificationKind;
use dailyread_verification::{LedgerConfig, VerificationError, VerificationLedger};

const T0: u64 = 1_700_000_000;

fn ledger_over(store: Arc<dyn VerificationCodeStore>) -> (Arc<NullClock>, VerificationLedger) {
    let clock = Arc::new(NullClock::new(T0));
    let ledger = VerificationLedger::new(store, clock.clone(), LedgerConfig::default());
    (clock, ledger)
}

fn null_ledger() -> (Arc<NullClock>, VerificationLedger) {
    ledger_over(Arc::new(NullCodeStore::new()))
}

#[test]
fn password_reset_scenario() {
    let (clock, ledger) = null_ledger();
    let subject = "reader@example.com";
    let kind = VerificationKind::PasswordReset;

    let issued = ledger.issue_with_ttl(subject, kind, 10 * 60).unwrap();
    clock.advance(9 * 60);

    let row = ledger.validate(subject, &issued.code, Some(kind)).unwrap();
    assert!(ledger.mark_used(row.id).unwrap());

    let fresh = ledger.issue(subject, kind).unwrap();
    clock.advance(1);
    // The spent row is gone for good; only a colliding fresh code could match.
    assert!(ledger
        .validate(subject, &issued.code, Some(kind))
        .map_or(true, |row| row.id == fresh.id));
    assert_eq!(ledger.validate(subject, &fresh.code, Some(kind)).unwrap().id, fresh.id);
}

#[test]
fn issued_codes_are_six_digits() {
    let (_clock, ledger) = null_ledger();
    let issued = ledger.issue("a@example.com", VerificationKind::RegisterEmail).unwrap();
    assert_eq!(issued.code.len(), 6);
    assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(issued.ttl_secs, 86_400);
    assert_eq!(issued.expires_at.as_secs(), T0 + 86_400);
}

#[test]
fn code_never_validates_after_expiry() {
    let (clock, ledger) = null_ledger();
    let kind = VerificationKind::PasswordReset;
    let issued = ledger.issue("a@example.com", kind).unwrap();
    clock.advance(600);
    assert!(matches!(
        ledger.validate("a@example.com", &issued.code, Some(kind)),
        Err(VerificationError::CodeInvalid)
    ));
}

#[test]
fn validate_after_mark_used_is_invalid_for_every_kind() {
    let (_clock, ledger) = null_ledger();
    for kind in VerificationKind::ALL {
        let issued = ledger.issue("a@example.com", kind).unwrap();
        let row = ledger.validate("a@example.com", &issued.code, Some(kind)).unwrap();
        ledger.mark_used(row.id).unwrap();
        assert!(ledger.validate("a@example.com", &issued.code, Some(kind)).is_err());
        assert!(!ledger.mark_used(row.id).unwrap());
    }
}

#[test]
fn validation_normalizes_subject_and_code() {
    let (_clock, ledger) = null_ledger();
    let issued = ledger.issue("Reader@Example.com", VerificationKind::RegisterEmail).unwrap();
    let padded = format!(" {} ", issued.code);
    assert!(ledger.validate("  reader@example.COM", &padded, None).is_ok());
}

#[test]
fn kind_is_enforced_when_given() {
    let (_clock, ledger) = null_ledger();
    let issued = ledger.issue("a@example.com", VerificationKind::RegisterEmail).unwrap();
    assert!(ledger
        .validate("a@example.com", &issued.code, Some(VerificationKind::PasswordReset))
        .is_err());
    assert!(ledger.validate("a@example.com", &issued.code, None).is_ok());
}

#[test]
fn consume_is_single_shot() {
    let (_clock, ledger) = null_ledger();
    let kind = VerificationKind::PasswordReset;
    let issued = ledger.issue("a@example.com", kind).unwrap();
    let consumed = ledger.consume("a@example.com", &issued.code, Some(kind)).unwrap();
    assert!(consumed.used);
    assert!(matches!(
        ledger.consume("a@example.com", &issued.code, Some(kind)),
        Err(VerificationError::CodeInvalid)
    ));
}

#[test]
fn sweep_reclaims_only_dead_rows() {
    let (clock, ledger) = null_ledger();
    let kind = VerificationKind::PasswordReset;
    let spent = ledger.issue("a@example.com", kind).unwrap();
    ledger.consume("a@example.com", &spent.code, Some(kind)).unwrap();
    ledger.issue_with_ttl("b@example.com", kind, 30).unwrap();
    let live = ledger.issue("c@example.com", kind).unwrap();

    clock.advance(60);
    assert_eq!(ledger.sweep().unwrap(), 2);
    assert!(ledger.validate("c@example.com", &live.code, Some(kind)).is_ok());
}

#[test]
fn ledger_over_lmdb_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let kind = VerificationKind::ChangeEmail;
    let issued = {
        let env = LmdbEnvironment::open(dir.path(), 16, 16 * 1024 * 1024).unwrap();
        let (_clock, ledger) = ledger_over(Arc::new(env.verification_store()));
        ledger.issue("7:new@example.com", kind).unwrap()
    };

    let env = LmdbEnvironment::open(dir.path(), 16, 16 * 1024 * 1024).unwrap();
    let (clock, ledger) = ledger_over(Arc::new(env.verification_store()));
    clock.advance(60);
    let row = ledger.consume("7:new@example.com", &issued.code, Some(kind)).unwrap();
    assert_eq!(row.id, issued.id);
    assert!(ledger.validate("7:new@example.com", &issued.code, Some(kind)).is_err());
}
