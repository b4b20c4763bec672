use std::sync::Arc;

use dailyread_accounts::{AccountError, AccountWorkflows, PasswordHashing};
use dailyread_nullables::{NullAccountStore, NullClock, NullCodeStore, NullMailer, NullSession};
use dailyread_types::Account;
use dailyread_verification::{ChallengeConfig, ChallengeError, ChallengeGate, LedgerConfig, VerificationLedger};

struct Harness {
    clock: Arc<NullClock>,
    mailer: Arc<NullMailer>,
    workflows: AccountWorkflows,
}

fn harness() -> Harness {
    let clock = Arc::new(NullClock::new(1_700_000_000));
    let mailer = Arc::new(NullMailer::new());
    let ledger = Arc::new(VerificationLedger::new(
        Arc::new(NullCodeStore::new()),
        clock.clone(),
        LedgerConfig::default(),
    ));
    let gate = Arc::new(ChallengeGate::new(clock.clone(), ChallengeConfig::default()));
    let workflows = AccountWorkflows::new(
        Arc::new(NullAccountStore::new()),
        ledger,
        gate,
        mailer.clone(),
        clock.clone(),
    )
    .with_hashing(PasswordHashing {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    });
    Harness {
        clock,
        mailer,
        workflows,
    }
}

/// Put a fresh challenge in the session and return its answer.
fn solve(h: &Harness, session: &mut NullSession) -> String {
    h.workflows.gate().issue(session).unwrap();
    session.pending_code().unwrap()
}

async fn registered(h: &Harness, username: &str, email: &str, password: &str) -> Account {
    let mut session = NullSession::new();
    let captcha = solve(h, &mut session);
    h.workflows
        .send_registration_code(&mut session, &captcha, email)
        .await
        .unwrap();
    let code = h.mailer.last_code_for(&email.to_lowercase()).unwrap();
    h.workflows.register(username, email, password, &code).await.unwrap()
}

#[tokio::test]
async fn registration_proves_email_ownership() {
    let h = harness();
    let account = registered(&h, "reader", "Reader@Example.com", "password123").await;

    assert_eq!(account.username, "reader");
    assert_eq!(account.email.as_deref(), Some("reader@example.com"));
    assert!(account.email_verified);
    assert!(account.password_hash.starts_with("$argon2id$"));
    assert_eq!(h.mailer.sent().len(), 1);
}

#[tokio::test]
async fn registration_code_is_single_use() {
    let h = harness();
    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    h.workflows
        .send_registration_code(&mut session, &captcha, "reader@example.com")
        .await
        .unwrap();
    let code = h.mailer.last_code_for("reader@example.com").unwrap();

    h.workflows
        .register("reader", "reader@example.com", "password123", &code)
        .await
        .unwrap();
    let again = h
        .workflows
        .register("reader2", "reader@example.com", "password123", &code)
        .await;
    assert!(matches!(again, Err(AccountError::CodeInvalid)));
}

#[tokio::test]
async fn taken_username_leaves_code_usable() {
    let h = harness();
    registered(&h, "reader", "first@example.com", "password123").await;

    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    h.workflows
        .send_registration_code(&mut session, &captcha, "second@example.com")
        .await
        .unwrap();
    let code = h.mailer.last_code_for("second@example.com").unwrap();

    let clash = h
        .workflows
        .register("reader", "second@example.com", "password123", &code)
        .await;
    assert!(matches!(clash, Err(AccountError::UsernameTaken)));

    let account = h
        .workflows
        .register("reader_two", "second@example.com", "password123", &code)
        .await
        .unwrap();
    assert_eq!(account.username, "reader_two");
}

#[tokio::test]
async fn registered_address_cannot_request_another_code() {
    let h = harness();
    registered(&h, "reader", "reader@example.com", "password123").await;

    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    let result = h
        .workflows
        .send_registration_code(&mut session, &captcha, "READER@example.com")
        .await;
    assert!(matches!(result, Err(AccountError::EmailTaken)));
}

#[tokio::test]
async fn wrong_challenge_sends_nothing() {
    let h = harness();
    let mut session = NullSession::new();
    solve(&h, &mut session);

    let result = h
        .workflows
        .send_registration_code(&mut session, "definitely-wrong", "reader@example.com")
        .await;
    assert!(matches!(result, Err(AccountError::Challenge(ChallengeError::Mismatch))));
    assert!(h.mailer.sent().is_empty());

    let mut empty = NullSession::new();
    let result = h
        .workflows
        .send_registration_code(&mut empty, "abcd", "reader@example.com")
        .await;
    assert!(matches!(result, Err(AccountError::Challenge(ChallengeError::Missing))));
}

#[tokio::test]
async fn login_checks_challenge_then_credentials() {
    let h = harness();
    registered(&h, "reader", "reader@example.com", "password123").await;
    let mut session = NullSession::new();

    let captcha = solve(&h, &mut session);
    let account = h
        .workflows
        .login(&mut session, &captcha, "reader", "password123")
        .await
        .unwrap();
    assert_eq!(account.username, "reader");

    let captcha = solve(&h, &mut session);
    let wrong = h.workflows.login(&mut session, &captcha, "reader", "password124").await;
    assert!(matches!(wrong, Err(AccountError::InvalidCredentials)));

    let captcha = solve(&h, &mut session);
    let unknown = h.workflows.login(&mut session, &captcha, "nobody", "password123").await;
    assert!(matches!(unknown, Err(AccountError::InvalidCredentials)));

    // The successful check above consumed the challenge.
    let replay = h.workflows.login(&mut session, &captcha, "reader", "password123").await;
    assert!(matches!(replay, Err(AccountError::Challenge(ChallengeError::Missing))));
}

#[tokio::test(flavor = "current_thread")]
async fn authenticate_treats_unknown_and_wrong_alike() {
    let h = harness();
    registered(&h, "reader", "reader@example.com", "password123").await;

    let account = h.workflows.authenticate(" reader ", "password123").await.unwrap();
    assert_eq!(account.username, "reader");
    let wrong = h.workflows.authenticate("reader", "password124").await;
    let unknown = h.workflows.authenticate("nobody", "password124").await;
    assert!(matches!(wrong, Err(AccountError::InvalidCredentials)));
    assert!(matches!(unknown, Err(AccountError::InvalidCredentials)));
    assert_eq!(wrong.unwrap_err().to_string(), unknown.unwrap_err().to_string());
}

#[tokio::test]
async fn password_reset_round_trip() {
    let h = harness();
    registered(&h, "reader", "reader@example.com", "password123").await;
    h.mailer.reset();

    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    h.workflows
        .request_password_reset(&mut session, &captcha, "reader@example.com")
        .await
        .unwrap();
    let code = h.mailer.last_code_for("reader@example.com").unwrap();
    assert_eq!(code.len(), 6);

    h.clock.advance(9 * 60);
    h.workflows
        .reset_password("reader@example.com", &code, "new-password-1")
        .await
        .unwrap();

    let captcha = solve(&h, &mut session);
    h.workflows
        .login(&mut session, &captcha, "reader", "new-password-1")
        .await
        .unwrap();

    let reused = h
        .workflows
        .reset_password("reader@example.com", &code, "another-password")
        .await;
    assert!(matches!(reused, Err(AccountError::CodeInvalid)));
}

#[tokio::test]
async fn password_reset_code_expires() {
    let h = harness();
    registered(&h, "reader", "reader@example.com", "password123").await;

    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    h.workflows
        .request_password_reset(&mut session, &captcha, "reader@example.com")
        .await
        .unwrap();
    let code = h.mailer.last_code_for("reader@example.com").unwrap();

    h.clock.advance(10 * 60 + 1);
    let late = h
        .workflows
        .reset_password("reader@example.com", &code, "new-password-1")
        .await;
    assert!(matches!(late, Err(AccountError::CodeInvalid)));
}

#[tokio::test]
async fn password_reset_for_unknown_address_is_silent() {
    let h = harness();
    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    h.workflows
        .request_password_reset(&mut session, &captcha, "ghost@example.com")
        .await
        .unwrap();
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn email_change_is_bound_to_account_and_address() {
    let h = harness();
    let account = registered(&h, "reader", "reader@example.com", "password123").await;
    let other = registered(&h, "other", "other@example.com", "password123").await;

    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    h.workflows
        .request_email_change(&mut session, &captcha, account.id, "new@example.com")
        .await
        .unwrap();
    let code = h.mailer.last_code_for("new@example.com").unwrap();

    let wrong_account = h
        .workflows
        .confirm_email_change(other.id, "new@example.com", &code);
    assert!(matches!(wrong_account, Err(AccountError::CodeInvalid)));
    let wrong_address = h
        .workflows
        .confirm_email_change(account.id, "elsewhere@example.com", &code);
    assert!(matches!(wrong_address, Err(AccountError::CodeInvalid)));

    let updated = h
        .workflows
        .confirm_email_change(account.id, "New@Example.com", &code)
        .unwrap();
    assert_eq!(updated.email.as_deref(), Some("new@example.com"));
    assert!(updated.email_verified);

    let captcha = solve(&h, &mut session);
    let taken = h
        .workflows
        .request_email_change(&mut session, &captcha, other.id, "new@example.com")
        .await;
    assert!(matches!(taken, Err(AccountError::EmailTaken)));
}

#[tokio::test]
async fn delivery_failure_is_reported() {
    let h = harness();
    h.mailer.set_failing(true);
    let mut session = NullSession::new();
    let captcha = solve(&h, &mut session);
    let result = h
        .workflows
        .send_registration_code(&mut session, &captcha, "reader@example.com")
        .await;
    assert!(matches!(result, Err(AccountError::DeliveryFailed(_))));
}

#[tokio::test]
async fn malformed_input_is_rejected_before_storage() {
    let h = harness();
    assert!(matches!(
        h.workflows.register("ab", "reader@example.com", "password123", "000000").await,
        Err(AccountError::InvalidInput(_))
    ));
    assert!(matches!(
        h.workflows.register("reader", "not-an-email", "password123", "000000").await,
        Err(AccountError::InvalidInput(_))
    ));
    assert!(matches!(
        h.workflows.reset_password("reader@example.com", "000000", "short").await,
        Err(AccountError::InvalidInput(_))
    ));
}
