//! The account workflows.
//!
//! Every workflow that sends mail is gated by the session's challenge. The
//! challenge is checked before any store access, so a failed guess costs
//! nothing but the guess.

use std::sync::{Arc, OnceLock};

use dailyread_mail::{render_code_email, MailTransport, OutboundMessage};
use dailyread_store::{AccountStore, StoreError};
use dailyread_types::{Account, AccountId, Clock, NewAccount, VerificationKind};
use dailyread_verification::{ChallengeGate, ChallengeSession, IssuedCode, VerificationLedger};

use crate::{validate, AccountError, PasswordHashing};

/// Ledger subject for an email change: the change is bound to both the
/// account and the address it moves to.
pub fn email_change_subject(user_id: AccountId, new_email: &str) -> String {
    format!("{user_id}:{}", new_email.trim().to_lowercase())
}

pub struct AccountWorkflows {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<VerificationLedger>,
    gate: Arc<ChallengeGate>,
    mailer: Arc<dyn MailTransport>,
    clock: Arc<dyn Clock>,
    hashing: PasswordHashing,
    absent_hash: Arc<OnceLock<String>>,
}

impl AccountWorkflows {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<VerificationLedger>,
        gate: Arc<ChallengeGate>,
        mailer: Arc<dyn MailTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            ledger,
            gate,
            mailer,
            clock,
            hashing: PasswordHashing::default(),
            absent_hash: Arc::new(OnceLock::new()),
        }
    }

    pub fn with_hashing(mut self, hashing: PasswordHashing) -> Self {
        self.hashing = hashing;
        self.absent_hash = Arc::new(OnceLock::new());
        self
    }

    pub fn ledger(&self) -> &Arc<VerificationLedger> {
        &self.ledger
    }

    pub fn gate(&self) -> &Arc<ChallengeGate> {
        &self.gate
    }

    pub fn account(&self, id: AccountId) -> Result<Account, AccountError> {
        self.accounts.get_account(id)?.ok_or(AccountError::NotFound)
    }

    /// An unknown username is checked against a throwaway hash, so both
    /// failures take as long as a real verification.
    pub async fn login<S>(
        &self,
        session: &mut S,
        captcha: &str,
        username: &str,
        password: &str,
    ) -> Result<Account, AccountError>
    where
        S: ChallengeSession + Send + ?Sized,
    {
        self.gate.validate(session, captcha)?;
        self.authenticate(username, password).await
    }

    /// The credential half of [`login`](Self::login), for callers that
    /// checked the challenge themselves and released the session.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account, AccountError> {
        let account = self.accounts.find_by_username(username.trim())?;
        let stored = account.as_ref().map(|a| a.password_hash.clone());
        let verified = self.check_password(password, stored).await?;
        match account {
            Some(account) if verified => {
                tracing::info!(account = account.id, "login");
                Ok(account)
            }
            Some(account) => {
                tracing::debug!(account = account.id, "login rejected");
                Err(AccountError::InvalidCredentials)
            }
            None => Err(AccountError::InvalidCredentials),
        }
    }

    /// Mail a registration code to an address no account owns yet.
    pub async fn send_registration_code<S>(
        &self,
        session: &mut S,
        captcha: &str,
        email: &str,
    ) -> Result<(), AccountError>
    where
        S: ChallengeSession + Send + ?Sized,
    {
        self.gate.validate(session, captcha)?;
        let email = validate::email(email)?;
        if self.accounts.find_by_email(&email)?.is_some() {
            return Err(AccountError::EmailTaken);
        }
        let issued = self.ledger.issue(&email, VerificationKind::RegisterEmail)?;
        self.deliver(&email, &issued).await
    }

    /// Create an account whose email is proven by a registration code.
    ///
    /// The code is marked used only after the account exists, so a failed
    /// create (taken username) leaves it usable for a second attempt.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        code: &str,
    ) -> Result<Account, AccountError> {
        let username = validate::username(username)?;
        let email = validate::email(email)?;
        validate::password(password)?;

        let row = self
            .ledger
            .validate(&email, code, Some(VerificationKind::RegisterEmail))?;
        if self.accounts.find_by_username(&username)?.is_some() {
            return Err(AccountError::UsernameTaken);
        }
        if self.accounts.find_by_email(&email)?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = self.hash_password(password).await?;
        let account = self
            .accounts
            .create_account(
                NewAccount {
                    username,
                    email: Some(email),
                    email_verified: true,
                    password_hash,
                },
                self.clock.now(),
            )
            .map_err(duplicate_to_taken)?;
        self.ledger.mark_used(row.id)?;
        tracing::info!(account = account.id, "account registered");
        Ok(account)
    }

    /// Mail a reset code if an account owns `email`.
    ///
    /// An unknown address succeeds without sending anything, so the
    /// response says nothing about which addresses are registered.
    pub async fn request_password_reset<S>(
        &self,
        session: &mut S,
        captcha: &str,
        email: &str,
    ) -> Result<(), AccountError>
    where
        S: ChallengeSession + Send + ?Sized,
    {
        self.gate.validate(session, captcha)?;
        let email = validate::email(email)?;
        if self.accounts.find_by_email(&email)?.is_none() {
            tracing::debug!("password reset requested for unknown address");
            return Ok(());
        }
        let issued = self.ledger.issue(&email, VerificationKind::PasswordReset)?;
        self.deliver(&email, &issued).await
    }

    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> Result<Account, AccountError> {
        let email = validate::email(email)?;
        validate::password(new_password)?;
        self.ledger
            .consume(&email, code, Some(VerificationKind::PasswordReset))?;
        let account = self
            .accounts
            .find_by_email(&email)?
            .ok_or(AccountError::CodeInvalid)?;
        let password_hash = self.hash_password(new_password).await?;
        let account = self.accounts.set_password_hash(account.id, &password_hash)?;
        tracing::info!(account = account.id, "password reset");
        Ok(account)
    }

    /// Mail a confirmation code to the address the account wants to move to.
    pub async fn request_email_change<S>(
        &self,
        session: &mut S,
        captcha: &str,
        user_id: AccountId,
        new_email: &str,
    ) -> Result<(), AccountError>
    where
        S: ChallengeSession + Send + ?Sized,
    {
        self.gate.validate(session, captcha)?;
        let new_email = validate::email(new_email)?;
        self.account(user_id)?;
        if self.accounts.find_by_email(&new_email)?.is_some() {
            return Err(AccountError::EmailTaken);
        }
        let issued = self.ledger.issue(
            &email_change_subject(user_id, &new_email),
            VerificationKind::ChangeEmail,
        )?;
        self.deliver(&new_email, &issued).await
    }

    pub fn confirm_email_change(
        &self,
        user_id: AccountId,
        new_email: &str,
        code: &str,
    ) -> Result<Account, AccountError> {
        let new_email = validate::email(new_email)?;
        let row = self.ledger.validate(
            &email_change_subject(user_id, &new_email),
            code,
            Some(VerificationKind::ChangeEmail),
        )?;
        let account = self
            .accounts
            .set_email(user_id, &new_email)
            .map_err(|e| match e {
                StoreError::NotFound(_) => AccountError::NotFound,
                other => duplicate_to_taken(other),
            })?;
        self.ledger.mark_used(row.id)?;
        tracing::info!(account = account.id, "email changed");
        Ok(account)
    }

    async fn hash_password(&self, password: &str) -> Result<String, AccountError> {
        let hashing = self.hashing.clone();
        let password = password.to_string();
        off_runtime(move || hashing.hash(&password)).await
    }

    async fn check_password(&self, password: &str, stored: Option<String>) -> Result<bool, AccountError> {
        let hashing = self.hashing.clone();
        let absent = Arc::clone(&self.absent_hash);
        let password = password.to_string();
        off_runtime(move || match stored {
            Some(phc) => Ok(hashing.verify(&password, &phc)),
            None => hashing.verify_absent(&password, &absent),
        })
        .await
    }

    async fn deliver(&self, to: &str, issued: &IssuedCode) -> Result<(), AccountError> {
        let email = render_code_email(issued.kind, &issued.code, issued.ttl_secs);
        let message = OutboundMessage {
            to: to.to_string(),
            subject: email.subject,
            html: email.html,
        };
        self.mailer.send(&message).await.map_err(|e| {
            tracing::warn!(kind = %issued.kind, error = %e, "verification mail not delivered");
            AccountError::DeliveryFailed(e)
        })
    }
}

/// Argon2 is memory-hard; keep it off the async worker threads.
async fn off_runtime<T, F>(work: F) -> Result<T, AccountError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AccountError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AccountError::Hashing(format!("hashing task failed: {e}")))?
}

fn duplicate_to_taken(e: StoreError) -> AccountError {
    match e {
        StoreError::Duplicate(what) if what.starts_with("username") => AccountError::UsernameTaken,
        StoreError::Duplicate(_) => AccountError::EmailTaken,
        other => AccountError::Store(other),
    }
}
