//! The verification code ledger.
//!
//! One engine for every out-of-band code: email ownership at registration,
//! email change, and password reset. Rows are keyed by `(subject, kind)`;
//! issuing never revokes older codes, because validation always prefers the
//! newest live row and every row is single-use.

use std::fmt;
use std::sync::Arc;

use dailyread_crypto::numeric_code;
use dailyread_store::{NewCode, VerificationCodeStore};
use dailyread_types::{Clock, CodeId, Timestamp, VerificationCode, VerificationKind};
use serde::{Deserialize, Serialize};

use crate::VerificationError;

/// Code length and per-kind lifetimes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub code_length: usize,
    pub register_email_ttl_secs: u64,
    pub change_email_ttl_secs: u64,
    pub password_reset_ttl_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            register_email_ttl_secs: 24 * 60 * 60,
            change_email_ttl_secs: 24 * 60 * 60,
            password_reset_ttl_secs: 10 * 60,
        }
    }
}

impl LedgerConfig {
    pub fn ttl_for(&self, kind: VerificationKind) -> u64 {
        match kind {
            VerificationKind::RegisterEmail => self.register_email_ttl_secs,
            VerificationKind::ChangeEmail => self.change_email_ttl_secs,
            VerificationKind::PasswordReset => self.password_reset_ttl_secs,
        }
    }
}

/// A freshly issued code, handed to the caller for delivery.
#[derive(Clone)]
pub struct IssuedCode {
    pub id: CodeId,
    pub code: String,
    pub kind: VerificationKind,
    pub expires_at: Timestamp,
    pub ttl_secs: u64,
}

impl fmt::Debug for IssuedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCode")
            .field("id", &self.id)
            .field("code", &"<redacted>")
            .field("kind", &self.kind)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Canonical subject form: surrounding whitespace dropped, lowercased.
pub fn normalize_subject(subject: &str) -> String {
    subject.trim().to_lowercase()
}

pub struct VerificationLedger {
    store: Arc<dyn VerificationCodeStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl VerificationLedger {
    pub fn new(store: Arc<dyn VerificationCodeStore>, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        Self { store, clock, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Issue a code with the configured lifetime for `kind`.
    pub fn issue(&self, subject: &str, kind: VerificationKind) -> Result<IssuedCode, VerificationError> {
        self.issue_with_ttl(subject, kind, self.config.ttl_for(kind))
    }

    pub fn issue_with_ttl(
        &self,
        subject: &str,
        kind: VerificationKind,
        ttl_secs: u64,
    ) -> Result<IssuedCode, VerificationError> {
        let subject = normalize_subject(subject);
        let now = self.clock.now();
        let row = self.store.insert_code(NewCode {
            subject,
            code: numeric_code(self.config.code_length),
            kind,
            created_at: now,
            expires_at: now.plus_secs(ttl_secs),
        })?;
        tracing::debug!(id = row.id, subject = %row.subject, %kind, ttl_secs, "verification code issued");
        Ok(IssuedCode {
            id: row.id,
            code: row.code,
            kind,
            expires_at: row.expires_at,
            ttl_secs,
        })
    }

    /// Find the newest live row matching `subject` and `code`.
    ///
    /// `kind: None` matches any kind. The row stays live until
    /// [`mark_used`](Self::mark_used) is called on the returned id, so two
    /// concurrent validations can both succeed; use [`consume`](Self::consume)
    /// when exclusive consumption matters.
    pub fn validate(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
    ) -> Result<VerificationCode, VerificationError> {
        let subject = normalize_subject(subject);
        let found = self
            .store
            .find_valid(&subject, code.trim(), kind, self.clock.now())?;
        match found {
            Some(row) => Ok(row),
            None => {
                tracing::debug!(subject = %subject, "verification code rejected");
                Err(VerificationError::CodeInvalid)
            }
        }
    }

    /// Mark a row used. Returns `false` if it already was.
    pub fn mark_used(&self, id: CodeId) -> Result<bool, VerificationError> {
        Ok(self.store.mark_used(id)?)
    }

    /// Validate and mark used in one atomic step.
    pub fn consume(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
    ) -> Result<VerificationCode, VerificationError> {
        let subject = normalize_subject(subject);
        self.store
            .consume_valid(&subject, code.trim(), kind, self.clock.now())?
            .ok_or_else(|| {
                tracing::debug!(subject = %subject, "verification code rejected");
                VerificationError::CodeInvalid
            })
    }

    /// Delete used and expired rows. Never needed for correctness.
    pub fn sweep(&self) -> Result<u64, VerificationError> {
        let removed = self.store.sweep(self.clock.now())?;
        if removed > 0 {
            tracing::info!(removed, "swept verification codes");
        }
        Ok(removed)
    }
}
