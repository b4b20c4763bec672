//! The image challenge gate.
//!
//! State lives in the caller's session, never in the durable store. The
//! consumption rule differs from the ledger on purpose:
//!
//! | outcome  | session state |
//! |----------|---------------|
//! | match    | cleared       |
//! | expired  | cleared       |
//! | mismatch | kept          |
//!
//! so a mistyped answer can be retried until the TTL runs out.

use std::fmt;
use std::sync::Arc;

use dailyread_crypto::{challenge_code, codes_match_ignore_case};
use dailyread_types::{Clock, Timestamp};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::captcha::{render_png, CaptchaStyle};
use crate::ChallengeError;

/// A challenge waiting for an answer.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingChallenge {
    pub code: String,
    pub issued_at: Timestamp,
}

impl fmt::Debug for PendingChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingChallenge")
            .field("code", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// The slot in a caller's session that holds at most one pending challenge.
pub trait ChallengeSession {
    fn pending_challenge(&self) -> Option<&PendingChallenge>;

    /// Replace whatever challenge was pending.
    fn store_challenge(&mut self, challenge: PendingChallenge);

    fn clear_challenge(&mut self);
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub ttl_secs: u64,
    pub code_length: usize,
    pub style: CaptchaStyle,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 5 * 60,
            code_length: 4,
            style: CaptchaStyle::default(),
        }
    }
}

/// What [`ChallengeGate::issue`] hands back to the client.
#[derive(Clone, Debug)]
pub struct IssuedChallenge {
    pub png: Vec<u8>,
    pub expires_in: u64,
}

pub struct ChallengeGate {
    clock: Arc<dyn Clock>,
    config: ChallengeConfig,
}

impl ChallengeGate {
    pub fn new(clock: Arc<dyn Clock>, config: ChallengeConfig) -> Self {
        Self { clock, config }
    }

    pub fn config(&self) -> &ChallengeConfig {
        &self.config
    }

    /// Generate a code, store it in `session` and render it.
    pub fn issue<S>(&self, session: &mut S) -> Result<IssuedChallenge, ChallengeError>
    where
        S: ChallengeSession + ?Sized,
    {
        let code = challenge_code(self.config.code_length);
        let png = render_png(&code, &self.config.style, &mut StdRng::from_entropy())?;
        session.store_challenge(PendingChallenge {
            code,
            issued_at: self.clock.now(),
        });
        Ok(IssuedChallenge {
            png,
            expires_in: self.config.ttl_secs,
        })
    }

    /// Check `submitted` against the pending challenge, case-insensitively.
    ///
    /// [`ChallengeError::Expired`] and [`ChallengeError::Missing`] leave
    /// nothing behind; [`ChallengeError::Mismatch`] keeps the challenge for
    /// another attempt.
    pub fn validate<S>(&self, session: &mut S, submitted: &str) -> Result<(), ChallengeError>
    where
        S: ChallengeSession + ?Sized,
    {
        let Some(pending) = session.pending_challenge() else {
            return Err(ChallengeError::Missing);
        };

        if pending.issued_at.elapsed_since(self.clock.now()) > self.config.ttl_secs {
            session.clear_challenge();
            return Err(ChallengeError::Expired);
        }

        if !codes_match_ignore_case(&pending.code, submitted.trim()) {
            return Err(ChallengeError::Mismatch);
        }

        session.clear_challenge();
        Ok(())
    }
}
