//! Time-boxed credentials.
//!
//! Two mechanisms share this crate:
//! 1. The **ledger** issues durable, single-use codes keyed by subject and
//!    [`VerificationKind`](dailyread_types::VerificationKind), delivered out of band.
//! 2. The **challenge** is an image code held in the caller's session. A wrong
//!    guess leaves it in place; success or expiry clears it.

pub mod captcha;
pub mod challenge;
pub mod error;
mod glyphs;
pub mod ledger;

pub use captcha::{render_png, CaptchaStyle};
pub use challenge::{ChallengeConfig, ChallengeGate, ChallengeSession, IssuedChallenge, PendingChallenge};
pub use error::{ChallengeError, VerificationError};
pub use ledger::{normalize_subject, IssuedCode, LedgerConfig, VerificationLedger};
