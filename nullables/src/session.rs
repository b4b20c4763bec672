//! Nullable session: a bare challenge slot.

use dailyread_verification::{ChallengeSession, PendingChallenge};

#[derive(Debug, Default)]
pub struct NullSession {
    challenge: Option<PendingChallenge>,
}

impl NullSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The code a human would read off the image.
    pub fn pending_code(&self) -> Option<String> {
        self.challenge.as_ref().map(|c| c.code.clone())
    }
}

impl ChallengeSession for NullSession {
    fn pending_challenge(&self) -> Option<&PendingChallenge> {
        self.challenge.as_ref()
    }

    fn store_challenge(&mut self, challenge: PendingChallenge) {
        self.challenge = Some(challenge);
    }

    fn clear_challenge(&mut self) {
        self.challenge = None;
    }
}
