//! Server-side session slots.
//!
//! A client names its session with the [`SESSION_HEADER`]. An absent or
//! unknown id gets a freshly minted one; clients cannot choose their own.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::http::HeaderName;
use dailyread_types::{AccountId, Clock, Timestamp};
use dailyread_verification::{ChallengeSession, PendingChallenge};
use rand::RngCore;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

const SESSION_ID_BYTES: usize = 16;

/// Per-client state: at most one pending challenge and the logged-in account.
#[derive(Debug, Default)]
pub struct SessionState {
    challenge: Option<PendingChallenge>,
    pub user_id: Option<AccountId>,
}

impl ChallengeSession for SessionState {
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

/// A handle on one session slot.
///
/// The slot is behind an async mutex so a workflow can hold it across the
/// mail send without blocking other sessions.
#[derive(Clone)]
pub struct Session {
    id: String,
    state: Arc<AsyncMutex<SessionState>>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }
}

struct SessionEntry {
    state: Arc<AsyncMutex<SessionState>>,
    last_seen: Timestamp,
}

pub struct SessionRegistry {
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Look up the presented id, or mint a new session.
    pub fn resolve(&self, presented: Option<&str>) -> Session {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = presented {
            if let Some(entry) = sessions.get_mut(id) {
                entry.last_seen = now;
                return Session {
                    id: id.to_string(),
                    state: Arc::clone(&entry.state),
                };
            }
        }

        let id = mint_id();
        let state = Arc::new(AsyncMutex::new(SessionState::default()));
        sessions.insert(
            id.clone(),
            SessionEntry {
                state: Arc::clone(&state),
                last_seen: now,
            },
        );
        tracing::debug!(sessions = sessions.len(), "session created");
        Session { id, state }
    }

    /// Fetch an existing session without touching it.
    pub fn get(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).map(|entry| Session {
            id: id.to_string(),
            state: Arc::clone(&entry.state),
        })
    }

    /// Drop sessions idle for more than `idle_secs`. Returns how many went.
    pub fn prune(&self, idle_secs: u64) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed_since(now) <= idle_secs);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn mint_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct StepClock(AtomicU64);

    impl Clock for StepClock {
        fn now(&self) -> Timestamp {
            Timestamp::new(self.0.load(Ordering::SeqCst))
        }
    }

    fn registry() -> (Arc<StepClock>, SessionRegistry) {
        let clock = Arc::new(StepClock(AtomicU64::new(1_000)));
        let registry = SessionRegistry::new(clock.clone());
        (clock, registry)
    }

    #[test]
    fn known_ids_resolve_to_the_same_slot() {
        let (_, registry) = registry();
        let first = registry.resolve(None);
        let again = registry.resolve(Some(first.id()));
        assert_eq!(first.id(), again.id());
        assert!(Arc::ptr_eq(&first.state, &again.state));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_ids_are_replaced() {
        let (_, registry) = registry();
        let session = registry.resolve(Some("chosen-by-client"));
        assert_ne!(session.id(), "chosen-by-client");
        assert_eq!(session.id().len(), SESSION_ID_BYTES * 2);
    }

    #[test]
    fn prune_drops_idle_sessions_only() {
        let (clock, registry) = registry();
        let idle = registry.resolve(None);
        clock.0.store(1_500, Ordering::SeqCst);
        let active = registry.resolve(None);

        clock.0.store(2_001, Ordering::SeqCst);
        assert_eq!(registry.prune(1_000), 1);
        assert!(registry.get(idle.id()).is_none());
        assert!(registry.get(active.id()).is_some());
    }

    #[tokio::test]
    async fn slot_holds_user_and_challenge() {
        let (_, registry) = registry();
        let session = registry.resolve(None);
        {
            let mut slot = session.lock().await;
            slot.user_id = Some(7);
            slot.store_challenge(PendingChallenge {
                code: "ab12".into(),
                issued_at: Timestamp::new(1_000),
            });
        }
        let slot = registry.get(session.id()).unwrap();
        let slot = slot.lock().await;
        assert_eq!(slot.user_id, Some(7));
        assert_eq!(slot.pending_challenge().map(|c| c.code.as_str()), Some("ab12"));
    }
}
