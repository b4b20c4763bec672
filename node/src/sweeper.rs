//! Periodic cleanup of used or expired codes and idle sessions.
//!
//! Sweeping is housekeeping only: validation already refuses every row a
//! sweep would remove.

use std::sync::Arc;
use std::time::Duration;

use dailyread_rpc::SessionRegistry;
use dailyread_utils::spans::sweep_span;
use dailyread_verification::VerificationLedger;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::NodeError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub codes: u64,
    pub sessions: usize,
}

pub fn sweep_once(
    ledger: &VerificationLedger,
    sessions: &SessionRegistry,
    session_idle_secs: u64,
) -> Result<SweepReport, NodeError> {
    let _span = sweep_span().entered();
    let codes = ledger.sweep()?;
    let sessions = sessions.prune(session_idle_secs);
    if codes > 0 || sessions > 0 {
        tracing::info!(codes, sessions, "sweep finished");
    }
    Ok(SweepReport { codes, sessions })
}

/// Sweep every `interval` until shutdown. The first sweep runs immediately.
pub fn spawn_sweeper(
    ledger: Arc<VerificationLedger>,
    sessions: Arc<SessionRegistry>,
    interval: Duration,
    session_idle_secs: u64,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("sweep task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = sweep_once(&ledger, &sessions, session_idle_secs) {
                        tracing::warn!(error = %e, "sweep failed");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailyread_nullables::{NullClock, NullCodeStore};
    use dailyread_types::VerificationKind;
    use dailyread_verification::LedgerConfig;

    #[test]
    fn sweep_removes_expired_codes_and_idle_sessions() {
        let clock = Arc::new(NullClock::new(10_000));
        let ledger = VerificationLedger::new(Arc::new(NullCodeStore::new()), clock.clone(), LedgerConfig::default());
        let sessions = SessionRegistry::new(clock.clone());

        ledger.issue("reader@example.com", VerificationKind::PasswordReset).unwrap();
        let live = ledger
            .issue("reader@example.com", VerificationKind::RegisterEmail)
            .unwrap();
        sessions.resolve(None);

        clock.advance(3_601);
        let kept = sessions.resolve(None);
        let report = sweep_once(&ledger, &sessions, 3_600).unwrap();

        assert_eq!(report, SweepReport { codes: 1, sessions: 1 });
        assert!(sessions.get(kept.id()).is_some());
        assert!(ledger
            .validate("reader@example.com", &live.code, Some(VerificationKind::RegisterEmail))
            .is_ok());
    }

    #[tokio::test]
    async fn sweeper_stops_on_shutdown() {
        let clock = Arc::new(NullClock::new(0));
        let ledger = Arc::new(VerificationLedger::new(
            Arc::new(NullCodeStore::new()),
            clock.clone(),
            LedgerConfig::default(),
        ));
        let sessions = Arc::new(SessionRegistry::new(clock));
        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_sweeper(ledger, sessions, Duration::from_secs(3_600), 3_600, rx);
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper exited")
            .unwrap();
    }
}
