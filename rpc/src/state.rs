//! Shared state handed to every handler.

use std::sync::Arc;

use dailyread_accounts::{AccountError, AccountWorkflows};
use dailyread_sources::DailyContentService;
use dailyread_verification::ChallengeError;

use crate::{RpcError, SessionRegistry, SiteMetrics};

#[derive(Clone)]
pub struct AppState {
    pub workflows: Arc<AccountWorkflows>,
    pub daily: Arc<DailyContentService>,
    pub sessions: Arc<SessionRegistry>,
    pub metrics: Arc<SiteMetrics>,
}

impl AppState {
    pub fn new(
        workflows: Arc<AccountWorkflows>,
        daily: Arc<DailyContentService>,
        sessions: Arc<SessionRegistry>,
        metrics: Arc<SiteMetrics>,
    ) -> Self {
        Self {
            workflows,
            daily,
            sessions,
            metrics,
        }
    }

    /// Count a workflow failure and turn it into a response error.
    pub fn reject(&self, e: AccountError) -> RpcError {
        match &e {
            AccountError::Challenge(reason) => {
                self.metrics.challenges_failed.inc();
                let reason = match reason {
                    ChallengeError::Missing => "missing",
                    ChallengeError::Expired => "expired",
                    ChallengeError::Mismatch => "mismatch",
                    ChallengeError::Render(_) => "render",
                };
                tracing::debug!(reason, "challenge failed");
            }
            AccountError::CodeInvalid => self.metrics.codes_rejected.inc(),
            AccountError::DeliveryFailed(_) => self.metrics.mail_failed.inc(),
            _ => {}
        }
        RpcError::from(e)
    }
}
