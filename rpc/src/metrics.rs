//! Prometheus metrics for the site.
//!
//! [`SiteMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the text exposition format.

use prometheus::{register_int_counter_with_registry, Encoder, IntCounter, Opts, Registry, TextEncoder};

use crate::RpcError;

pub struct SiteMetrics {
    pub registry: Registry,

    /// Code requests that were accepted (issued, or silently skipped for an unknown address).
    pub codes_issued: IntCounter,
    pub codes_rejected: IntCounter,
    pub challenges_issued: IntCounter,
    /// Missing, expired and mismatched challenge answers.
    pub challenges_failed: IntCounter,
    pub source_attempts_failed: IntCounter,
    /// Daily fetches that found no usable source.
    pub daily_exhausted: IntCounter,
    pub mail_failed: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name} counter: {e}"))
}

impl SiteMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let codes_issued = counter(
            &registry,
            "dailyread_codes_issued_total",
            "Verification code requests accepted",
        );
        let codes_rejected = counter(
            &registry,
            "dailyread_codes_rejected_total",
            "Verification codes rejected as invalid, used or expired",
        );
        let challenges_issued = counter(
            &registry,
            "dailyread_challenges_issued_total",
            "Image challenges issued",
        );
        let challenges_failed = counter(
            &registry,
            "dailyread_challenges_failed_total",
            "Image challenge answers that were missing, expired or wrong",
        );
        let source_attempts_failed = counter(
            &registry,
            "dailyread_source_attempts_failed_total",
            "Content source attempts that failed and fell through",
        );
        let daily_exhausted = counter(
            &registry,
            "dailyread_daily_exhausted_total",
            "Daily content requests with no usable source",
        );
        let mail_failed = counter(
            &registry,
            "dailyread_mail_failed_total",
            "Verification mails the relay did not accept",
        );

        Self {
            registry,
            codes_issued,
            codes_rejected,
            challenges_issued,
            challenges_failed,
            source_attempts_failed,
            daily_exhausted,
            mail_failed,
        }
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| RpcError::Internal(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| RpcError::Internal(e.to_string()))
    }
}

impl Default for SiteMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = SiteMetrics::new();
        metrics.codes_issued.inc();
        metrics.source_attempts_failed.inc_by(2);
        let text = metrics.encode().unwrap();
        assert!(text.contains("dailyread_codes_issued_total 1"));
        assert!(text.contains("dailyread_source_attempts_failed_total 2"));
        assert!(text.contains("dailyread_mail_failed_total 0"));
    }

    #[test]
    fn registries_are_independent() {
        let a = SiteMetrics::new();
        let b = SiteMetrics::new();
        a.challenges_issued.inc();
        assert_eq!(b.challenges_issued.get(), 0);
    }
}
