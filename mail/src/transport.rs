//! Delivery of rendered messages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dailyread_secrets::CredentialCipher;
use dailyread_store::Settings;
use serde::Serialize;

use crate::{DeliveryError, MailError, MailSettings};

/// Default timeout for relay requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A rendered message ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Accepts a rendered message for one recipient and reports the outcome.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayBody<'a> {
    sender: RelayAddress<'a>,
    to: Vec<RelayAddress<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

/// POSTs each message as JSON to the configured relay endpoint.
///
/// Settings are re-read for every message, so changes made through the
/// admin surface apply without a restart. With a username the relay is
/// called with HTTP basic auth; with only a password it is sent as an
/// `api-key` header.
pub struct HttpRelayTransport {
    http_client: reqwest::Client,
    settings: Settings,
    cipher: Arc<CredentialCipher>,
}

impl HttpRelayTransport {
    pub fn new(settings: Settings, cipher: Arc<CredentialCipher>) -> Result<Self, DeliveryError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .user_agent(concat!("dailyread/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Client(e.to_string()))?;
        Ok(Self {
            http_client,
            settings,
            cipher,
        })
    }

    fn load_settings(&self) -> Result<MailSettings, DeliveryError> {
        MailSettings::load(&self.settings, &self.cipher).map_err(|e| match e {
            MailError::Delivery(inner) => inner,
            other => DeliveryError::Settings(other.to_string()),
        })
    }
}

fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

#[async_trait]
impl MailTransport for HttpRelayTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let config = self.load_settings()?;
        if !config.enabled {
            return Err(DeliveryError::NotConfigured("mail is disabled".into()));
        }
        let (Some(endpoint), Some(from_address)) = (&config.endpoint, &config.from_address) else {
            return Err(DeliveryError::NotConfigured(
                "mail_endpoint and mail_from_address are required".into(),
            ));
        };

        let body = RelayBody {
            sender: RelayAddress {
                email: from_address,
                name: config.from_name.as_deref(),
            },
            to: vec![RelayAddress {
                email: &message.to,
                name: None,
            }],
            subject: &message.subject,
            html_content: &message.html,
        };

        let mut request = self.http_client.post(endpoint).json(&body);
        request = match (&config.username, &config.password) {
            (Some(username), password) => request.basic_auth(username, password.as_deref()),
            (None, Some(password)) => request.header("api-key", password),
            (None, None) => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DeliveryError::Unreachable(format!("request timed out: {e}"))
            } else {
                DeliveryError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if is_success_status(status) {
            tracing::debug!(status, "mail relay accepted message");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status, "mail relay rejected message");
        Err(DeliveryError::Rejected { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_body_shape() {
        let body = RelayBody {
            sender: RelayAddress {
                email: "noreply@example.com",
                name: Some("Daily Read"),
            },
            to: vec![RelayAddress {
                email: "reader@example.com",
                name: None,
            }],
            subject: "Hi",
            html_content: "<p>x</p>",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["sender"]["name"], "Daily Read");
        assert_eq!(json["to"][0]["email"], "reader@example.com");
        assert!(json["to"][0].get("name").is_none());
        assert_eq!(json["htmlContent"], "<p>x</p>");
    }

    #[test]
    fn success_range() {
        assert!(is_success_status(202));
        assert!(!is_success_status(301));
        assert!(!is_success_status(500));
    }
}
