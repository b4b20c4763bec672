//! Nullable mailer: record messages without sending them.

use async_trait::async_trait;
use dailyread_mail::{DeliveryError, MailTransport, OutboundMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// A test transport that records messages instead of sending them.
pub struct NullMailer {
    /// All messages "sent".
    sent_messages: Mutex<Vec<OutboundMessage>>,
    failing: AtomicBool,
}

impl NullMailer {
    pub fn new() -> Self {
        Self {
            sent_messages: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// While set, every send fails with a relay rejection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get all sent messages (for assertions).
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent_messages.lock().unwrap().clone()
    }

    pub fn last_to(&self, address: &str) -> Option<OutboundMessage> {
        self.sent_messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.to == address)
            .cloned()
    }

    /// The code in the newest message to `address`, read from its `<strong>` element.
    pub fn last_code_for(&self, address: &str) -> Option<String> {
        let message = self.last_to(address)?;
        let start = message.html.find("<strong>")? + "<strong>".len();
        let end = message.html[start..].find("</strong>")? + start;
        Some(message.html[start..end].to_string())
    }

    /// Clear all state.
    pub fn reset(&self) {
        self.sent_messages.lock().unwrap().clear();
        self.failing.store(false, Ordering::SeqCst);
    }
}

impl Default for NullMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for NullMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Rejected {
                status: 503,
                body: "null mailer is failing".into(),
            });
        }
        self.sent_messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
