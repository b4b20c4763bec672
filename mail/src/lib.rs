//! Outbound mail.
//!
//! The rest of the system sees only [`MailTransport`]: hand it a rendered
//! message, get back success or a typed [`DeliveryError`]. The relay
//! password is stored encrypted through the credential cipher.

pub mod error;
pub mod settings;
pub mod templates;
pub mod transport;

pub use error::{DeliveryError, MailError};
pub use settings::{MailSettings, MailUpdate};
pub use templates::{render_code_email, RenderedEmail};
pub use transport::{HttpRelayTransport, MailTransport, OutboundMessage};
