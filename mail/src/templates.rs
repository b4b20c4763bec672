//! Message bodies for verification codes.

use dailyread_types::VerificationKind;
use dailyread_utils::format_duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Render the email carrying `code`. `ttl_secs` is shown as a lifetime.
pub fn render_code_email(kind: VerificationKind, code: &str, ttl_secs: u64) -> RenderedEmail {
    let (subject, intro) = match kind {
        VerificationKind::RegisterEmail => (
            "Confirm your email address",
            "Use this code to finish creating your account.",
        ),
        VerificationKind::ChangeEmail => (
            "Confirm your new email address",
            "Use this code to confirm the change of your account email.",
        ),
        VerificationKind::PasswordReset => (
            "Reset your password",
            "Use this code to choose a new password. If you did not ask for a reset, ignore this message.",
        ),
    };
    let lifetime = format_duration(ttl_secs);
    let html = format!(
        "<div style=\"font-family:sans-serif\">\
         <p>{intro}</p>\
         <p style=\"font-size:24px;letter-spacing:4px\"><strong>{code}</strong></p>\
         <p>This code expires in {lifetime} and can be used once.</p>\
         </div>"
    );
    RenderedEmail {
        subject: subject.to_string(),
        html,
    }
}
