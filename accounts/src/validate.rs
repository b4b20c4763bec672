//! Input checks applied before any workflow touches storage.

use crate::AccountError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;

/// Trimmed; letters, digits, `_`, `-` and `.` only.
pub fn username(raw: &str) -> Result<String, AccountError> {
    let name = raw.trim();
    if !USERNAME_LEN.contains(&name.chars().count()) {
        return Err(AccountError::InvalidInput(format!(
            "username must be {} to {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AccountError::InvalidInput(
            "username may only contain letters, digits, '_', '-' and '.'".into(),
        ));
    }
    Ok(name.to_string())
}

/// Trimmed and lowercased; one `@` with a dotted domain after it.
pub fn email(raw: &str) -> Result<String, AccountError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AccountError::InvalidInput("email address is not valid".into()))
    }
}

pub fn password(raw: &str) -> Result<(), AccountError> {
    let len = raw.chars().count();
    if len < MIN_PASSWORD_LEN || len > MAX_PASSWORD_LEN {
        return Err(AccountError::InvalidInput(format!(
            "password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
