//! Verification code storage trait.

use dailyread_types::{CodeId, Timestamp, VerificationCode, VerificationKind};

use crate::StoreError;

/// Fields of a code about to be inserted; the store assigns the id.
#[derive(Clone, Debug)]
pub struct NewCode {
    pub subject: String,
    pub code: String,
    pub kind: VerificationKind,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

/// Trait for storing one-time verification codes.
///
/// Rows are never updated except for the single `used` transition, and
/// never deleted except by [`VerificationCodeStore::sweep`].
pub trait VerificationCodeStore: Send + Sync {
    fn insert_code(&self, new: NewCode) -> Result<VerificationCode, StoreError>;

    fn get_code(&self, id: CodeId) -> Result<Option<VerificationCode>, StoreError>;

    /// The newest live row matching `subject` and `code` (and `kind`, when given).
    fn find_valid(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
        now: Timestamp,
    ) -> Result<Option<VerificationCode>, StoreError>;

    /// Flip `used` to true. Returns `false` if the row was already used.
    ///
    /// Fails with [`StoreError::NotFound`] for an unknown id.
    fn mark_used(&self, id: CodeId) -> Result<bool, StoreError>;

    /// [`find_valid`](Self::find_valid) and [`mark_used`](Self::mark_used)
    /// as one atomic conditional update. At most one caller can consume a
    /// given row.
    fn consume_valid(
        &self,
        subject: &str,
        code: &str,
        kind: Option<VerificationKind>,
        now: Timestamp,
    ) -> Result<Option<VerificationCode>, StoreError>;

    /// Delete every row that is used or expired at `now`. Returns the count.
    fn sweep(&self, now: Timestamp) -> Result<u64, StoreError>;

    /// All rows for a subject, in insertion order.
    fn codes_for_subject(&self, subject: &str) -> Result<Vec<VerificationCode>, StoreError>;
}

/// Pick the row `find_valid` must return from a subject's rows.
///
/// Newest is decided by `created_at`, then by id for rows created in the
/// same second.
pub fn newest_valid<'a, I>(
    rows: I,
    code: &str,
    kind: Option<VerificationKind>,
    now: Timestamp,
) -> Option<&'a VerificationCode>
where
    I: IntoIterator<Item = &'a VerificationCode>,
{
    rows.into_iter()
        .filter(|row| row.code == code)
        .filter(|row| kind.map_or(true, |k| row.kind == k))
        .filter(|row| row.is_live(now))
        .max_by_key(|row| (row.created_at, row.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: CodeId, code: &str, kind: VerificationKind, created: u64, used: bool) -> VerificationCode {
        VerificationCode {
            id,
            subject: "reader@example.com".into(),
            code: code.into(),
            kind,
            expires_at: Timestamp::new(created + 600),
            used,
            created_at: Timestamp::new(created),
        }
    }

    #[test]
    fn prefers_newest_live_row() {
        let rows = vec![
            row(1, "111111", VerificationKind::PasswordReset, 100, false),
            row(2, "111111", VerificationKind::PasswordReset, 200, false),
            row(3, "111111", VerificationKind::PasswordReset, 300, true),
        ];
        let found = newest_valid(&rows, "111111", Some(VerificationKind::PasswordReset), Timestamp::new(350));
        assert_eq!(found.map(|r| r.id), Some(2));
    }

    #[test]
    fn same_second_ties_break_on_id() {
        let rows = vec![
            row(8, "222222", VerificationKind::RegisterEmail, 100, false),
            row(9, "222222", VerificationKind::RegisterEmail, 100, false),
        ];
        let found = newest_valid(&rows, "222222", None, Timestamp::new(101));
        assert_eq!(found.map(|r| r.id), Some(9));
    }

    #[test]
    fn kind_filter_is_optional() {
        let rows = vec![row(1, "333333", VerificationKind::ChangeEmail, 100, false)];
        assert!(newest_valid(&rows, "333333", None, Timestamp::new(101)).is_some());
        assert!(newest_valid(&rows, "333333", Some(VerificationKind::PasswordReset), Timestamp::new(101)).is_none());
    }

    #[test]
    fn expired_and_wrong_codes_never_match() {
        let rows = vec![row(1, "444444", VerificationKind::PasswordReset, 100, false)];
        assert!(newest_valid(&rows, "444444", None, Timestamp::new(700)).is_none());
        assert!(newest_valid(&rows, "444445", None, Timestamp::new(101)).is_none());
    }
}
