use chrono::{DateTime, Duration, Utc};

/// Cached token plus its expiry metadata.
///
/// `replace_at` is `expires_at - refresh_buffer`. Both are `None` for tokens
/// that never expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub value: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub replace_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Record for a token that is never refreshed
    pub fn never_expiring(value: String) -> Self {
        Self {
            value,
            expires_at: None,
            replace_at: None,
        }
    }

    /// Record for a token that must be replaced `refresh_buffer` before `expires_at`
    pub fn expiring(value: String, expires_at: DateTime<Utc>, refresh_buffer: Duration) -> Self {
        // a negative buffer would move replace_at past expires_at
        let refresh_buffer = refresh_buffer.max(Duration::zero());
        Self {
            value,
            expires_at: Some(expires_at),
            replace_at: Some(
                expires_at
                    .checked_sub_signed(refresh_buffer)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
        }
    }

    /// Check if the token should be replaced at `now`
    pub fn should_replace(&self, now: DateTime<Utc>) -> bool {
        self.replace_at.is_some_and(|replace_at| now >= replace_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_at_is_expiry_minus_buffer() {
        let expires_at = Utc::now() + Duration::seconds(60);
        let record = TokenRecord::expiring("tok".into(), expires_at, Duration::seconds(20));

        assert_eq!(record.replace_at, Some(expires_at - Duration::seconds(20)));
        assert!(record.replace_at <= record.expires_at);
        assert!(!record.should_replace(expires_at - Duration::seconds(21)));
        assert!(record.should_replace(expires_at - Duration::seconds(20)));
    }

    #[test]
    fn never_expiring_record_is_never_replaced() {
        let record = TokenRecord::never_expiring("static".into());
        assert!(!record.should_replace(Utc::now() + Duration::days(3650)));
    }
}
