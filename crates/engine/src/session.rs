use crate::token::{self, EXPIRING_SOON_MINUTES};

/// Authentication state of the dashboard.
///
/// Created on login, updated on refresh, cleared on logout. Every write
/// replaces whole fields so a renewal landing mid-fetch never leaves a
/// half-updated session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_ms: Option<i64>,
}

impl Session {
    pub fn from_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        let access_token = access_token.into().trim().to_string();
        Self {
            expires_at_ms: token::decode_expiry(&access_token),
            access_token,
            refresh_token: refresh_token.into().trim().to_string(),
        }
    }

    /// Swaps the access token after a refresh, keeping the refresh token.
    pub fn replace_access_token(&mut self, access_token: impl Into<String>) {
        let access_token = access_token.into().trim().to_string();
        self.expires_at_ms = token::decode_expiry(&access_token);
        self.access_token = access_token;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Minutes left on the access token, `None` when no expiry is known.
    pub fn ttl_minutes(&self, now_ms: i64) -> Option<u64> {
        self.expires_at_ms
            .map(|expiry| token::minutes_remaining(expiry, now_ms))
    }

    pub fn is_expiring(&self, now_ms: i64) -> bool {
        self.ttl_minutes(now_ms)
            .is_some_and(|minutes| minutes < EXPIRING_SOON_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tests::token_with_claims;

    #[test]
    fn login_decodes_expiry() {
        let session = Session::from_tokens(token_with_claims(r#"{"exp":2000}"#), " refresh ");
        assert_eq!(session.expires_at_ms, Some(2_000_000));
        assert_eq!(session.refresh_token, "refresh");
        assert!(session.is_authenticated());
        assert!(session.has_refresh_token());
    }

    #[test]
    fn opaque_token_has_no_ttl() {
        let session = Session::from_tokens("dev-token", "");
        assert_eq!(session.expires_at_ms, None);
        assert_eq!(session.ttl_minutes(0), None);
        assert!(!session.is_expiring(0));
        assert!(!session.has_refresh_token());
    }

    #[test]
    fn refresh_keeps_refresh_token() {
        let mut session = Session::from_tokens(token_with_claims(r#"{"exp":1}"#), "r1");
        session.replace_access_token(token_with_claims(r#"{"exp":3600}"#));
        assert_eq!(session.refresh_token, "r1");
        assert_eq!(session.ttl_minutes(0), Some(60));
        assert!(!session.is_expiring(0));
        assert!(session.is_expiring(3_400_000));
    }

    #[test]
    fn clear_wipes_everything() {
        let mut session = Session::from_tokens(token_with_claims(r#"{"exp":1}"#), "r1");
        session.clear();
        assert_eq!(session, Session::default());
        assert!(!session.is_authenticated());
    }
}
