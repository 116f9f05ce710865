//! Bearer token inspection.
//!
//! Tokens are only decoded to read their `exp` claim; signatures are the
//! backend's business.

use std::time::Duration;

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde_json::Value;

/// Renewal fires this long before expiry.
pub const RENEWAL_LEAD: Duration = Duration::from_secs(120);
/// Renewal never fires sooner than this.
pub const MIN_RENEWAL_DELAY: Duration = Duration::from_secs(5);
/// Below this many minutes the TTL is shown as an alert.
pub const EXPIRING_SOON_MINUTES: u64 = 5;

const URL_SAFE_ANY_PADDING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);
const STANDARD_ANY_PADDING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Returns the token expiry in epoch milliseconds.
///
/// `None` when the token is not three dot-separated segments, the payload
/// is not base64 JSON, or it carries no usable `exp` claim.
pub fn decode_expiry(token: &str) -> Option<i64> {
    let mut segments = token.trim().split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = URL_SAFE_ANY_PADDING
        .decode(payload)
        .or_else(|_| STANDARD_ANY_PADDING.decode(payload))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_f64()?;
    if !exp.is_finite() || exp <= 0.0 {
        return None;
    }
    Some((exp * 1000.0) as i64)
}

/// Whole minutes left before `expiry_ms`, never negative.
pub fn minutes_remaining(expiry_ms: i64, now_ms: i64) -> u64 {
    let left = expiry_ms.saturating_sub(now_ms).max(0);
    (left / 60_000) as u64
}

/// Delay before the renewal task should fire.
///
/// Two minutes ahead of expiry, but at least five seconds from now.
pub fn renewal_delay(expiry_ms: i64, now_ms: i64) -> Duration {
    let lead = RENEWAL_LEAD.as_millis() as i64;
    let floor = MIN_RENEWAL_DELAY.as_millis() as i64;
    let delay = expiry_ms.saturating_sub(now_ms).saturating_sub(lead).max(floor);
    Duration::from_millis(delay as u64)
}

/// Current wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    pub(crate) fn token_with_claims(claims: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    const NOW_MS: i64 = 1_755_000_000_000;

    #[test]
    fn decodes_exp_claim_in_millis() {
        let token = token_with_claims(r#"{"sub":"1","exp":1755000600}"#);
        assert_eq!(decode_expiry(&token), Some(1_755_000_600_000));
    }

    #[test]
    fn ten_minutes_left() {
        let exp = NOW_MS / 1000 + 600;
        let token = token_with_claims(&format!(r#"{{"exp":{exp}}}"#));
        let expiry = decode_expiry(&token).unwrap();
        let minutes = minutes_remaining(expiry, NOW_MS);
        assert!((9..=10).contains(&minutes));
    }

    #[test]
    fn expired_token_has_zero_minutes() {
        assert_eq!(minutes_remaining(NOW_MS - 1, NOW_MS), 0);
        assert_eq!(minutes_remaining(NOW_MS + 59_999, NOW_MS), 0);
        assert_eq!(minutes_remaining(NOW_MS + 60_000, NOW_MS), 1);
    }

    #[test]
    fn malformed_tokens_have_no_expiry() {
        assert_eq!(decode_expiry(""), None);
        assert_eq!(decode_expiry("abc"), None);
        assert_eq!(decode_expiry("a.b"), None);
        assert_eq!(decode_expiry("a.b.c.d"), None);
        assert_eq!(decode_expiry("a.!!!.c"), None);
        assert_eq!(
            decode_expiry(&format!("x.{}.y", URL_SAFE_NO_PAD.encode("not json"))),
            None
        );
        assert_eq!(decode_expiry(&token_with_claims(r#"{"sub":"1"}"#)), None);
        assert_eq!(decode_expiry(&token_with_claims(r#"{"exp":"soon"}"#)), None);
    }

    #[test]
    fn accepts_padded_payload() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":10}"#);
        assert!(payload.ends_with('='));
        assert_eq!(decode_expiry(&format!("h.{payload}.s")), Some(10_000));
    }

    #[test]
    fn renewal_is_two_minutes_before_expiry() {
        let delay = renewal_delay(NOW_MS + 600_000, NOW_MS);
        assert_eq!(delay, Duration::from_millis(480_000));
    }

    #[test]
    fn renewal_delay_is_floored() {
        assert_eq!(renewal_delay(NOW_MS + 60_000, NOW_MS), Duration::from_millis(5_000));
        assert_eq!(renewal_delay(NOW_MS - 60_000, NOW_MS), Duration::from_millis(5_000));
    }
}
