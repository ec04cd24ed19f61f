use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClaimsError {
    #[error("Token is not in header.payload.signature form")]
    Malformed,

    #[error("Token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Token payload is not a JSON claim set: {0}")]
    Json(#[from] serde_json::Error),
}

/// Claims carried in the access token payload.
///
/// The signature is never checked here; the server does that. The client only
/// reads the payload to learn when the token stops being useful.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiry in epoch seconds, possibly fractional. Absent or zero means
    /// the token never expires.
    #[serde(default)]
    pub exp: Option<f64>,
}

/// When a token stops being valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expiry {
    Never,
    At(DateTime<Utc>),
    /// Has an expiry, but one chrono cannot represent.
    OutOfRange(f64),
}

impl TokenClaims {
    pub fn decode(token: &str) -> Result<Self, ClaimsError> {
        let payload = token.split('.').nth(1).ok_or(ClaimsError::Malformed)?;
        if payload.is_empty() {
            return Err(ClaimsError::Malformed);
        }
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Expiry in seconds, with a zero claim treated as absent.
    fn expiry_secs(&self) -> Option<f64> {
        self.exp.filter(|exp| *exp != 0.0)
    }

    pub fn has_expiry(&self) -> bool {
        self.expiry_secs().is_some()
    }

    pub fn expiry(&self) -> Expiry {
        let Some(exp) = self.expiry_secs() else {
            return Expiry::Never;
        };
        let millis = (exp * 1000.0).floor();
        if !millis.is_finite() || millis < i64::MIN as f64 || millis > i64::MAX as f64 {
            return Expiry::OutOfRange(exp);
        }
        match DateTime::from_timestamp_millis(millis as i64) {
            Some(at) => Expiry::At(at),
            None => Expiry::OutOfRange(exp),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self.expiry() {
            Expiry::At(at) => Some(at),
            Expiry::Never | Expiry::OutOfRange(_) => None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_secs() {
            Some(exp) => now.timestamp_millis() as f64 >= exp * 1000.0,
            None => false,
        }
    }
}

/// Empty and undecodable tokens count as expired.
pub fn token_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    if token.is_empty() {
        return true;
    }
    match TokenClaims::decode(token) {
        Ok(claims) => claims.is_expired_at(now),
        Err(_) => true,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    /// Build an unsigned token around an arbitrary payload.
    pub(crate) fn make_token(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{}.{}.signature", header, body)
    }

    pub(crate) fn token_expiring_at(exp: i64) -> String {
        make_token(&serde_json::json!({"sub": 1, "email": "a@b.com", "role": "admin", "exp": exp}))
    }

    #[test]
    fn test_decode_reads_claims() {
        let token = token_expiring_at(1_900_000_000);
        let claims = TokenClaims::decode(&token).unwrap();
        assert_eq!(claims.exp, Some(1_900_000_000.0));
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.role.as_deref(), Some("admin"));
        assert_eq!(claims.sub, Some(serde_json::json!(1)));
    }

    #[test]
    fn test_decode_accepts_padded_payload() {
        let body = base64::engine::general_purpose::URL_SAFE.encode(r#"{"exp":10}"#);
        let token = format!("h.{}.s", body);
        assert_eq!(TokenClaims::decode(&token).unwrap().exp, Some(10.0));
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(TokenClaims::decode("opaque"), Err(ClaimsError::Malformed)));
        assert!(matches!(TokenClaims::decode("a..b"), Err(ClaimsError::Malformed)));
        assert!(matches!(TokenClaims::decode("a.!!!.b"), Err(ClaimsError::Base64(_))));
        let not_object = format!("a.{}.b", URL_SAFE_NO_PAD.encode("[1,2]"));
        assert!(matches!(TokenClaims::decode(&not_object), Err(ClaimsError::Json(_))));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let exp = 1_700_000_000;
        let claims = TokenClaims { exp: Some(exp as f64), ..Default::default() };
        let at = DateTime::from_timestamp(exp, 0).unwrap();

        assert!(!claims.is_expired_at(at - Duration::milliseconds(1)));
        assert!(claims.is_expired_at(at));
        assert!(claims.is_expired_at(at + Duration::seconds(1)));
    }

    #[test]
    fn test_missing_exp_never_expires() {
        let token = make_token(&serde_json::json!({"sub": 1}));
        let far_future = Utc::now() + Duration::days(365 * 100);
        assert!(!token_expired_at(&token, far_future));
        assert!(TokenClaims::decode(&token).unwrap().expires_at().is_none());
    }

    #[test]
    fn test_fractional_exp_is_honored() {
        let now = Utc::now();
        let live = make_token(&serde_json::json!({"exp": now.timestamp() as f64 + 3600.5}));
        assert!(!token_expired_at(&live, now));

        let claims = TokenClaims { exp: Some(1_700_000_000.5), ..Default::default() };
        let at = DateTime::from_timestamp_millis(1_700_000_000_500).unwrap();
        assert!(!claims.is_expired_at(at - Duration::milliseconds(1)));
        assert!(claims.is_expired_at(at));
        assert_eq!(claims.expiry(), Expiry::At(at));
    }

    #[test]
    fn test_zero_exp_never_expires() {
        let token = make_token(&serde_json::json!({"sub": 1, "exp": 0}));
        assert!(!token_expired_at(&token, Utc::now()));
        let claims = TokenClaims::decode(&token).unwrap();
        assert!(!claims.has_expiry());
        assert_eq!(claims.expiry(), Expiry::Never);
    }

    #[test]
    fn test_unrepresentable_exp_is_not_never() {
        let claims = TokenClaims { exp: Some(1e20), ..Default::default() };
        assert!(claims.has_expiry());
        assert_eq!(claims.expiry(), Expiry::OutOfRange(1e20));
        assert_eq!(claims.expires_at(), None);
        assert!(!claims.is_expired_at(Utc::now()));

        let past = TokenClaims { exp: Some(-1e20), ..Default::default() };
        assert_eq!(past.expiry(), Expiry::OutOfRange(-1e20));
        assert!(past.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_empty_and_malformed_tokens_are_expired() {
        let now = Utc::now();
        assert!(token_expired_at("", now));
        assert!(token_expired_at("garbage", now));
        assert!(!token_expired_at(&token_expiring_at(now.timestamp() + 60), now));
        assert!(token_expired_at(&token_expiring_at(now.timestamp() - 60), now));
    }
}
