//! Call-site authentication of bearer credentials
//!
//! The engine only proves a token is authentic and carries `sub`/`exp`.
//! Everything that accepts a token from a client goes through here so the
//! freshness check is never skipped.

use chrono::{DateTime, Utc};

use crate::auth::claims::Claims;
use crate::auth::error::TokenError;
use crate::auth::token::TokenEngine;

/// Pull the credential out of an `Authorization` header value
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verify `token` and reject it unless `exp` is still in the future at `now`
pub fn authenticate(
    engine: &TokenEngine,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Claims, TokenError> {
    let claims = Claims::try_from(engine.decode_and_validate_claims(token)?)?;
    claims.ensure_fresh(now)?;
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::JwtSettings;
    use chrono::Duration;

    fn engine() -> TokenEngine {
        TokenEngine::new(&JwtSettings {
            secret: "bearer-test-secret".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 5,
            refresh_token_expire_days: 1,
        })
        .unwrap()
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Bearer"), None);
    }

    #[test]
    fn fresh_token_authenticates() {
        let engine = engine();
        let now = Utc::now();
        let issued = engine.issue_token_pair_at(9, true, now).unwrap();

        let claims = authenticate(&engine, issued.access_token(), now).unwrap();
        assert_eq!(claims.sub, "9");
    }

    #[test]
    fn expired_token_is_rejected() {
        let engine = engine();
        let issued_at = Utc::now() - Duration::hours(1);
        let issued = engine.issue_token_pair_at(9, true, issued_at).unwrap();

        assert_eq!(
            authenticate(&engine, issued.access_token(), Utc::now()),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn signature_failures_pass_through() {
        assert_eq!(
            authenticate(&engine(), "abc", Utc::now()),
            Err(TokenError::MalformedToken)
        );
    }
}
