//! Compact signed tokens
//!
//! Hand-rolled HS256 JWTs: `base64url(header).base64url(claims).base64url(hmac)`.
//! Header and claims are serialized canonically so the same claims always
//! produce byte-identical tokens for a given key.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::algorithm::SigningAlgorithm;
use crate::auth::claims::Claims;
use crate::auth::encoding::{base64url_decode, base64url_encode, canonical_json};
use crate::auth::error::TokenError;
use crate::configuration::JwtSettings;

type HmacSha256 = Hmac<Sha256>;

/// Decoded, signature-checked claims. Untyped: freshness is not checked.
pub type ClaimSet = Map<String, Value>;

const TOKEN_TYPE: &str = "JWT";

/// Upper bound for either lifetime (100 years)
const MAX_LIFETIME_DAYS: i64 = 36_500;

/// Access and refresh tokens minted from the same instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of [`TokenEngine::issue_token_pair`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedTokens {
    AccessOnly(String),
    Pair(TokenPair),
}

impl IssuedTokens {
    pub fn access_token(&self) -> &str {
        match self {
            IssuedTokens::AccessOnly(token) => token,
            IssuedTokens::Pair(pair) => &pair.access_token,
        }
    }

    pub fn into_pair(self) -> Option<TokenPair> {
        match self {
            IssuedTokens::AccessOnly(_) => None,
            IssuedTokens::Pair(pair) => Some(pair),
        }
    }
}

/// Stateless token encoder/verifier.
///
/// Built once from [`JwtSettings`]; construction is where configuration is
/// validated, so `encode` and `decode` never fail for configuration reasons.
/// Cloning is cheap enough to hand one to every worker.
#[derive(Clone)]
pub struct TokenEngine {
    algorithm: SigningAlgorithm,
    // keyed once, cloned per signature
    mac: HmacSha256,
    header_b64: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenEngine {
    /// Validate `settings` and build the engine.
    ///
    /// # Errors
    /// Returns `TokenError::Configuration` if the algorithm is not `HS256`,
    /// the secret is empty, or either lifetime is not positive or exceeds
    /// 100 years.
    pub fn new(settings: &JwtSettings) -> Result<Self, TokenError> {
        let algorithm: SigningAlgorithm = settings.algorithm.parse()?;

        if settings.secret.is_empty() {
            return Err(TokenError::Configuration(
                "signing secret must not be empty".to_string(),
            ));
        }

        let access_ttl = positive_lifetime(
            "access_token_expire_minutes",
            settings.access_token_expire_minutes,
            Duration::try_minutes,
        )?;
        let refresh_ttl = positive_lifetime(
            "refresh_token_expire_days",
            settings.refresh_token_expire_days,
            Duration::try_days,
        )?;

        let mac = HmacSha256::new_from_slice(settings.secret.as_bytes())
            .map_err(|e| TokenError::Configuration(format!("invalid signing key: {}", e)))?;

        let header = canonical_json(&json!({ "alg": algorithm.as_str(), "typ": TOKEN_TYPE }))
            .map_err(|e| TokenError::Configuration(format!("header serialization: {}", e)))?;

        Ok(Self {
            algorithm,
            mac,
            header_b64: base64url_encode(&header),
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn access_token_lifetime(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_token_lifetime(&self) -> Duration {
        self.refresh_ttl
    }

    /// Sign `claims` into a compact token.
    ///
    /// # Errors
    /// `TokenError::InvalidClaims` if `claims` does not serialize to a JSON object.
    pub fn encode<C: Serialize + ?Sized>(&self, claims: &C) -> Result<String, TokenError> {
        let claims = serde_json::to_value(claims)
            .map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
        if !claims.is_object() {
            return Err(TokenError::InvalidClaims(
                "claims must be a JSON object".to_string(),
            ));
        }

        let payload =
            canonical_json(&claims).map_err(|e| TokenError::InvalidClaims(e.to_string()))?;
        let signing_input = format!("{}.{}", self.header_b64, base64url_encode(&payload));
        let signature = self.sign(signing_input.as_bytes());

        Ok(format!("{}.{}", signing_input, base64url_encode(&signature)))
    }

    /// Verify the signature of `token` and return its claims.
    ///
    /// The signature is checked before the payload is looked at. Expiry is
    /// not checked here.
    pub fn decode(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let (signing_input, payload_b64, signature_b64) = split_token(token)?;

        let provided =
            base64url_decode(signature_b64).map_err(|_| TokenError::InvalidSignature)?;
        let expected = self.sign(signing_input.as_bytes());
        if !bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
            return Err(TokenError::InvalidSignature);
        }

        let payload = base64url_decode(payload_b64).map_err(|_| TokenError::InvalidPayload)?;
        match serde_json::from_slice::<Value>(&payload) {
            Ok(Value::Object(claims)) => Ok(claims),
            _ => Err(TokenError::InvalidPayload),
        }
    }

    /// [`decode`](Self::decode), then require `sub` and `exp` to be present.
    ///
    /// Comparing `exp` against the clock is left to the caller.
    pub fn decode_and_validate_claims(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let claims = self.decode(token)?;
        if !claims.contains_key("sub") || !claims.contains_key("exp") {
            return Err(TokenError::MissingClaims);
        }
        Ok(claims)
    }

    /// Mint an access token, and unless `access_only`, a refresh token for `subject`.
    pub fn issue_token_pair(
        &self,
        subject: impl fmt::Display,
        access_only: bool,
    ) -> Result<IssuedTokens, TokenError> {
        self.issue_token_pair_at(subject, access_only, Utc::now())
    }

    /// Like [`issue_token_pair`](Self::issue_token_pair) with an explicit `now`.
    /// Both expiries are derived from the same instant.
    pub fn issue_token_pair_at(
        &self,
        subject: impl fmt::Display,
        access_only: bool,
        now: DateTime<Utc>,
    ) -> Result<IssuedTokens, TokenError> {
        let subject = subject.to_string();

        let access_token = self.encode(&Claims::new(
            subject.clone(),
            expiry_after(now, self.access_ttl)?,
        ))?;
        if access_only {
            return Ok(IssuedTokens::AccessOnly(access_token));
        }

        let refresh_token =
            self.encode(&Claims::new(subject, expiry_after(now, self.refresh_ttl)?))?;
        Ok(IssuedTokens::Pair(TokenPair {
            access_token,
            refresh_token,
        }))
    }

    fn sign(&self, signing_input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(signing_input);
        mac.finalize().into_bytes().to_vec()
    }
}

impl fmt::Debug for TokenEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEngine")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// Split into (`header.payload`, payload, signature), requiring exactly three
/// non-empty segments.
fn split_token(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut segments = token.split('.');
    match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            let signing_input = &token[..header.len() + 1 + payload.len()];
            Ok((signing_input, payload, signature))
        }
        _ => Err(TokenError::MalformedToken),
    }
}

fn positive_lifetime(
    name: &str,
    value: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, TokenError> {
    if value <= 0 {
        return Err(TokenError::Configuration(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    let lifetime = to_duration(value)
        .ok_or_else(|| TokenError::Configuration(format!("{} is out of range", name)))?;
    if lifetime > Duration::days(MAX_LIFETIME_DAYS) {
        return Err(TokenError::Configuration(format!(
            "{} exceeds the maximum of {} days",
            name, MAX_LIFETIME_DAYS
        )));
    }
    Ok(lifetime)
}

fn expiry_after(now: DateTime<Utc>, lifetime: Duration) -> Result<DateTime<Utc>, TokenError> {
    now.checked_add_signed(lifetime).ok_or_else(|| {
        TokenError::Configuration("token expiry is outside the representable range".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            algorithm: "HS256".to_string(),
            access_token_expire_minutes: 15,
            refresh_token_expire_days: 7,
        }
    }

    fn engine() -> TokenEngine {
        TokenEngine::new(&get_test_config()).expect("Failed to build engine")
    }

    fn sample_claims() -> ClaimSet {
        let mut claims = ClaimSet::new();
        claims.insert("sub".to_string(), json!("42"));
        claims.insert("exp".to_string(), json!(1_900_000_000_i64));
        claims
    }

    #[test]
    fn rejects_unsupported_algorithm_at_construction() {
        let mut config = get_test_config();
        config.algorithm = "RS256".to_string();

        let err = TokenEngine::new(&config).unwrap_err();
        assert!(matches!(err, TokenError::Configuration(_)));
    }

    #[test]
    fn rejects_empty_secret() {
        let mut config = get_test_config();
        config.secret = String::new();

        assert!(matches!(
            TokenEngine::new(&config),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_non_positive_lifetimes() {
        let mut config = get_test_config();
        config.access_token_expire_minutes = 0;
        assert!(matches!(
            TokenEngine::new(&config),
            Err(TokenError::Configuration(_))
        ));

        let mut config = get_test_config();
        config.refresh_token_expire_days = -1;
        assert!(matches!(
            TokenEngine::new(&config),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_lifetimes_beyond_the_cap() {
        let mut config = get_test_config();
        config.refresh_token_expire_days = 100_000_000;
        assert!(matches!(
            TokenEngine::new(&config),
            Err(TokenError::Configuration(_))
        ));

        let mut config = get_test_config();
        config.access_token_expire_minutes = i64::MAX;
        assert!(matches!(
            TokenEngine::new(&config),
            Err(TokenError::Configuration(_))
        ));

        let mut config = get_test_config();
        config.refresh_token_expire_days = MAX_LIFETIME_DAYS;
        let engine = TokenEngine::new(&config).unwrap();
        assert!(engine.issue_token_pair(42, false).is_ok());
    }

    #[test]
    fn issuing_near_the_end_of_time_errors_instead_of_panicking() {
        let engine = engine();
        let now = DateTime::<Utc>::MAX_UTC - Duration::minutes(1);

        assert!(matches!(
            engine.issue_token_pair_at(42, true, now),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn header_segment_is_the_fixed_hs256_header() {
        let token = engine().encode(&sample_claims()).unwrap();
        let header = token.split('.').next().unwrap();

        assert_eq!(header, "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9");
    }

    #[test]
    fn encode_then_decode_returns_claims() {
        let engine = engine();
        let claims = sample_claims();

        let token = engine.encode(&claims).unwrap();
        assert_eq!(engine.decode(&token).unwrap(), claims);
    }

    #[test]
    fn encoding_is_independent_of_key_order() {
        let engine = engine();
        let forward = engine.encode(&json!({"sub": "42", "exp": 10, "role": "admin"})).unwrap();
        let backward = engine.encode(&json!({"role": "admin", "exp": 10, "sub": "42"})).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn encode_rejects_non_object_claims() {
        let err = engine().encode(&json!(["sub", "42"])).unwrap_err();
        assert!(matches!(err, TokenError::InvalidClaims(_)));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = engine().encode(&sample_claims()).unwrap();

        let mut other = get_test_config();
        other.secret = "a-completely-different-signing-secret".to_string();
        let other = TokenEngine::new(&other).unwrap();

        assert_eq!(other.decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn malformed_segment_counts() {
        let engine = engine();
        for token in ["abc", "a.b", "a.b.c.d", "a..c", ".b.c", "a.b.", ""] {
            assert_eq!(
                engine.decode(token),
                Err(TokenError::MalformedToken),
                "{token:?} was not malformed"
            );
        }
    }

    #[test]
    fn forged_signature_fails_before_payload_is_parsed() {
        assert_eq!(engine().decode("a.b.c"), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn correctly_signed_garbage_payload_is_invalid_payload() {
        let engine = engine();
        for payload in ["!!!", "bm90IGpzb24", "WzEsMl0"] {
            let signing_input = format!("{}.{}", engine.header_b64, payload);
            let signature = base64url_encode(&engine.sign(signing_input.as_bytes()));
            let token = format!("{}.{}", signing_input, signature);

            assert_eq!(
                engine.decode(&token),
                Err(TokenError::InvalidPayload),
                "payload {payload:?}"
            );
        }
    }

    #[test]
    fn padded_signature_is_accepted() {
        let engine = engine();
        // 32-byte HMAC encodes to 43 chars; one '=' restores the padding
        let token = format!("{}=", engine.encode(&sample_claims()).unwrap());

        assert_eq!(engine.decode(&token).unwrap(), sample_claims());
    }

    #[test]
    fn missing_claims_are_rejected() {
        let engine = engine();

        let no_exp = engine.encode(&json!({"sub": "42"})).unwrap();
        assert_eq!(
            engine.decode_and_validate_claims(&no_exp),
            Err(TokenError::MissingClaims)
        );

        let no_sub = engine.encode(&json!({"exp": 10})).unwrap();
        assert_eq!(
            engine.decode_and_validate_claims(&no_sub),
            Err(TokenError::MissingClaims)
        );

        let complete = engine.encode(&sample_claims()).unwrap();
        assert!(engine.decode_and_validate_claims(&complete).is_ok());
    }

    #[test]
    fn validate_does_not_check_expiry() {
        let engine = engine();
        let stale = engine.encode(&json!({"sub": "42", "exp": 0})).unwrap();

        assert!(engine.decode_and_validate_claims(&stale).is_ok());
    }

    #[test]
    fn issue_pair_binds_subject_and_orders_expiry() {
        let engine = engine();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

        let pair = engine
            .issue_token_pair_at(42, false, now)
            .unwrap()
            .into_pair()
            .expect("expected a pair");
        assert_ne!(pair.access_token, pair.refresh_token);

        let access = engine.decode_and_validate_claims(&pair.access_token).unwrap();
        let refresh = engine.decode_and_validate_claims(&pair.refresh_token).unwrap();

        assert_eq!(access["sub"], json!("42"));
        assert_eq!(refresh["sub"], json!("42"));
        assert_eq!(access["exp"], json!(now.timestamp() + 15 * 60));
        assert_eq!(refresh["exp"], json!(now.timestamp() + 7 * 24 * 60 * 60));
    }

    #[test]
    fn issue_access_only_returns_single_token() {
        let engine = engine();
        let issued = engine.issue_token_pair(42, true).unwrap();

        assert!(matches!(issued, IssuedTokens::AccessOnly(_)));
        let claims = engine.decode_and_validate_claims(issued.access_token()).unwrap();
        assert_eq!(claims["sub"], json!("42"));
        assert!(issued.into_pair().is_none());
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let rendered = format!("{:?}", engine());
        assert!(!rendered.contains("test-secret-key"));
    }
}
