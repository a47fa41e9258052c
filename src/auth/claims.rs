//! Session claims
//!
//! The typed view of a token payload: subject id and expiry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::error::TokenError;
use crate::auth::token::ClaimSet;

/// Claims carried by both access and refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id as a string)
    pub sub: String,
    /// Expiration time (Unix timestamp, UTC)
    pub exp: i64,
}

impl Claims {
    pub fn new(subject: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.into(),
            exp: expires_at.timestamp(),
        }
    }

    /// A token is stale once `exp` is at or before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn ensure_fresh(&self, now: DateTime<Utc>) -> Result<(), TokenError> {
        if self.is_expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

impl TryFrom<ClaimSet> for Claims {
    type Error = TokenError;

    fn try_from(claims: ClaimSet) -> Result<Self, Self::Error> {
        let sub = match claims.get("sub") {
            Some(Value::String(sub)) => sub.clone(),
            Some(_) => {
                return Err(TokenError::InvalidClaims("`sub` must be a string".to_string()))
            }
            None => return Err(TokenError::MissingClaims),
        };

        let exp = match claims.get("exp") {
            Some(exp) => exp.as_i64().ok_or_else(|| {
                TokenError::InvalidClaims("`exp` must be an integer timestamp".to_string())
            })?,
            None => return Err(TokenError::MissingClaims),
        };

        Ok(Self { sub, exp })
    }
}
