//! Token failure taxonomy
//!
//! Every variant except `Configuration` is a client fault and must surface
//! to the transport as a generic "unauthenticated" response.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Deployment misconfiguration (unsupported algorithm, empty secret, bad lifetimes)
    #[error("token engine misconfigured: {0}")]
    Configuration(String),

    #[error("token must have exactly three non-empty segments")]
    MalformedToken,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token payload is not a base64url-encoded JSON object")]
    InvalidPayload,

    #[error("token is missing required claims")]
    MissingClaims,

    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    /// Raised by callers enforcing freshness; `decode` never reads the clock
    #[error("token has expired")]
    Expired,
}

impl TokenError {
    /// Short machine-readable name, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::Configuration(_) => "configuration",
            TokenError::MalformedToken => "malformed_token",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::InvalidPayload => "invalid_payload",
            TokenError::MissingClaims => "missing_claims",
            TokenError::InvalidClaims(_) => "invalid_claims",
            TokenError::Expired => "expired",
        }
    }

    pub fn is_client_fault(&self) -> bool {
        !matches!(self, TokenError::Configuration(_))
    }
}
