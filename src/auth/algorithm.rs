//! Supported signing algorithms
//!
//! Only HMAC-SHA256 is accepted. The configured name is parsed once, when the
//! token engine is built, so a bad deployment fails at startup rather than per
//! request.

use std::fmt;
use std::str::FromStr;

use crate::auth::error::TokenError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    HS256,
}

impl SigningAlgorithm {
    /// Value of the `alg` header field
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(SigningAlgorithm::HS256),
            other => Err(TokenError::Configuration(format!(
                "unsupported signing algorithm `{}`, only HS256 is supported",
                other
            ))),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
