//! Authentication module
//!
//! Signed session tokens (issue/verify) and password hashing with a
//! legacy plaintext fallback.

mod algorithm;
mod bearer;
mod claims;
mod encoding;
mod error;
mod password;
mod token;

pub use algorithm::SigningAlgorithm;
pub use bearer::{authenticate, extract_bearer};
pub use claims::Claims;
pub use encoding::{base64url_decode, base64url_encode, canonical_json};
pub use error::TokenError;
pub use password::{hash_password, verify_password};
pub use token::{ClaimSet, IssuedTokens, TokenEngine, TokenPair};
