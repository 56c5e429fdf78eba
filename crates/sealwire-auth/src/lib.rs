//! Bearer credential verification for the sealwire gateway.
//!
//! HS256 compact tokens carrying `userId`, `email`, `role`, `iat` and `exp`.

pub mod claims;
pub mod error;
pub mod jwt;
pub mod verifier;

pub use claims::{Claims, ANONYMOUS_EMAIL, ANONYMOUS_ROLE, ANONYMOUS_SUBJECT};
pub use error::{AuthError, RejectReason};
pub use jwt::{sign_hs256, verify_hs256, ALG_HS256};
pub use verifier::{extract_bearer, CredentialVerifier, MIN_STRONG_SECRET_LENGTH};
