use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No bearer credential presented")]
    Missing,

    #[error("Malformed credential: {0}")]
    Malformed(String),

    #[error("Credential expired at {expired_at} (now {now})")]
    Expired { expired_at: i64, now: i64 },

    #[error("Credential signature does not verify")]
    BadSignature,

    #[error("Invalid verification secret: {0}")]
    InvalidSecret(String),

    #[error("Token signing failed: {0}")]
    SigningFailed(String),
}

/// Why a credential was rejected. Stable strings for logs and client error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Missing,
    Malformed,
    Expired,
    BadSignature,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Missing => "MISSING",
            RejectReason::Malformed => "MALFORMED",
            RejectReason::Expired => "EXPIRED",
            RejectReason::BadSignature => "BAD_SIGNATURE",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    /// Reject reason for a verification failure.
    ///
    /// Configuration-side failures (bad secret, signing) have no client-facing
    /// reason and report as `Malformed`.
    pub fn reason(&self) -> RejectReason {
        match self {
            AuthError::Missing => RejectReason::Missing,
            AuthError::Expired { .. } => RejectReason::Expired,
            AuthError::BadSignature => RejectReason::BadSignature,
            AuthError::Malformed(_) | AuthError::InvalidSecret(_) | AuthError::SigningFailed(_) => {
                RejectReason::Malformed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_map_to_stable_codes() {
        assert_eq!(AuthError::Missing.reason().as_str(), "MISSING");
        assert_eq!(AuthError::Malformed("x".into()).reason().as_str(), "MALFORMED");
        assert_eq!(
            AuthError::Expired { expired_at: 1, now: 2 }.reason().as_str(),
            "EXPIRED"
        );
        assert_eq!(AuthError::BadSignature.reason().to_string(), "BAD_SIGNATURE");
    }
}
