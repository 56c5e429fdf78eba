use serde::{Deserialize, Serialize};

use sealwire_crypto::KeyContext;

/// Subject id used when credential verification is switched off.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";
/// Email used when credential verification is switched off.
pub const ANONYMOUS_EMAIL: &str = "anonymous@local";
/// Role used when credential verification is switched off.
pub const ANONYMOUS_ROLE: &str = "guest";

/// Verified payload of a session credential.
///
/// Field names on the wire follow the token issuer: `userId`, `email`, `role`,
/// `iat`, `exp`. Timestamps are Unix seconds. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    /// Fixed claims substituted for every request while verification is off.
    pub fn anonymous() -> Self {
        Self {
            user_id: ANONYMOUS_SUBJECT.to_string(),
            email: ANONYMOUS_EMAIL.to_string(),
            role: ANONYMOUS_ROLE.to_string(),
            issued_at: 0,
            expires_at: i64::MAX,
        }
    }

    /// Fields the per-session key is bound to.
    pub fn key_context(&self) -> KeyContext {
        KeyContext {
            subject_id: self.user_id.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }

    /// `exp` must be strictly after `iat`.
    pub fn has_valid_lifetime(&self) -> bool {
        self.expires_at > self.issued_at
    }

    /// Expired once `now_secs >= exp`.
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        now_secs >= self.expires_at
    }
}
