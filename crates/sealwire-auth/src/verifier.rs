use chrono::{Duration, Utc};
use tracing::debug;
use zeroize::Zeroizing;

use crate::claims::Claims;
use crate::error::AuthError;
use crate::jwt::{sign_hs256, verify_hs256};

/// Secrets shorter than this are accepted but reported as weak.
pub const MIN_STRONG_SECRET_LENGTH: usize = 32;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization: Bearer <token>` header value.
///
/// Returns `None` for any other scheme or an empty token.
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}

/// Verifies HS256 session credentials against a shared secret.
pub struct CredentialVerifier {
    secret: Zeroizing<Vec<u8>>,
}

impl CredentialVerifier {
    /// # Errors
    /// `InvalidSecret` if the secret is empty.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret("secret is empty".to_string()));
        }
        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
        })
    }

    /// Verify the value of an `Authorization` header at the current time.
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<Claims, AuthError> {
        self.verify_bearer_at(header, Utc::now().timestamp())
    }

    pub fn verify_bearer_at(&self, header: Option<&str>, now_secs: i64) -> Result<Claims, AuthError> {
        let token = extract_bearer(header).ok_or(AuthError::Missing)?;
        self.verify_at(token, now_secs)
    }

    /// Verify a bare token at the current time.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now_secs: i64) -> Result<Claims, AuthError> {
        let claims = verify_hs256(token, &self.secret, now_secs)?;
        debug!(user_id = %claims.user_id, exp = claims.expires_at, "credential verified");
        Ok(claims)
    }

    /// Mint a token for `subject` valid from now for `ttl`.
    pub fn issue(
        &self,
        subject: &str,
        email: &str,
        role: &str,
        ttl: Duration,
    ) -> Result<(String, Claims), AuthError> {
        let issued_at = Utc::now().timestamp();
        let claims = Claims {
            user_id: subject.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            issued_at,
            expires_at: issued_at + ttl.num_seconds(),
        };
        let token = sign_hs256(&claims, &self.secret)?;
        Ok((token, claims))
    }

    /// Sign arbitrary claims with this verifier's secret.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        sign_hs256(claims, &self.secret)
    }

    pub fn secret_len(&self) -> usize {
        self.secret.len()
    }

    pub fn is_strong(&self) -> bool {
        self.secret.len() >= MIN_STRONG_SECRET_LENGTH
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("secret_len", &self.secret.len())
            .finish()
    }
}
