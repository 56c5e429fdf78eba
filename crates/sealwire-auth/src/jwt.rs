//! Compact JWS with HS256 (RFC 7515 / RFC 7518 §3.2).
//!
//! Only `alg = HS256` is accepted. Signature and header checks are done by
//! `jsonwebtoken`; expiry is checked here against the caller's clock with no
//! leeway, together with the `exp > iat` lifetime rule.

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::Claims;
use crate::error::AuthError;

/// The only signing algorithm accepted.
pub const ALG_HS256: &str = "HS256";

fn check_secret(secret: &[u8]) -> Result<(), AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret("secret is empty".to_string()));
    }
    Ok(())
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    // Expiry is compared with `now_secs` in `verify_hs256`.
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);
    validation
}

fn rejection(err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        ErrorKind::InvalidAlgorithm => {
            AuthError::Malformed(format!("unsupported alg: expected {}", ALG_HS256))
        }
        ErrorKind::InvalidToken => AuthError::Malformed("expected 3 parts".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::Malformed(format!("missing required claim: {}", claim))
        }
        ErrorKind::InvalidKeyFormat => AuthError::InvalidSecret(err.to_string()),
        _ => AuthError::Malformed(err.to_string()),
    }
}

/// Sign claims as a compact HS256 token.
pub fn sign_hs256(claims: &Claims, secret: &[u8]) -> Result<String, AuthError> {
    check_secret(secret)?;
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::SigningFailed(e.to_string()))
}

/// Verify a compact HS256 token and return its claims.
///
/// # Arguments
/// * `token` - Compact JWS (`header.payload.signature`)
/// * `secret` - Shared HMAC secret
/// * `now_secs` - Current time, Unix seconds
///
/// # Errors
/// * `Malformed` - wrong shape, undecodable segment, foreign `alg`, or `exp <= iat`
/// * `BadSignature` - MAC mismatch
/// * `Expired` - `now_secs >= exp`
pub fn verify_hs256(token: &str, secret: &[u8], now_secs: i64) -> Result<Claims, AuthError> {
    check_secret(secret)?;
    let claims = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation())
        .map_err(rejection)?
        .claims;

    if !claims.has_valid_lifetime() {
        return Err(AuthError::Malformed(format!(
            "exp ({}) must be after iat ({})",
            claims.expires_at, claims.issued_at
        )));
    }
    if claims.is_expired_at(now_secs) {
        return Err(AuthError::Expired {
            expired_at: claims.expires_at,
            now: now_secs,
        });
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RejectReason;
    use base64ct::{Base64UrlUnpadded, Encoding};

    const SECRET: &[u8] = b"an-hs256-test-secret-of-32-bytes!";

    fn claims() -> Claims {
        Claims {
            user_id: "user-1".into(),
            email: "user@example.com".into(),
            role: "user".into(),
            issued_at: 1_000,
            expires_at: 2_000,
        }
    }

    fn segment(value: &serde_json::Value) -> String {
        Base64UrlUnpadded::encode_string(&serde_json::to_vec(value).unwrap())
    }

    fn sign_with(header: Header, payload: &serde_json::Value, secret: &[u8]) -> String {
        jsonwebtoken::encode(&header, payload, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn sign_then_verify() {
        let token = sign_hs256(&claims(), SECRET).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(verify_hs256(&token, SECRET, 1_500).unwrap(), claims());
    }

    #[test]
    fn verifies_externally_shaped_token() {
        let token = sign_with(
            Header::new(Algorithm::HS256),
            &serde_json::json!({"userId":"u-7","email":"e@x","role":"user","iat":10,"exp":20,"sub":"u-7","aud":"app"}),
            SECRET,
        );
        let verified = verify_hs256(&token, SECRET, 15).unwrap();
        assert_eq!(verified.user_id, "u-7");
        assert_eq!(verified.expires_at, 20);
    }

    #[test]
    fn wrong_secret_is_bad_signature() {
        let token = sign_hs256(&claims(), SECRET).unwrap();
        let err = verify_hs256(&token, b"some-other-secret", 1_500).unwrap_err();
        assert_eq!(err.reason(), RejectReason::BadSignature);
    }

    #[test]
    fn tampered_payload_is_bad_signature() {
        let token = sign_hs256(&claims(), SECRET).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let mut elevated = claims();
        elevated.role = "admin".into();
        parts[1] = segment(&serde_json::to_value(&elevated).unwrap());
        let err = verify_hs256(&parts.join("."), SECRET, 1_500).unwrap_err();
        assert!(matches!(err, AuthError::BadSignature));
    }

    #[test]
    fn expired_at_boundary() {
        let token = sign_hs256(&claims(), SECRET).unwrap();
        assert!(verify_hs256(&token, SECRET, 1_999).is_ok());
        let err = verify_hs256(&token, SECRET, 2_000).unwrap_err();
        assert!(matches!(err, AuthError::Expired { expired_at: 2_000, now: 2_000 }));
        assert_eq!(err.reason(), RejectReason::Expired);
    }

    #[test]
    fn alg_none_is_malformed() {
        let token = format!(
            "{}.{}.",
            segment(&serde_json::json!({"alg":"none","typ":"JWT"})),
            segment(&serde_json::to_value(claims()).unwrap())
        );
        let err = verify_hs256(&token, SECRET, 1_500).unwrap_err();
        assert_eq!(err.reason(), RejectReason::Malformed);
    }

    #[test]
    fn foreign_alg_is_malformed_even_with_valid_mac() {
        let token = sign_with(
            Header::new(Algorithm::HS512),
            &serde_json::to_value(claims()).unwrap(),
            SECRET,
        );
        let err = verify_hs256(&token, SECRET, 1_500).unwrap_err();
        assert_eq!(err.reason(), RejectReason::Malformed);
        assert!(err.to_string().contains("unsupported alg"));
    }

    #[test]
    fn missing_alg_is_malformed() {
        let token = format!(
            "{}.{}.c2ln",
            segment(&serde_json::json!({"typ":"JWT"})),
            segment(&serde_json::to_value(claims()).unwrap())
        );
        assert_eq!(
            verify_hs256(&token, SECRET, 1_500).unwrap_err().reason(),
            RejectReason::Malformed
        );
    }

    #[test]
    fn missing_exp_is_malformed() {
        let token = sign_with(
            Header::new(Algorithm::HS256),
            &serde_json::json!({"userId":"u","iat":10}),
            SECRET,
        );
        assert_eq!(
            verify_hs256(&token, SECRET, 15).unwrap_err().reason(),
            RejectReason::Malformed
        );
    }

    #[test]
    fn exp_not_after_iat_is_malformed() {
        let mut bad = claims();
        bad.expires_at = bad.issued_at;
        let token = sign_hs256(&bad, SECRET).unwrap();
        let err = verify_hs256(&token, SECRET, 0).unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[test]
    fn wrong_part_count_is_malformed() {
        for token in ["", "abc", "a.b", "a.b.c.d"] {
            assert_eq!(
                verify_hs256(token, SECRET, 0).unwrap_err().reason(),
                RejectReason::Malformed
            );
        }
    }

    #[test]
    fn garbage_segments_are_malformed() {
        let err = verify_hs256("!!!.???.***", SECRET, 0).unwrap_err();
        assert_eq!(err.reason(), RejectReason::Malformed);
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(matches!(
            sign_hs256(&claims(), b""),
            Err(AuthError::InvalidSecret(_))
        ));
        assert!(matches!(
            verify_hs256("a.b.c", b"", 0),
            Err(AuthError::InvalidSecret(_))
        ));
    }
}
