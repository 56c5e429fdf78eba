//! Per-request protection decisions: which paths are guarded, who the caller
//! is, and how request and response bodies are opened and sealed.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::Method;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

use sealwire_auth::{Claims, CredentialVerifier};
use sealwire_crypto::{KeyDeriver, MasterKeySource, SessionKey};
use sealwire_envelope::{decrypt_inbound, detect_envelope, ReplayWindow};

use crate::error::GatewayError;
use crate::sealer::ResponseSealer;

/// Comma-separated default for [`UnprotectedPaths`].
pub const DEFAULT_UNPROTECTED_PATHS: &str = "/api/user/register,/api/user/login,/api/health";

/// Paths served without credentials or body encryption.
///
/// An entry matches the path itself and anything below it on a segment
/// boundary: `/api/health` matches `/api/health/detailed` but not
/// `/api/healthz`.
#[derive(Debug, Clone, Default)]
pub struct UnprotectedPaths {
    prefixes: Vec<String>,
}

impl UnprotectedPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = paths
            .into_iter()
            .map(|p| p.as_ref().trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { prefixes }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prefixes.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct ProtectionSettings {
    pub verification_enabled: bool,
    pub encryption_enabled: bool,
    pub replay_window: ReplayWindow,
    pub unprotected: UnprotectedPaths,
    pub body_limit: usize,
}

impl Default for ProtectionSettings {
    fn default() -> Self {
        Self {
            verification_enabled: true,
            encryption_enabled: true,
            replay_window: ReplayWindow::default(),
            unprotected: UnprotectedPaths::new(DEFAULT_UNPROTECTED_PATHS.split(',')),
            body_limit: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Unprotected,
    Protected,
}

/// The caller of a protected request, available to handlers as an extension
/// or extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub claims: Claims,
    /// False when verification is off and the claims are the anonymous placeholder.
    pub verified: bool,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| GatewayError::internal("no session on a route outside the protection layer"))
    }
}

/// Outcome of the crypto self-test.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfTestReport {
    pub master_key_valid: bool,
    pub master_key_source: &'static str,
    pub jwt_secret_valid: bool,
    pub crypto_test: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SelfTestReport {
    pub fn healthy(&self) -> bool {
        self.master_key_valid && self.jwt_secret_valid && self.crypto_test
    }
}

/// Everything the middleware needs, built once at startup and shared.
pub struct Protection {
    verifier: CredentialVerifier,
    keys: KeyDeriver,
    master_key_source: MasterKeySource,
    settings: ProtectionSettings,
}

impl Protection {
    pub fn new(
        verifier: CredentialVerifier,
        keys: KeyDeriver,
        master_key_source: MasterKeySource,
        settings: ProtectionSettings,
    ) -> Self {
        Self {
            verifier,
            keys,
            master_key_source,
            settings,
        }
    }

    pub fn settings(&self) -> &ProtectionSettings {
        &self.settings
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub fn master_key_source(&self) -> &MasterKeySource {
        &self.master_key_source
    }

    pub fn classify(&self, path: &str) -> Classification {
        if self.settings.unprotected.matches(path) {
            Classification::Unprotected
        } else {
            Classification::Protected
        }
    }

    /// Verify the `Authorization` header, or hand out the anonymous session
    /// when verification is off.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Session, GatewayError> {
        if !self.settings.verification_enabled {
            warn!("credential verification disabled; using anonymous session");
            return Ok(Session {
                claims: Claims::anonymous(),
                verified: false,
            });
        }
        let claims = self.verifier.verify_bearer(authorization)?;
        Ok(Session {
            claims,
            verified: true,
        })
    }

    pub fn session_key(&self, session: &Session) -> SessionKey {
        self.keys.derive(&session.claims.key_context())
    }

    /// Body crypto applies only to verified sessions while encryption is on.
    pub fn encrypts(&self, session: &Session) -> bool {
        session.verified && self.settings.encryption_enabled
    }

    /// Whether an inbound body for `method` should be checked for an envelope.
    pub fn decrypts(&self, method: &Method, session: &Session) -> bool {
        self.encrypts(session)
            && !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
    }

    /// Open an inbound body.
    ///
    /// Returns `Some(plaintext)` when the body was an envelope, `None` when it
    /// should reach the handler unchanged.
    pub fn open_body(
        &self,
        session: &Session,
        body: &[u8],
        now_ms: i64,
    ) -> Result<Option<Bytes>, GatewayError> {
        if body.is_empty() {
            return Ok(None);
        }
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
            return Ok(None);
        };
        let Some(envelope) = detect_envelope(&value) else {
            return Ok(None);
        };

        let key = self.session_key(session);
        let plaintext = decrypt_inbound(&envelope, &key, &self.settings.replay_window, now_ms)?;
        let bytes = serde_json::to_vec(&plaintext).map_err(|e| GatewayError::MalformedPayload {
            detail: e.to_string(),
        })?;
        debug!(
            user_id = %session.claims.user_id,
            envelope_len = body.len(),
            plain_len = bytes.len(),
            "request body opened"
        );
        Ok(Some(Bytes::from(bytes)))
    }

    /// Sealer for this session's responses. The key is derived afresh.
    pub fn sealer(&self, session: &Session) -> ResponseSealer {
        ResponseSealer::new(self.session_key(session))
    }

    /// Mint a credential, derive its key, and round-trip a sample body.
    pub fn self_test(&self, now_ms: i64) -> SelfTestReport {
        let crypto = self.crypto_round_trip(now_ms);
        SelfTestReport {
            master_key_valid: true,
            master_key_source: match self.master_key_source {
                MasterKeySource::Configured => "configured",
                _ => "generated",
            },
            jwt_secret_valid: self.verifier.is_strong(),
            crypto_test: crypto.is_ok(),
            error: crypto.err(),
        }
    }

    fn crypto_round_trip(&self, now_ms: i64) -> Result<(), String> {
        let (token, issued) = self
            .verifier
            .issue("health-check", "health@local", "test", chrono::Duration::minutes(1))
            .map_err(|e| e.to_string())?;
        let claims = self.verifier.verify(&token).map_err(|e| e.to_string())?;
        if claims != issued {
            return Err("verified claims differ from issued claims".to_string());
        }

        let session = Session {
            claims,
            verified: true,
        };
        let sample = serde_json::json!({
            "message": "test encryption/decryption",
            "timestamp": now_ms,
        });
        let envelope = sealwire_envelope::encrypt_outbound(&sample, &self.session_key(&session), now_ms)
            .map_err(|e| e.to_string())?;
        let opened = decrypt_inbound(
            &envelope,
            &self.session_key(&session),
            &self.settings.replay_window,
            now_ms,
        )
        .map_err(|e| e.to_string())?;
        if opened != sample {
            return Err("round trip returned a different body".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealwire_crypto::MasterKey;
    use serde_json::json;

    const SECRET: &str = "protection-test-secret-32-bytes!!";

    fn protection(settings: ProtectionSettings) -> Protection {
        let master = MasterKey::from_bytes([5u8; 32]).unwrap();
        Protection::new(
            CredentialVerifier::new(SECRET).unwrap(),
            KeyDeriver::new(master, 16),
            MasterKeySource::Configured,
            settings,
        )
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn verified_session(p: &Protection) -> (String, Session) {
        let (token, claims) = p
            .verifier()
            .issue("user-1", "u@example.com", "user", chrono::Duration::hours(1))
            .unwrap();
        (
            token,
            Session {
                claims,
                verified: true,
            },
        )
    }

    #[test]
    fn allowlist_matches_segments() {
        let paths = UnprotectedPaths::new(["/api/health", "/api/user/login/", " "]);
        assert!(paths.matches("/api/health"));
        assert!(paths.matches("/api/health/detailed"));
        assert!(paths.matches("/api/user/login"));
        assert!(!paths.matches("/api/healthz"));
        assert!(!paths.matches("/api/session"));
        assert!(!paths.matches("/"));
        assert_eq!(paths.iter().count(), 2);
    }

    #[test]
    fn classify_uses_allowlist() {
        let p = protection(ProtectionSettings::default());
        assert_eq!(p.classify("/api/health"), Classification::Unprotected);
        assert_eq!(p.classify("/api/user/register"), Classification::Unprotected);
        assert_eq!(p.classify("/api/echo"), Classification::Protected);
    }

    #[test]
    fn authenticate_verifies_bearer() {
        let p = protection(ProtectionSettings::default());
        let (token, session) = verified_session(&p);
        let header = format!("Bearer {}", token);
        assert_eq!(p.authenticate(Some(&header)).unwrap(), session);
        assert!(matches!(p.authenticate(None), Err(GatewayError::MissingToken)));
        assert!(matches!(
            p.authenticate(Some("Bearer a.b.c")),
            Err(GatewayError::InvalidToken { .. })
        ));
    }

    #[test]
    fn verification_off_gives_anonymous() {
        let p = protection(ProtectionSettings {
            verification_enabled: false,
            ..ProtectionSettings::default()
        });
        let session = p.authenticate(None).unwrap();
        assert!(!session.verified);
        assert_eq!(session.claims.user_id, "anonymous");
        assert!(!p.encrypts(&session));
    }

    #[test]
    fn decrypts_only_mutating_methods() {
        let p = protection(ProtectionSettings::default());
        let (_, session) = verified_session(&p);
        assert!(p.decrypts(&Method::POST, &session));
        assert!(p.decrypts(&Method::PUT, &session));
        assert!(p.decrypts(&Method::DELETE, &session));
        assert!(!p.decrypts(&Method::GET, &session));
        assert!(!p.decrypts(&Method::HEAD, &session));
        assert!(!p.decrypts(&Method::OPTIONS, &session));
    }

    #[test]
    fn encryption_off_disables_body_crypto() {
        let p = protection(ProtectionSettings {
            encryption_enabled: false,
            ..ProtectionSettings::default()
        });
        let (_, session) = verified_session(&p);
        assert!(!p.encrypts(&session));
        assert!(!p.decrypts(&Method::POST, &session));
    }

    #[test]
    fn open_body_round_trip() {
        let p = protection(ProtectionSettings::default());
        let (_, session) = verified_session(&p);
        let now = now_ms();
        let envelope =
            sealwire_envelope::encrypt_outbound(&json!({"foo": "bar"}), &p.session_key(&session), now)
                .unwrap();
        let wire = serde_json::to_vec(&envelope).unwrap();
        let opened = p.open_body(&session, &wire, now).unwrap().unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&opened).unwrap(),
            json!({"foo": "bar"})
        );
    }

    #[test]
    fn open_body_leaves_plain_bodies() {
        let p = protection(ProtectionSettings::default());
        let (_, session) = verified_session(&p);
        assert!(p.open_body(&session, b"", 1).unwrap().is_none());
        assert!(p.open_body(&session, b"not json", 1).unwrap().is_none());
        assert!(p.open_body(&session, br#"{"foo":"bar"}"#, 1).unwrap().is_none());
    }

    #[test]
    fn open_body_rejects_stale_envelope() {
        let p = protection(ProtectionSettings::default());
        let (_, session) = verified_session(&p);
        let now = now_ms();
        let envelope =
            sealwire_envelope::encrypt_outbound(&json!({}), &p.session_key(&session), now - 301_000)
                .unwrap();
        let wire = serde_json::to_vec(&envelope).unwrap();
        assert!(matches!(
            p.open_body(&session, &wire, now),
            Err(GatewayError::ReplayRejected { .. })
        ));
    }

    #[test]
    fn self_test_passes_with_strong_secret() {
        let report = protection(ProtectionSettings::default()).self_test(now_ms());
        assert!(report.crypto_test, "{:?}", report.error);
        assert!(report.jwt_secret_valid);
        assert!(report.healthy());
        assert_eq!(report.master_key_source, "configured");
    }

    #[test]
    fn weak_secret_degrades_self_test() {
        let p = Protection::new(
            CredentialVerifier::new("short").unwrap(),
            KeyDeriver::new(MasterKey::generate().unwrap(), 0),
            MasterKeySource::GeneratedMissing,
            ProtectionSettings::default(),
        );
        let report = p.self_test(now_ms());
        assert!(report.crypto_test);
        assert!(!report.jwt_secret_valid);
        assert!(!report.healthy());
        assert_eq!(report.master_key_source, "generated");
    }
}
