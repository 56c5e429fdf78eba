//! Outgoing JSON interception for protected routes.
//!
//! The handler emits ordinary JSON; the sealer replaces the body with an
//! envelope under the session key unless the response is an error, is
//! marked with [`SkipEncryption`](crate::skip::SkipEncryption), or asks for
//! plaintext with `"skipEncryption": true`.

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, info};

use sealwire_crypto::SessionKey;
use sealwire_envelope::{encrypt_outbound, take_skip_flag, EnvelopeError};

use crate::error::GatewayError;
use crate::skip::is_skipped;

/// Result of passing a JSON body through the sealer.
#[derive(Debug, PartialEq, Eq)]
pub enum SealedBody {
    /// Envelope JSON.
    Sealed(Vec<u8>),
    /// Body sent as plaintext JSON (skip flag stripped).
    Plain(Vec<u8>),
}

/// Seals response bodies under one session key.
pub struct ResponseSealer {
    key: SessionKey,
}

impl ResponseSealer {
    pub fn new(key: SessionKey) -> Self {
        Self { key }
    }

    /// Seal a serialized JSON body.
    pub fn seal_json_body(&self, body: &[u8], now_ms: i64) -> Result<SealedBody, EnvelopeError> {
        let mut value: Value = serde_json::from_slice(body)
            .map_err(|e| EnvelopeError::Encryption(format!("response body is not JSON: {}", e)))?;

        if take_skip_flag(&mut value) {
            debug!("response encryption skipped by body flag");
            let plain =
                serde_json::to_vec(&value).map_err(|e| EnvelopeError::Encryption(e.to_string()))?;
            return Ok(SealedBody::Plain(plain));
        }

        let envelope = encrypt_outbound(&value, &self.key, now_ms)?;
        let sealed =
            serde_json::to_vec(&envelope).map_err(|e| EnvelopeError::Encryption(e.to_string()))?;
        Ok(SealedBody::Sealed(sealed))
    }

    /// Seal a handler response in place of its JSON body.
    pub async fn seal_response(&self, response: Response, now_ms: i64) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.as_u16() >= 400 {
            debug!(status = status.as_u16(), "error response sent unencrypted");
            return Ok(response);
        }
        if is_skipped(&response) {
            debug!("response encryption skipped by marker");
            return Ok(response);
        }
        if !is_json(response.headers()) {
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX)
            .await
            .map_err(|e| GatewayError::EncryptionFailed {
                detail: format!("reading response body: {}", e),
            })?;

        let out = match self.seal_json_body(&bytes, now_ms)? {
            SealedBody::Sealed(sealed) => {
                info!(plain_len = bytes.len(), sealed_len = sealed.len(), "response sealed");
                sealed
            }
            SealedBody::Plain(plain) => plain,
        };
        parts.headers.remove(CONTENT_LENGTH);
        Ok(Response::from_parts(parts, Body::from(Bytes::from(out))))
    }
}

/// Remove a `"skipEncryption"` flag from a JSON response that is sent as
/// plaintext anyway (encryption off or an unverified session). Other
/// responses, and bodies that are not JSON, pass through untouched.
pub async fn strip_skip_flag(response: Response) -> Result<Response, GatewayError> {
    if response.status().as_u16() >= 400 || !is_json(response.headers()) {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|e| GatewayError::internal(format!("reading response body: {}", e)))?;

    let stripped = serde_json::from_slice::<Value>(&bytes).ok().and_then(|mut value| {
        take_skip_flag(&mut value).then(|| serde_json::to_vec(&value).ok()).flatten()
    });
    let out = match stripped {
        Some(plain) => {
            debug!("skipEncryption flag stripped from plaintext response");
            parts.headers.remove(CONTENT_LENGTH);
            Bytes::from(plain)
        }
        None => bytes,
    };
    Ok(Response::from_parts(parts, Body::from(out)))
}

pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().starts_with("application/json"))
        .unwrap_or(false)
}
