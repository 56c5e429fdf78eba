//! Seal/open pipeline for JSON bodies.
//!
//! Outbound: JSON → UTF-8 → encrypt(session key) → hex → Envelope{timestamp}
//! Inbound: replay window → hex → decrypt(session key) → JSON

use serde_json::Value;
use tracing::debug;

use sealwire_crypto::{SessionCipher, SessionKey};

use crate::envelope::{decode_parts, envelope_from_sealed};
use crate::error::EnvelopeError;
use crate::replay::ReplayWindow;
use crate::types::Envelope;

/// Encrypt an outbound JSON body.
///
/// # Arguments
/// * `body` - Response JSON
/// * `key` - Session key derived from the caller's credential
/// * `now_ms` - Server time stamped into the envelope
pub fn encrypt_outbound(body: &Value, key: &SessionKey, now_ms: i64) -> Result<Envelope, EnvelopeError> {
    let plaintext = serde_json::to_vec(body).map_err(|e| EnvelopeError::Encryption(e.to_string()))?;
    let cipher = SessionCipher::new(key).map_err(|e| EnvelopeError::Encryption(e.to_string()))?;
    let sealed = cipher
        .encrypt(&plaintext)
        .map_err(|e| EnvelopeError::Encryption(e.to_string()))?;

    let envelope = envelope_from_sealed(&sealed, now_ms);
    debug!(
        plaintext_len = plaintext.len(),
        envelope_data_len = envelope.data.len(),
        "body sealed"
    );
    Ok(envelope)
}

/// Decrypt an inbound envelope into its JSON body.
///
/// Checks run in a fixed order and stop at the first failure:
/// 1. replay window → `InvalidTimestamp`
/// 2. hex decode and AEAD verification → `Decryption`
/// 3. JSON parse → `Parse`
pub fn decrypt_inbound(
    envelope: &Envelope,
    key: &SessionKey,
    window: &ReplayWindow,
    now_ms: i64,
) -> Result<Value, EnvelopeError> {
    window.check(envelope.timestamp, now_ms)?;

    let parts = decode_parts(envelope)?;
    let cipher = SessionCipher::new(key).map_err(|e| EnvelopeError::Decryption(e.to_string()))?;
    let plaintext = cipher
        .decrypt(&parts.ciphertext, &parts.nonce, &parts.tag)
        .map_err(|e| EnvelopeError::Decryption(e.to_string()))?;

    let body: Value =
        serde_json::from_slice(&plaintext).map_err(|e| EnvelopeError::Parse(e.to_string()))?;
    debug!(
        envelope_data_len = envelope.data.len(),
        plaintext_len = plaintext.len(),
        "body opened"
    );
    Ok(body)
}
