//! Envelope shape detection and hex (de)coding of sealed bytes.

use serde_json::Value;

use sealwire_crypto::{SealedBytes, NONCE_LENGTH, TAG_LENGTH};

use crate::error::EnvelopeError;
use crate::types::{Envelope, SKIP_ENCRYPTION_FIELD};

/// Recognise an encrypted body.
///
/// A body is an envelope iff it is a JSON object whose `data`, `iv` and
/// `authTag` are strings and whose `timestamp` is a number. Extra fields are
/// ignored. Anything else is treated as a plaintext body.
pub fn detect_envelope(body: &Value) -> Option<Envelope> {
    let obj = body.as_object()?;
    let data = obj.get("data")?.as_str()?;
    let iv = obj.get("iv")?.as_str()?;
    let auth_tag = obj.get("authTag")?.as_str()?;
    let timestamp = obj.get("timestamp").and_then(timestamp_from)?;
    Some(Envelope {
        data: data.to_string(),
        iv: iv.to_string(),
        auth_tag: auth_tag.to_string(),
        timestamp,
    })
}

fn timestamp_from(value: &Value) -> Option<i64> {
    if let Some(ts) = value.as_i64() {
        return Some(ts);
    }
    // Fractional milliseconds truncate.
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
}

/// Build the wire envelope for sealed bytes.
pub fn envelope_from_sealed(sealed: &SealedBytes, timestamp: i64) -> Envelope {
    Envelope {
        data: hex::encode(&sealed.ciphertext),
        iv: hex::encode(sealed.nonce),
        auth_tag: hex::encode(sealed.tag),
        timestamp,
    }
}

/// Hex-decoded `(ciphertext, nonce, tag)` of an envelope.
pub struct DecodedParts {
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Decode the hex fields. Bad hex or wrong nonce/tag lengths are decryption failures.
pub fn decode_parts(envelope: &Envelope) -> Result<DecodedParts, EnvelopeError> {
    let ciphertext = hex::decode(&envelope.data)
        .map_err(|e| EnvelopeError::Decryption(format!("data is not hex: {}", e)))?;
    let nonce = hex::decode(&envelope.iv)
        .map_err(|e| EnvelopeError::Decryption(format!("iv is not hex: {}", e)))?;
    let tag = hex::decode(&envelope.auth_tag)
        .map_err(|e| EnvelopeError::Decryption(format!("authTag is not hex: {}", e)))?;

    if nonce.len() != NONCE_LENGTH {
        return Err(EnvelopeError::Decryption(format!(
            "iv must be {} bytes, got {}",
            NONCE_LENGTH,
            nonce.len()
        )));
    }
    if tag.len() != TAG_LENGTH {
        return Err(EnvelopeError::Decryption(format!(
            "authTag must be {} bytes, got {}",
            TAG_LENGTH,
            tag.len()
        )));
    }

    Ok(DecodedParts {
        ciphertext,
        nonce,
        tag,
    })
}

/// Remove `"skipEncryption": true` from a response object.
///
/// Returns true if the flag was present and set. Any other value of the field
/// is left in place.
pub fn take_skip_flag(body: &mut Value) -> bool {
    let Some(obj) = body.as_object_mut() else {
        return false;
    };
    if obj.get(SKIP_ENCRYPTION_FIELD) == Some(&Value::Bool(true)) {
        obj.remove(SKIP_ENCRYPTION_FIELD);
        return true;
    }
    false
}
