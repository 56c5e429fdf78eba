use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES key length in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// AES-GCM nonce length in bytes.
///
/// 128-bit nonces (GHASH-derived counter block) to stay wire compatible with
/// clients that were built against a 16-byte IV.
pub const NONCE_LENGTH: usize = 16;

/// AES-GCM tag length in bytes (128 bits).
pub const TAG_LENGTH: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count for session key derivation.
///
/// Changing this breaks decryption of every envelope sealed under the old value.
pub const PBKDF2_ITERATIONS: u32 = 10_000;

/// Master key length when hex encoded.
pub const MASTER_KEY_HEX_LENGTH: usize = KEY_LENGTH * 2;

/// The credential fields a session key is bound to.
///
/// Two credentials that differ in any of these fields derive different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyContext {
    /// Subject identifier from the credential.
    pub subject_id: String,
    /// Issued-at, Unix seconds.
    pub issued_at: i64,
    /// Expiry, Unix seconds.
    pub expires_at: i64,
}

impl KeyContext {
    /// PBKDF2 salt: `"{subject_id}:{issued_at}:{expires_at}"` as UTF-8.
    pub fn salt(&self) -> Vec<u8> {
        format!("{}:{}:{}", self.subject_id, self.issued_at, self.expires_at).into_bytes()
    }
}

/// A 256-bit key derived for a single credential.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; KEY_LENGTH]);

impl SessionKey {
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Output of a single AEAD seal: ciphertext with its detached nonce and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBytes {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LENGTH],
    pub tag: [u8; TAG_LENGTH],
}
