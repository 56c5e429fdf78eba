//! Process-wide master secret.
//!
//! The master key is read once at startup as 64 hex characters. A missing,
//! malformed, or all-zero value is never used: a fresh random key is generated
//! instead and the caller is told why, so it can surface the key to the operator.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::types::{KEY_LENGTH, MASTER_KEY_HEX_LENGTH};

/// 256-bit server-side master secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LENGTH]);

/// Where the active master key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterKeySource {
    /// Loaded from configuration.
    Configured,
    /// Generated at startup because configuration had no key.
    GeneratedMissing,
    /// Generated at startup because the configured key was rejected.
    GeneratedInvalid(String),
}

impl MasterKeySource {
    pub fn is_generated(&self) -> bool {
        !matches!(self, MasterKeySource::Configured)
    }
}

impl MasterKey {
    /// Parse a master key from 64 hex characters (either case).
    ///
    /// Rejects wrong lengths, non-hex characters, and the all-zero key.
    pub fn from_hex(encoded: &str) -> Result<Self, CryptoError> {
        let encoded = encoded.trim();
        if encoded.len() != MASTER_KEY_HEX_LENGTH {
            return Err(CryptoError::InvalidMasterKey(format!(
                "expected {} hex characters, got {}",
                MASTER_KEY_HEX_LENGTH,
                encoded.len()
            )));
        }
        let mut bytes = [0u8; KEY_LENGTH];
        hex::decode_to_slice(encoded, &mut bytes)
            .map_err(|e| CryptoError::InvalidMasterKey(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Wrap raw key bytes. The all-zero key is rejected.
    pub fn from_bytes(mut bytes: [u8; KEY_LENGTH]) -> Result<Self, CryptoError> {
        if bytes.iter().all(|b| *b == 0) {
            bytes.zeroize();
            return Err(CryptoError::InvalidMasterKey(
                "all-zero key is not allowed".to_string(),
            ));
        }
        Ok(Self(bytes))
    }

    /// Generate a fresh random master key.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; KEY_LENGTH];
        loop {
            getrandom::getrandom(&mut bytes).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
            if bytes.iter().any(|b| *b != 0) {
                return Ok(Self(bytes));
            }
        }
    }

    /// Use the configured key when it is valid, otherwise generate one.
    pub fn load_or_generate(configured: Option<&str>) -> Result<(Self, MasterKeySource), CryptoError> {
        match configured.map(str::trim).filter(|s| !s.is_empty()) {
            Some(encoded) => match Self::from_hex(encoded) {
                Ok(key) => Ok((key, MasterKeySource::Configured)),
                Err(e) => Ok((Self::generate()?, MasterKeySource::GeneratedInvalid(e.to_string()))),
            },
            None => Ok((Self::generate()?, MasterKeySource::GeneratedMissing)),
        }
    }

    /// Check whether a string would be accepted by [`MasterKey::from_hex`].
    pub fn is_valid_hex(encoded: &str) -> bool {
        Self::from_hex(encoded).is_ok()
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Lowercase hex encoding. Only for surfacing a generated key to the operator.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short, non-reversible identifier for this key (first 8 bytes of SHA-256, hex).
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MasterKey({})", self.fingerprint())
    }
}
