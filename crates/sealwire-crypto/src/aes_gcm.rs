//! AES-256-GCM session cipher.
//!
//! Wire pieces are kept detached: ciphertext, a 16-byte random nonce, and a
//! 16-byte tag. No additional authenticated data.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;

use crate::error::CryptoError;
use crate::types::{SealedBytes, SessionKey, KEY_LENGTH, NONCE_LENGTH, TAG_LENGTH};

/// AES-256-GCM with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Generate a random 16-byte nonce from the OS CSPRNG.
pub fn generate_nonce() -> Result<[u8; NONCE_LENGTH], CryptoError> {
    let mut nonce = [0u8; NONCE_LENGTH];
    getrandom::getrandom(&mut nonce).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(nonce)
}

/// AES-256-GCM bound to one session key.
pub struct SessionCipher {
    cipher: Aes256Gcm16,
}

impl SessionCipher {
    /// Create a cipher for a derived session key.
    pub fn new(key: &SessionKey) -> Result<Self, CryptoError> {
        Self::from_slice(key.as_bytes())
    }

    /// Create a cipher from raw key bytes.
    ///
    /// # Arguments
    /// * `key` - 32-byte (256-bit) raw key material
    pub fn from_slice(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_LENGTH,
                got: key.len(),
            });
        }
        let cipher = Aes256Gcm16::new_from_slice(key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SealedBytes, CryptoError> {
        let nonce = generate_nonce()?;
        let mut buffer = plaintext.to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce), b"", &mut buffer)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut tag_bytes = [0u8; TAG_LENGTH];
        tag_bytes.copy_from_slice(tag.as_slice());
        Ok(SealedBytes {
            ciphertext: buffer,
            nonce,
            tag: tag_bytes,
        })
    }

    /// Verify the tag and decrypt.
    ///
    /// Any mismatch (wrong key, tampered ciphertext, nonce or tag) returns
    /// `DecryptionFailed`; the plaintext is never released unverified.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &[u8], tag: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if nonce.len() != NONCE_LENGTH {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_LENGTH,
                got: nonce.len(),
            });
        }
        if tag.len() != TAG_LENGTH {
            return Err(CryptoError::InvalidTagLength {
                expected: TAG_LENGTH,
                got: tag.len(),
            });
        }

        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce),
                b"",
                &mut buffer,
                GenericArray::from_slice(tag),
            )
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn random_key() -> SessionKey {
        let mut key = [0u8; KEY_LENGTH];
        getrandom::getrandom(&mut key).unwrap();
        SessionKey::from_bytes(key)
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let plaintext = br#"{"foo":"bar"}"#;
        let sealed = cipher.encrypt(plaintext).unwrap();
        let opened = cipher
            .decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag)
            .unwrap();
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn ciphertext_length_matches_plaintext() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let sealed = cipher.encrypt(b"hello world").unwrap();
        assert_eq!(sealed.ciphertext.len(), 11);
        assert_ne!(sealed.ciphertext, b"hello world");
    }

    #[test]
    fn different_ciphertext_each_time() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let a = cipher.encrypt(b"test").unwrap();
        let b = cipher.encrypt(b"test").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn ten_thousand_nonces_are_distinct() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let sealed = cipher.encrypt(b"x").unwrap();
            assert!(seen.insert(sealed.nonce));
        }
        assert_eq!(seen.len(), 10_000);
    }

    #[test]
    fn flipping_any_ciphertext_bit_fails() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let sealed = cipher.encrypt(b"attack at dawn").unwrap();
        for byte in 0..sealed.ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = sealed.ciphertext.clone();
                tampered[byte] ^= 1 << bit;
                assert!(cipher.decrypt(&tampered, &sealed.nonce, &sealed.tag).is_err());
            }
        }
    }

    #[test]
    fn flipping_any_nonce_bit_fails() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let sealed = cipher.encrypt(b"attack at dawn").unwrap();
        for byte in 0..NONCE_LENGTH {
            for bit in 0..8 {
                let mut nonce = sealed.nonce;
                nonce[byte] ^= 1 << bit;
                assert!(cipher.decrypt(&sealed.ciphertext, &nonce, &sealed.tag).is_err());
            }
        }
    }

    #[test]
    fn flipping_any_tag_bit_fails() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let sealed = cipher.encrypt(b"attack at dawn").unwrap();
        for byte in 0..TAG_LENGTH {
            for bit in 0..8 {
                let mut tag = sealed.tag;
                tag[byte] ^= 1 << bit;
                assert!(cipher.decrypt(&sealed.ciphertext, &sealed.nonce, &tag).is_err());
            }
        }
    }

    #[test]
    fn wrong_key_fails() {
        let a = SessionCipher::new(&random_key()).unwrap();
        let b = SessionCipher::new(&random_key()).unwrap();
        let sealed = a.encrypt(b"secret").unwrap();
        let err = b
            .decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag)
            .unwrap_err();
        assert!(matches!(err, CryptoError::DecryptionFailed(_)));
    }

    #[test]
    fn rejects_bad_nonce_and_tag_lengths() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let sealed = cipher.encrypt(b"secret").unwrap();
        assert!(matches!(
            cipher.decrypt(&sealed.ciphertext, &sealed.nonce[..12], &sealed.tag),
            Err(CryptoError::InvalidNonceLength { expected: 16, got: 12 })
        ));
        assert!(matches!(
            cipher.decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag[..15]),
            Err(CryptoError::InvalidTagLength { expected: 16, got: 15 })
        ));
    }

    #[test]
    fn rejects_invalid_key_length() {
        assert!(matches!(
            SessionCipher::from_slice(&[0u8; 16]),
            Err(CryptoError::InvalidKeyLength { expected: 32, got: 16 })
        ));
    }

    #[test]
    fn handles_empty_plaintext() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let sealed = cipher.encrypt(b"").unwrap();
        assert!(sealed.ciphertext.is_empty());
        let opened = cipher
            .decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag)
            .unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn handles_large_data() {
        let cipher = SessionCipher::new(&random_key()).unwrap();
        let mut plaintext = vec![0u8; 100 * 1024];
        getrandom::getrandom(&mut plaintext).unwrap();
        let sealed = cipher.encrypt(&plaintext).unwrap();
        let opened = cipher
            .decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag)
            .unwrap();
        assert_eq!(opened, plaintext);
    }
}
