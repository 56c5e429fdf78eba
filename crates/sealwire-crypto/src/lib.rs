//! Session cryptography for the sealwire gateway.
//!
//! - Master key loading and generation
//! - PBKDF2-HMAC-SHA256 session key derivation (plus an optional bounded memo)
//! - AES-256-GCM with detached 16-byte nonce and tag

pub mod aes_gcm;
pub mod error;
pub mod kdf;
pub mod key_cache;
pub mod master_key;
pub mod types;

pub use self::aes_gcm::{generate_nonce, SessionCipher};
pub use error::CryptoError;
pub use kdf::{derive_session_key, KeyDeriver};
pub use key_cache::SessionKeyCache;
pub use master_key::{MasterKey, MasterKeySource};
pub use types::{
    KeyContext, SealedBytes, SessionKey, KEY_LENGTH, MASTER_KEY_HEX_LENGTH, NONCE_LENGTH,
    PBKDF2_ITERATIONS, TAG_LENGTH,
};
