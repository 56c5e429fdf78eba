//! PBKDF2-HMAC-SHA256 session key derivation.
//!
//! sessionKey = PBKDF2-HMAC-SHA256(password=masterKey, salt="{subjectId}:{iat}:{exp}", 10000, 32)

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use tracing::debug;

use crate::key_cache::SessionKeyCache;
use crate::master_key::MasterKey;
use crate::types::{KeyContext, SessionKey, KEY_LENGTH, PBKDF2_ITERATIONS};

/// Derive the 256-bit session key for a credential.
///
/// # Arguments
/// * `master` - Server master key
/// * `context` - Subject, issued-at and expiry of the verified credential
///
/// # Returns
/// 32-byte session key, identical for identical inputs
pub fn derive_session_key(master: &MasterKey, context: &KeyContext) -> SessionKey {
    let mut okm = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(master.as_bytes(), &context.salt(), PBKDF2_ITERATIONS, &mut okm);
    SessionKey::from_bytes(okm)
}

/// Owns the master key and derives session keys on demand.
///
/// With a non-zero cache capacity, derived keys are memoized in process memory
/// keyed by the master key fingerprint plus the full [`KeyContext`].
pub struct KeyDeriver {
    master: MasterKey,
    cache: Option<SessionKeyCache>,
}

impl KeyDeriver {
    /// # Arguments
    /// * `master` - Server master key
    /// * `cache_capacity` - Maximum memoized keys (0 disables memoization)
    pub fn new(master: MasterKey, cache_capacity: usize) -> Self {
        let cache = (cache_capacity > 0)
            .then(|| SessionKeyCache::new(master.fingerprint(), cache_capacity));
        Self { master, cache }
    }

    pub fn derive(&self, context: &KeyContext) -> SessionKey {
        let key = match &self.cache {
            Some(cache) => cache.get_or_derive(context, || derive_session_key(&self.master, context)),
            None => derive_session_key(&self.master, context),
        };
        debug!(
            subject_id = %context.subject_id,
            iterations = PBKDF2_ITERATIONS,
            "session key derived"
        );
        key
    }

    pub fn master(&self) -> &MasterKey {
        &self.master
    }

    /// Number of memoized keys (always 0 when memoization is off).
    pub fn cached_keys(&self) -> usize {
        self.cache.as_ref().map_or(0, SessionKeyCache::len)
    }
}
