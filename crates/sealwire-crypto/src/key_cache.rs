//! Bounded in-memory memo of derived session keys.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::types::{KeyContext, SessionKey};

/// Memo key: master key identity plus the full credential binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    master_fingerprint: String,
    context: KeyContext,
}

struct CacheInner {
    keys: HashMap<CacheKey, SessionKey>,
    /// Insertion order for FIFO eviction.
    order: VecDeque<CacheKey>,
}

/// Cache for PBKDF2-derived session keys.
///
/// Keys live only in process memory and are zeroized when evicted or when the
/// cache is dropped, so a restart always starts empty.
pub struct SessionKeyCache {
    master_fingerprint: String,
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl SessionKeyCache {
    /// Create a new session key cache.
    ///
    /// # Arguments
    /// * `master_fingerprint` - Fingerprint of the master key the entries derive from
    /// * `capacity` - Maximum number of entries (must be > 0)
    pub fn new(master_fingerprint: String, capacity: usize) -> Self {
        Self {
            master_fingerprint,
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner {
                keys: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Return the memoized key for `context`, deriving and storing it on a miss.
    ///
    /// Derivation runs outside the lock; two concurrent misses for the same
    /// context both derive, and both results are identical.
    pub fn get_or_derive<F>(&self, context: &KeyContext, derive: F) -> SessionKey
    where
        F: FnOnce() -> SessionKey,
    {
        let cache_key = CacheKey {
            master_fingerprint: self.master_fingerprint.clone(),
            context: context.clone(),
        };

        if let Some(key) = self.inner.lock().keys.get(&cache_key) {
            return key.clone();
        }

        let key = derive();

        let mut inner = self.inner.lock();
        if !inner.keys.contains_key(&cache_key) {
            while inner.keys.len() >= self.capacity {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.keys.remove(&oldest);
                    }
                    None => break,
                }
            }
            inner.order.push_back(cache_key.clone());
            inner.keys.insert(cache_key, key.clone());
        }
        key
    }

    pub fn len(&self) -> usize {
        self.inner.lock().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every memoized key.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.keys.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KEY_LENGTH;
    use std::cell::Cell;

    fn context(subject: &str) -> KeyContext {
        KeyContext {
            subject_id: subject.to_string(),
            issued_at: 100,
            expires_at: 200,
        }
    }

    fn key(byte: u8) -> SessionKey {
        SessionKey::from_bytes([byte; KEY_LENGTH])
    }

    #[test]
    fn miss_then_hit() {
        let cache = SessionKeyCache::new("fp".into(), 4);
        let calls = Cell::new(0);
        let first = cache.get_or_derive(&context("a"), || {
            calls.set(calls.get() + 1);
            key(1)
        });
        let second = cache.get_or_derive(&context("a"), || {
            calls.set(calls.get() + 1);
            key(2)
        });
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let cache = SessionKeyCache::new("fp".into(), 2);
        cache.get_or_derive(&context("a"), || key(1));
        cache.get_or_derive(&context("b"), || key(2));
        cache.get_or_derive(&context("c"), || key(3));
        assert_eq!(cache.len(), 2);

        // "a" was evicted, so it is derived again
        let again = cache.get_or_derive(&context("a"), || key(9));
        assert_eq!(again, key(9));
    }

    #[test]
    fn distinct_contexts_do_not_collide() {
        let cache = SessionKeyCache::new("fp".into(), 8);
        let a = cache.get_or_derive(&context("a"), || key(1));
        let b = cache.get_or_derive(&context("b"), || key(2));
        assert_ne!(a, b);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cache = SessionKeyCache::new("fp".into(), 0);
        assert_eq!(cache.capacity(), 1);
        cache.get_or_derive(&context("a"), || key(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = SessionKeyCache::new("fp".into(), 4);
        cache.get_or_derive(&context("a"), || key(1));
        cache.clear();
        assert!(cache.is_empty());
    }
}
