//! In-memory key/value store with size accounting.

use crate::error::{Result, StorageError};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Largest single value accepted by default (1 KiB).
pub const DEFAULT_MAX_VALUE_SIZE: usize = 1024;
/// Default aggregate capacity of one node (100 MiB).
pub const DEFAULT_MAX_TOTAL_SIZE: usize = 100 * 1024 * 1024;

/// Size limits for a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    pub max_value_size: usize,
    pub max_total_size: usize,
}

impl StorageConfig {
    /// Reject values no store with this config would accept, regardless of
    /// how full it is.
    pub fn check_value(&self, value: &[u8]) -> Result<()> {
        if value.is_empty() {
            return Err(StorageError::EmptyValue);
        }
        if value.len() > self.max_value_size {
            return Err(StorageError::ValueTooLarge {
                size: value.len(),
                limit: self.max_value_size,
            });
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Bytes>,
    // Sum of key and value lengths over all entries.
    total_size: usize,
}

/// Thread-safe map from keys to bytes.
///
/// Sizes are charged as `key.len() + value.len()`; overwriting a key first
/// refunds the entry it replaces.
#[derive(Debug, Default)]
pub struct Store {
    config: StorageConfig,
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Look up a key. Cloning [`Bytes`] is a reference-count bump.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.read().entries.get(key).cloned()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Bytes>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        self.config.check_value(&value)?;

        let mut inner = self.inner.write();
        let refund = inner
            .entries
            .get(&key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let requested = key.len() + value.len();
        let used = inner.total_size - refund;

        if used + requested > self.config.max_total_size {
            return Err(StorageError::CapacityExceeded {
                requested,
                used: inner.total_size,
                limit: self.config.max_total_size,
            });
        }

        tracing::trace!(%key, size = value.len(), "storing value");
        inner.total_size = used + requested;
        inner.entries.insert(key, value);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently charged against the capacity.
    pub fn total_size(&self) -> usize {
        self.inner.read().total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_store(max_value_size: usize, max_total_size: usize) -> Store {
        Store::new(StorageConfig {
            max_value_size,
            max_total_size,
        })
    }

    #[test]
    fn test_default_limits() {
        let store = Store::default();
        assert_eq!(store.config().max_value_size, 1024);
        assert_eq!(store.config().max_total_size, 104_857_600);
    }

    #[test]
    fn test_put_then_get() {
        let store = Store::default();
        store.put("/books/1", "moby dick").unwrap();

        assert_eq!(store.get("/books/1"), Some(Bytes::from("moby dick")));
        assert!(store.contains("/books/1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), "/books/1".len() + "moby dick".len());
    }

    #[test]
    fn test_missing_key() {
        let store = Store::default();
        assert_eq!(store.get("nope"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_value_rejected() {
        let store = Store::default();
        assert_eq!(store.put("k", Bytes::new()), Err(StorageError::EmptyValue));
        assert!(store.is_empty());
    }

    #[test]
    fn test_value_size_limit() {
        let store = small_store(4, 1000);
        store.put("k", "1234").unwrap();
        assert_eq!(
            store.put("k", "12345"),
            Err(StorageError::ValueTooLarge { size: 5, limit: 4 })
        );
        // The rejected write leaves the old value in place.
        assert_eq!(store.get("k"), Some(Bytes::from("1234")));
    }

    #[test]
    fn test_capacity_limit() {
        let store = small_store(10, 12);
        store.put("a", "123456").unwrap(); // 7 bytes
        let err = store.put("b", "12345").unwrap_err(); // 6 more
        assert_eq!(
            err,
            StorageError::CapacityExceeded {
                requested: 6,
                used: 7,
                limit: 12
            }
        );
        assert_eq!(store.total_size(), 7);
    }

    #[test]
    fn test_overwrite_refunds_previous_value() {
        let store = small_store(10, 12);
        store.put("a", "1234567890").unwrap(); // 11 bytes
        store.put("a", "abcdefghij").unwrap();
        assert_eq!(store.total_size(), 11);

        store.put("a", "1").unwrap();
        assert_eq!(store.total_size(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_check_value_ignores_fill_level() {
        let config = StorageConfig {
            max_value_size: 4,
            max_total_size: 1,
        };
        assert_eq!(config.check_value(b"1234"), Ok(()));
        assert_eq!(config.check_value(b""), Err(StorageError::EmptyValue));
        assert_eq!(
            config.check_value(b"12345"),
            Err(StorageError::ValueTooLarge { size: 5, limit: 4 })
        );
    }
}
