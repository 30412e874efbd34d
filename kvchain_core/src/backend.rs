use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::format::DEFAULT_MAX_VALUE_SIZE;

/// Failure reported by a key-value backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("value for {key:?} is {size} bytes, backend limit is {limit}")]
    ValueTooLarge {
        key: String,
        size: usize,
        limit: usize,
    },
}

/// String key-value store with a hard per-value size ceiling.
///
/// `put` is a full overwrite. `get` returns `None` for an absent key. The
/// store holds no locks across calls and offers no compare-and-swap, so two
/// writers racing on the same key resolve as last-write-wins.
#[async_trait]
pub trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    async fn put(&self, key: &str, value: String) -> Result<(), BackendError>;

    /// Largest value, in bytes, a single `put` accepts.
    fn max_value_size(&self) -> usize;
}

/// In-process backend backed by a `HashMap`.
///
/// Enforces its value size limit like a remote store would, which makes it a
/// faithful stand-in for tests and local tooling.
pub struct MemoryBackend {
    values: RwLock<HashMap<String, String>>,
    max_value_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VALUE_SIZE)
    }
}

impl MemoryBackend {
    pub fn new(max_value_size: usize) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            max_value_size,
        }
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop `key`, returning whether it was present.
    pub async fn remove(&self, key: &str) -> bool {
        self.values.write().await.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), BackendError> {
        if value.len() > self.max_value_size {
            return Err(BackendError::ValueTooLarge {
                key: key.to_string(),
                size: value.len(),
                limit: self.max_value_size,
            });
        }
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    fn max_value_size(&self) -> usize {
        self.max_value_size
    }
}
