use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

/// An error resulting from operations on the durable store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// An internal unspecified error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// String-keyed durable storage with an explicit flush.
///
/// Implementations wrap whatever the platform provides (`UserDefaults`,
/// `SharedPreferences`, a settings database). Writes may be buffered until
/// [`flush`](ConsentRepository::flush) is called; the [`ConsentStore`] flushes
/// after every logical update. Implementations must serialize access
/// internally, multiple resolvers read and write overlapping keys.
///
/// [`ConsentStore`]: crate::ConsentStore
#[async_trait::async_trait]
pub trait ConsentRepository: Send + Sync {
    /// Retrieves the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    /// Stores `value` under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
    /// Synchronizes buffered writes to durable storage.
    async fn flush(&self) -> Result<(), RepositoryError>;
}

/// In-memory repository backed by a `HashMap`.
///
/// Nothing survives the process; suitable for tests and host prototyping.
pub struct InMemoryRepository {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConsentRepository for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let values = self.values.read().expect("RwLock should not be poisoned");
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        let mut values = self.values.write().expect("RwLock should not be poisoned");
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn flush(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
