//! In-memory secure store for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bridge_traits::{
    codec::{Encoding, RawResult, ResultCodec},
    context::ContextHandle,
    error::{BridgeError, Result},
    outcome::{Outcome, SecretValue, StatusCode},
    storage::{SecretKey, SecureStore},
};
use tracing::debug;

/// Process-local storage. Contents are lost when the store is dropped.
///
/// Read results are produced in the configured [`Encoding`] so both decode
/// paths of the bridge can be exercised without a real host.
pub struct InMemorySecureStore {
    entries: RwLock<HashMap<SecretKey, SecretValue>>,
    encoding: Encoding,
}

impl InMemorySecureStore {
    pub fn new() -> Self {
        Self::with_encoding(Encoding::default())
    }

    pub fn with_encoding(encoding: Encoding) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            encoding,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> BridgeError {
        BridgeError::OperationFailed("in-memory store lock poisoned".to_string())
    }
}

impl Default for InMemorySecureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureStore for InMemorySecureStore {
    async fn write(
        &self,
        _context: &ContextHandle,
        key: &SecretKey,
        value: &str,
    ) -> Result<StatusCode> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.clone(), SecretValue::new(value));
        debug!(key = %key, "Stored secret in memory");
        Ok(StatusCode::SUCCESS)
    }

    async fn read(&self, _context: &ContextHandle, key: &SecretKey) -> Result<RawResult> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        let outcome = match entries.get(key) {
            Some(value) => Outcome::Success(value.clone()),
            None => Outcome::failure(format!("{} not found", key)),
        };
        debug!(key = %key, found = outcome.succeeded(), "Read secret from memory");

        Ok(ResultCodec::encode(&outcome, self.encoding))
    }
}
