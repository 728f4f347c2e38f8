//! Secure Credential Storage using OS Keychain

use async_trait::async_trait;
use bridge_traits::{
    codec::{RawResult, ResultCodec},
    context::ContextHandle,
    error::{BridgeError, Result},
    outcome::{Outcome, StatusCode},
    storage::{SecretKey, SecureStore, DEFAULT_KEYRING_SERVICE},
};
use keyring::Entry;
use tracing::{debug, warn};

/// Keyring-based secure storage implementation
///
/// Uses platform-specific secure storage:
/// - macOS: Keychain
/// - Windows: Credential Manager (DPAPI)
/// - Linux: Secret Service (libsecret)
///
/// Entries are addressed by `(service, key)`. Read results are returned as a
/// field map, the same shape a JVM host produces.
pub struct KeyringSecureStore {
    service_name: String,
}

impl KeyringSecureStore {
    /// Create a new secure store with default service name
    pub fn new() -> Self {
        Self::with_service_name(DEFAULT_KEYRING_SERVICE)
    }

    /// Create a new secure store with custom service name
    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn get_entry(&self, key: &SecretKey) -> std::result::Result<Entry, keyring::Error> {
        Entry::new(&self.service_name, key.as_str())
    }

    /// Convert keyring error to BridgeError
    fn map_keyring_error(e: keyring::Error) -> BridgeError {
        BridgeError::OperationFailed(format!("Keyring error: {}", e))
    }
}

impl Default for KeyringSecureStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecureStore for KeyringSecureStore {
    async fn write(
        &self,
        _context: &ContextHandle,
        key: &SecretKey,
        value: &str,
    ) -> Result<StatusCode> {
        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;

        match entry.set_password(value) {
            Ok(()) => {
                debug!(service = %self.service_name, key = %key, "Stored secret in keyring");
                Ok(StatusCode::SUCCESS)
            }
            Err(e) => {
                warn!(service = %self.service_name, key = %key, error = %e, "Failed to store secret in keyring");
                Ok(StatusCode::FAILURE)
            }
        }
    }

    async fn read(&self, _context: &ContextHandle, key: &SecretKey) -> Result<RawResult> {
        let entry = self.get_entry(key).map_err(Self::map_keyring_error)?;

        let outcome = match entry.get_password() {
            Ok(value) => {
                debug!(service = %self.service_name, key = %key, "Retrieved secret from keyring");
                Outcome::success(value)
            }
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service_name, key = %key, "Secret not found in keyring");
                Outcome::failure(format!("{} not found", key))
            }
            Err(e) => {
                warn!(service = %self.service_name, key = %key, error = %e, "Failed to read secret from keyring");
                Outcome::failure(format!("Keyring error: {}", e))
            }
        };

        Ok(RawResult::FieldMap(ResultCodec::encode_field_map(&outcome)))
    }
}
