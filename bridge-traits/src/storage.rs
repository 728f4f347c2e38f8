//! Secure Storage Abstractions
//!
//! Provides the two-operation capability every secure-storage backend
//! implements, the identifier used to select a backend, and the validated key
//! type that names a secret slot.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::codec::RawResult;
use crate::context::ContextHandle;
use crate::error::{BridgeError, Result};
use crate::outcome::StatusCode;
use crate::platform::PlatformSendSync;

/// Default keychain service name for the desktop keyring backend.
pub const DEFAULT_KEYRING_SERVICE: &str = "secure-storage-bridge";

/// Identifier naming a secret slot.
///
/// Keys are non-empty and contain no control characters. Backends with
/// stricter identifier syntax (file names) map keys further on their side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn parse(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(BridgeError::InvalidKey("key cannot be empty".to_string()));
        }
        if key.chars().any(char::is_control) {
            return Err(BridgeError::InvalidKey(
                "key cannot contain control characters".to_string(),
            ));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which concrete secure-storage implementation the bridge talks to.
///
/// Fixed at initialization. String form:
///
/// | Text | Variant |
/// |------|---------|
/// | `file` | [`BackendIdentifier::File`] |
/// | `memory` | [`BackendIdentifier::Memory`] |
/// | `keyring` / `keyring:<service>` | [`BackendIdentifier::Keyring`] |
/// | anything else, e.g. `com.cronos.play.SecureStorage` | [`BackendIdentifier::Host`] |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendIdentifier {
    /// Platform keystore implemented by the host and registered under its
    /// class name.
    Host(String),
    /// OS keychain (Keychain, Credential Manager, Secret Service).
    Keyring { service: String },
    /// Plain file per key, used when no managed host runtime is present.
    File,
    /// Process-local storage for tests.
    Memory,
}

impl BackendIdentifier {
    pub fn host(class_name: impl Into<String>) -> Self {
        Self::Host(class_name.into())
    }

    pub fn keyring(service: impl Into<String>) -> Self {
        Self::Keyring {
            service: service.into(),
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Host(_) => "host",
            Self::Keyring { .. } => "keyring",
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(class_name) => f.write_str(class_name),
            Self::Keyring { service } => write!(f, "keyring:{}", service),
            Self::File => f.write_str("file"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for BackendIdentifier {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "" => Err(BridgeError::NotAvailable(
                "backend identifier cannot be empty".to_string(),
            )),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "keyring" => Ok(Self::keyring(DEFAULT_KEYRING_SERVICE)),
            _ => match s.strip_prefix("keyring:") {
                Some("") => Err(BridgeError::NotAvailable(
                    "keyring service name cannot be empty".to_string(),
                )),
                Some(service) => Ok(Self::keyring(service)),
                None => Ok(Self::host(s)),
            },
        }
    }
}

/// Secure storage backend capability
///
/// Abstracts the host's secure storage:
/// - Android: Keystore-backed `EncryptedFile` reached through the JVM
/// - macOS/iOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service
/// - No managed runtime: plain file per key
///
/// # Contract
///
/// - `write` returns the backend's raw status; non-zero means success.
/// - `read` returns the backend's structured `{ result, success, error }`
///   payload, including "not found" as a failure payload rather than an `Err`.
/// - `Err` is reserved for transport problems (the host call itself failed).
///
/// # Security
///
/// Implementations must never log secret values.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SecureStore: PlatformSendSync {
    /// Persist `value` under `key`, replacing any previous value.
    async fn write(&self, context: &ContextHandle, key: &SecretKey, value: &str)
        -> Result<StatusCode>;

    /// Fetch the value stored under `key`.
    async fn read(&self, context: &ContextHandle, key: &SecretKey) -> Result<RawResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_validation() {
        assert!(SecretKey::parse("apple").is_ok());
        assert!(SecretKey::parse("wallet/mnemonic").is_ok());
        assert!(matches!(
            SecretKey::parse(""),
            Err(BridgeError::InvalidKey(_))
        ));
        assert!(matches!(
            SecretKey::parse("bad\nkey"),
            Err(BridgeError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_backend_identifier_parsing() {
        assert_eq!("file".parse::<BackendIdentifier>().unwrap(), BackendIdentifier::File);
        assert_eq!(
            "memory".parse::<BackendIdentifier>().unwrap(),
            BackendIdentifier::Memory
        );
        assert_eq!(
            "keyring".parse::<BackendIdentifier>().unwrap(),
            BackendIdentifier::keyring(DEFAULT_KEYRING_SERVICE)
        );
        assert_eq!(
            "keyring:mywalletservice".parse::<BackendIdentifier>().unwrap(),
            BackendIdentifier::keyring("mywalletservice")
        );
        assert_eq!(
            "com.cronos.play.SecureStorage"
                .parse::<BackendIdentifier>()
                .unwrap(),
            BackendIdentifier::host("com.cronos.play.SecureStorage")
        );
        assert!("".parse::<BackendIdentifier>().is_err());
        assert!("keyring:".parse::<BackendIdentifier>().is_err());
    }

    #[test]
    fn test_backend_kind() {
        assert_eq!(BackendIdentifier::File.kind(), "file");
        assert_eq!(BackendIdentifier::Memory.kind(), "memory");
        assert_eq!(BackendIdentifier::keyring("svc").kind(), "keyring");
        assert_eq!(BackendIdentifier::host("com.example.SecureStorage").kind(), "host");
    }

    #[test]
    fn test_backend_identifier_display_round_trips() {
        for id in [
            BackendIdentifier::File,
            BackendIdentifier::Memory,
            BackendIdentifier::keyring("svc"),
            BackendIdentifier::host("com.example.SecureStorage"),
        ] {
            assert_eq!(id.to_string().parse::<BackendIdentifier>().unwrap(), id);
        }
    }
}
