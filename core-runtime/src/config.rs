//! # Bridge Configuration Module
//!
//! Provides configuration management for the secure-storage bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig` holding the selected backend, the capabilities needed to
//! reach it, and call settings. Validation is fail-fast: a bridge is never
//! constructed from a configuration that cannot work.
//!
//! ## Required Dependencies
//!
//! - `ContextProvider` - Supplies the application context each call needs
//! - `BackendIdentifier` - Which secure-storage backend to call
//!
//! When the `desktop-shims` feature is enabled, `ProcessContextProvider` and
//! the plain-file backend are injected automatically if not provided.
//!
//! ## Usage
//!
//! ### Desktop Defaults
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//!
//! let config = BridgeConfig::builder()
//!     .storage_dir("/var/lib/wallet")
//!     .build()?;
//! ```
//!
//! ### Host Keystore
//!
//! ```ignore
//! use bridge_traits::BackendIdentifier;
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .backend(BackendIdentifier::host("com.cronos.play.SecureStorage"))
//!     .host_backend("com.cronos.play.SecureStorage", Arc::new(AndroidKeystore::new(vm)))
//!     .context_provider(Arc::new(ActivityThreadContext::new(vm)))
//!     .build()?;
//! ```
//!
//! ### Environment Variables
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `SECURE_STORAGE_BACKEND` | Backend identifier (`file`, `memory`, `keyring`, `keyring:<service>`, host class name) |
//! | `SECURE_STORAGE_DIR` | Root directory of the file backend |
//! | `SECURE_STORAGE_KEYRING_SERVICE` | Keychain service name of the keyring backend |
//! | `SECURE_STORAGE_TIMEOUT_MS` | Per-call timeout in milliseconds |

use crate::error::{Error, Result};
use bridge_traits::{BackendIdentifier, ContextProvider, SecureStore};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_BACKEND: &str = "SECURE_STORAGE_BACKEND";
pub const ENV_STORAGE_DIR: &str = "SECURE_STORAGE_DIR";
pub const ENV_KEYRING_SERVICE: &str = "SECURE_STORAGE_KEYRING_SERVICE";
pub const ENV_TIMEOUT_MS: &str = "SECURE_STORAGE_TIMEOUT_MS";

/// Longest accepted per-call timeout.
pub const MAX_OPERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration for the secure-storage bridge.
///
/// Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Backend every write and read is delegated to
    pub backend: BackendIdentifier,

    /// Source of the application context handed to the backend
    pub context_provider: Arc<dyn ContextProvider>,

    /// Host-implemented backends, keyed by class name
    pub host_backends: HashMap<String, Arc<dyn SecureStore>>,

    /// Root directory of the file backend (defaults to the working directory)
    pub storage_dir: Option<PathBuf>,

    /// Upper bound on a single backend call
    pub operation_timeout: Option<Duration>,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut host_backends: Vec<&String> = self.host_backends.keys().collect();
        host_backends.sort();

        f.debug_struct("BridgeConfig")
            .field("backend", &self.backend)
            .field("context_provider", &"ContextProvider { ... }")
            .field("host_backends", &host_backends)
            .field("storage_dir", &self.storage_dir)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Build a configuration from `SECURE_STORAGE_*` environment variables.
    ///
    /// Host backends cannot be described by the environment; use
    /// [`BridgeConfigBuilder::from_env`] to add them before building.
    pub fn from_env() -> Result<Self> {
        BridgeConfigBuilder::from_env()?.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Host backends are registered under non-empty class names
    /// - The storage directory, if set, is not empty
    /// - The operation timeout, if set, is within `(0, MAX_OPERATION_TIMEOUT]`
    pub fn validate(&self) -> Result<()> {
        if self.host_backends.keys().any(|name| name.trim().is_empty()) {
            return Err(Error::Config(
                "Host backend class name cannot be empty".to_string(),
            ));
        }

        if let BackendIdentifier::Keyring { service } = &self.backend {
            if service.trim().is_empty() {
                return Err(Error::Config(
                    "Keyring service name cannot be empty".to_string(),
                ));
            }
        }

        if let Some(dir) = &self.storage_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config(
                    "Storage directory cannot be empty".to_string(),
                ));
            }
        }

        if let Some(timeout) = self.operation_timeout {
            if timeout.is_zero() {
                return Err(Error::Config(
                    "Operation timeout must be greater than 0ms".to_string(),
                ));
            }

            if timeout > MAX_OPERATION_TIMEOUT {
                return Err(Error::Config(format!(
                    "Operation timeout exceeds maximum of {} seconds",
                    MAX_OPERATION_TIMEOUT.as_secs()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn context_provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ContextProvider".to_string(),
        message: "ContextProvider implementation is required to reach the secure storage backend. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ProcessContextProvider. \
                 Android: inject a provider resolving ActivityThread.currentActivityThread().getApplication(). \
                 iOS: inject a provider returning the application bundle context."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_context_provider() -> Result<Arc<dyn ContextProvider>> {
    use bridge_desktop::ProcessContextProvider;

    let provider: Arc<dyn ContextProvider> = Arc::new(ProcessContextProvider::new());
    Ok(provider)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_context_provider() -> Result<Arc<dyn ContextProvider>> {
    Err(context_provider_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_backend() -> Result<BackendIdentifier> {
    Ok(BackendIdentifier::File)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_backend() -> Result<BackendIdentifier> {
    Err(Error::Config(
        "Backend identifier is required. Use .backend() to set it, \
         or enable the 'desktop-shims' feature for the file fallback."
            .to_string(),
    ))
}

/// Builder for constructing [`BridgeConfig`] instances.
///
/// Set options incrementally, then call [`build()`](BridgeConfigBuilder::build).
#[derive(Default)]
pub struct BridgeConfigBuilder {
    backend: Option<BackendIdentifier>,
    context_provider: Option<Arc<dyn ContextProvider>>,
    host_backends: HashMap<String, Arc<dyn SecureStore>>,
    storage_dir: Option<PathBuf>,
    keyring_service: Option<String>,
    operation_timeout: Option<Duration>,
}

impl BridgeConfigBuilder {
    /// Start from the `SECURE_STORAGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::default();

        if let Some(raw) = lookup(ENV_BACKEND) {
            let backend = raw
                .parse::<BackendIdentifier>()
                .map_err(|e| Error::InvalidEnv {
                    variable: ENV_BACKEND.to_string(),
                    message: e.to_string(),
                })?;
            builder = builder.backend(backend);
        }

        if let Some(dir) = lookup(ENV_STORAGE_DIR) {
            builder = builder.storage_dir(dir);
        }

        if let Some(service) = lookup(ENV_KEYRING_SERVICE) {
            builder = builder.keyring_service(service);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|e| Error::InvalidEnv {
                variable: ENV_TIMEOUT_MS.to_string(),
                message: e.to_string(),
            })?;
            builder = builder.operation_timeout(Duration::from_millis(millis));
        }

        Ok(builder)
    }

    /// Selects the backend every call is delegated to.
    ///
    /// Default with `desktop-shims`: [`BackendIdentifier::File`].
    pub fn backend(mut self, backend: BackendIdentifier) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the application context provider.
    ///
    /// If not provided, `ProcessContextProvider` is used when the
    /// `desktop-shims` feature is enabled.
    pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_provider = Some(provider);
        self
    }

    /// Registers a host-implemented backend under `class_name`.
    ///
    /// Select it with `backend(BackendIdentifier::host(class_name))`.
    pub fn host_backend(
        mut self,
        class_name: impl Into<String>,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        self.host_backends.insert(class_name.into(), store);
        self
    }

    /// Sets the root directory of the file backend.
    pub fn storage_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_dir = Some(path.into());
        self
    }

    /// Overrides the keychain service name when the keyring backend is
    /// selected.
    pub fn keyring_service(mut self, service: impl Into<String>) -> Self {
        self.keyring_service = Some(service.into());
        self
    }

    /// Bounds each backend call. No timeout by default.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no context provider is available
    /// - [`Error::Config`] when validation fails
    pub fn build(self) -> Result<BridgeConfig> {
        let mut backend = match self.backend {
            Some(backend) => backend,
            None => provide_default_backend()?,
        };

        if let (BackendIdentifier::Keyring { service }, Some(configured)) =
            (&mut backend, self.keyring_service)
        {
            *service = configured;
        }

        let context_provider = match self.context_provider {
            Some(provider) => provider,
            None => provide_default_context_provider()?,
        };

        let config = BridgeConfig {
            backend,
            context_provider,
            host_backends: self.host_backends,
            storage_dir: self.storage_dir,
            operation_timeout: self.operation_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{ContextHandle, FixedContextProvider, DEFAULT_KEYRING_SERVICE};

    fn fixed_provider() -> Arc<dyn ContextProvider> {
        Arc::new(FixedContextProvider::new(ContextHandle::new("test", ())))
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = BridgeConfig::builder()
            .build()
            .expect("desktop defaults should succeed");

        assert_eq!(config.backend, BackendIdentifier::File);
        assert!(config.storage_dir.is_none());
        assert!(config.operation_timeout.is_none());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_context_provider() {
        let result = BridgeConfig::builder()
            .backend(BackendIdentifier::Memory)
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("ContextProvider"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_backend() {
        let result = BridgeConfig::builder()
            .context_provider(fixed_provider())
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Backend identifier is required"));
    }

    #[test]
    fn test_builder_with_host_backend() {
        struct Noop;

        #[async_trait::async_trait]
        impl SecureStore for Noop {
            async fn write(
                &self,
                _context: &ContextHandle,
                _key: &bridge_traits::SecretKey,
                _value: &str,
            ) -> bridge_traits::error::Result<bridge_traits::StatusCode> {
                Ok(bridge_traits::StatusCode::SUCCESS)
            }

            async fn read(
                &self,
                _context: &ContextHandle,
                _key: &bridge_traits::SecretKey,
            ) -> bridge_traits::error::Result<bridge_traits::RawResult> {
                Ok(bridge_traits::RawResult::Json(String::new()))
            }
        }

        let config = BridgeConfig::builder()
            .backend(BackendIdentifier::host("com.cronos.play.SecureStorage"))
            .host_backend("com.cronos.play.SecureStorage", Arc::new(Noop))
            .context_provider(fixed_provider())
            .build()
            .unwrap();

        assert!(config
            .host_backends
            .contains_key("com.cronos.play.SecureStorage"));
        assert!(format!("{:?}", config).contains("com.cronos.play.SecureStorage"));
    }

    #[test]
    fn test_keyring_service_override() {
        let config = BridgeConfig::builder()
            .backend(BackendIdentifier::keyring(DEFAULT_KEYRING_SERVICE))
            .keyring_service("mywalletservice")
            .context_provider(fixed_provider())
            .build()
            .unwrap();

        assert_eq!(config.backend, BackendIdentifier::keyring("mywalletservice"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = BridgeConfig::builder()
            .backend(BackendIdentifier::Memory)
            .context_provider(fixed_provider())
            .operation_timeout(Duration::ZERO)
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("greater than 0ms"));
    }

    #[test]
    fn test_validate_rejects_excessive_timeout() {
        let result = BridgeConfig::builder()
            .backend(BackendIdentifier::Memory)
            .context_provider(fixed_provider())
            .operation_timeout(MAX_OPERATION_TIMEOUT + Duration::from_secs(1))
            .build();

        assert!(result.unwrap_err().to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_validate_rejects_empty_storage_dir() {
        let result = BridgeConfig::builder()
            .backend(BackendIdentifier::File)
            .context_provider(fixed_provider())
            .storage_dir("")
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_env_reads_all_variables() {
        let builder = BridgeConfigBuilder::from_lookup(env(&[
            (ENV_BACKEND, "keyring"),
            (ENV_KEYRING_SERVICE, "mywalletservice"),
            (ENV_STORAGE_DIR, "/tmp/secrets"),
            (ENV_TIMEOUT_MS, "2500"),
        ]))
        .unwrap();

        let config = builder.context_provider(fixed_provider()).build().unwrap();
        assert_eq!(config.backend, BackendIdentifier::keyring("mywalletservice"));
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/secrets")));
        assert_eq!(config.operation_timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_from_env_host_class_name() {
        let config = BridgeConfigBuilder::from_lookup(env(&[(
            ENV_BACKEND,
            "com.cronos.play.SecureStorage",
        )]))
        .unwrap()
        .context_provider(fixed_provider())
        .build()
        .unwrap();

        assert_eq!(
            config.backend,
            BackendIdentifier::host("com.cronos.play.SecureStorage")
        );
    }

    #[test]
    fn test_from_env_rejects_bad_timeout() {
        let result = BridgeConfigBuilder::from_lookup(env(&[(ENV_TIMEOUT_MS, "soon")]));

        match result {
            Err(Error::InvalidEnv { variable, .. }) => assert_eq!(variable, ENV_TIMEOUT_MS),
            other => panic!("expected InvalidEnv, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_from_env_rejects_empty_backend() {
        let result = BridgeConfigBuilder::from_lookup(env(&[(ENV_BACKEND, "  ")]));
        assert!(matches!(result, Err(Error::InvalidEnv { .. })));
    }
}
