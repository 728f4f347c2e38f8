//! Backend resolution.
//!
//! Maps the configured [`BackendIdentifier`] to the concrete store the bridge
//! invokes. Host backends are registered by class name; built-in desktop
//! backends are constructed once, for the configured identifier only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bridge_traits::{
    error::Result as BridgeResult, BackendIdentifier, ContextHandle, RawResult, SecretKey,
    SecureStore, StatusCode,
};
use core_runtime::config::BridgeConfig;
use tracing::debug;

use crate::error::{Result, StorageError};

/// Resolved backend: its identifier plus the store that implements it.
#[derive(Clone)]
pub struct BackendHandle {
    identifier: BackendIdentifier,
    store: Arc<dyn SecureStore>,
}

impl BackendHandle {
    pub fn new(identifier: BackendIdentifier, store: Arc<dyn SecureStore>) -> Self {
        Self { identifier, store }
    }

    pub fn identifier(&self) -> &BackendIdentifier {
        &self.identifier
    }

    pub async fn write(
        &self,
        context: &ContextHandle,
        key: &SecretKey,
        value: &str,
    ) -> BridgeResult<StatusCode> {
        self.store.write(context, key, value).await
    }

    pub async fn read(&self, context: &ContextHandle, key: &SecretKey) -> BridgeResult<RawResult> {
        self.store.read(context, key).await
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct BackendLocator {
    hosts: HashMap<String, Arc<dyn SecureStore>>,
    builtin: Option<BackendHandle>,
}

impl BackendLocator {
    /// Locator with no backends; every identifier resolves to
    /// [`StorageError::BackendNotFound`] until one is registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the configured host backends and construct the built-in
    /// backend named by `config.backend`, if any.
    pub fn from_config(config: &BridgeConfig) -> Self {
        let mut locator = Self::new();

        for (class_name, store) in &config.host_backends {
            locator.register_host(class_name.clone(), Arc::clone(store));
        }

        locator.builtin = builtin_backend(config).map(|store| {
            debug!(kind = config.backend.kind(), backend = %config.backend, "Constructed built-in backend");
            BackendHandle::new(config.backend.clone(), store)
        });

        locator
    }

    /// Make `store` resolvable as `BackendIdentifier::Host(class_name)`.
    pub fn register_host(&mut self, class_name: impl Into<String>, store: Arc<dyn SecureStore>) {
        let class_name = class_name.into();
        debug!(class_name = %class_name, "Registered host backend");
        self.hosts.insert(class_name, store);
    }

    /// # Errors
    ///
    /// [`StorageError::BackendNotFound`] when no loaded backend matches.
    pub fn resolve(&self, identifier: &BackendIdentifier) -> Result<BackendHandle> {
        match identifier {
            BackendIdentifier::Host(class_name) => self
                .hosts
                .get(class_name)
                .map(|store| BackendHandle::new(identifier.clone(), Arc::clone(store)))
                .ok_or_else(|| {
                    StorageError::BackendNotFound(format!(
                        "no host backend registered as {}",
                        class_name
                    ))
                }),
            builtin => self
                .builtin
                .as_ref()
                .filter(|handle| handle.identifier() == builtin)
                .cloned()
                .ok_or_else(|| {
                    StorageError::BackendNotFound(format!(
                        "{} backend is not available in this build",
                        builtin
                    ))
                }),
        }
    }
}

#[cfg(feature = "desktop-shims")]
fn builtin_backend(config: &BridgeConfig) -> Option<Arc<dyn SecureStore>> {
    use bridge_desktop::{FileSecureStore, InMemorySecureStore};

    match &config.backend {
        BackendIdentifier::File => Some(match &config.storage_dir {
            Some(dir) => Arc::new(FileSecureStore::with_directory(dir)),
            None => Arc::new(FileSecureStore::new()),
        }),
        BackendIdentifier::Memory => Some(Arc::new(InMemorySecureStore::new())),
        BackendIdentifier::Keyring { service } => keyring_backend(service),
        BackendIdentifier::Host(_) => None,
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn builtin_backend(_config: &BridgeConfig) -> Option<Arc<dyn SecureStore>> {
    None
}

#[cfg(all(feature = "desktop-shims", feature = "secure-store"))]
fn keyring_backend(service: &str) -> Option<Arc<dyn SecureStore>> {
    Some(Arc::new(bridge_desktop::KeyringSecureStore::with_service_name(
        service,
    )))
}

#[cfg(all(feature = "desktop-shims", not(feature = "secure-store")))]
fn keyring_backend(_service: &str) -> Option<Arc<dyn SecureStore>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::InMemorySecureStore;
    use bridge_traits::{ContextHandle, FixedContextProvider};

    fn config(backend: BackendIdentifier) -> core_runtime::config::BridgeConfigBuilder {
        BridgeConfig::builder()
            .backend(backend)
            .context_provider(Arc::new(FixedContextProvider::new(ContextHandle::new(
                "test",
                (),
            ))))
    }

    #[test]
    fn test_empty_locator_finds_nothing() {
        let locator = BackendLocator::new();
        for id in [
            BackendIdentifier::File,
            BackendIdentifier::Memory,
            BackendIdentifier::host("com.cronos.play.SecureStorage"),
        ] {
            assert!(matches!(
                locator.resolve(&id),
                Err(StorageError::BackendNotFound(_))
            ));
        }
    }

    #[test]
    fn test_unregistered_host_class() {
        let mut locator = BackendLocator::new();
        locator.register_host("com.example.Other", Arc::new(InMemorySecureStore::new()));

        let err = locator
            .resolve(&BackendIdentifier::host("com.cronos.play.SecureStorage"))
            .unwrap_err();
        assert!(err.to_string().contains("com.cronos.play.SecureStorage"));
    }

    #[test]
    fn test_registered_host_resolves() {
        let cfg = config(BackendIdentifier::host("com.cronos.play.SecureStorage"))
            .host_backend(
                "com.cronos.play.SecureStorage",
                Arc::new(InMemorySecureStore::new()),
            )
            .build()
            .unwrap();
        let locator = BackendLocator::from_config(&cfg);

        let handle = locator.resolve(&cfg.backend).unwrap();
        assert_eq!(handle.identifier(), &cfg.backend);
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_only_configured_builtin_is_constructed() {
        let cfg = config(BackendIdentifier::Memory).build().unwrap();
        let locator = BackendLocator::from_config(&cfg);

        assert!(locator.resolve(&BackendIdentifier::Memory).is_ok());
        assert!(matches!(
            locator.resolve(&BackendIdentifier::File),
            Err(StorageError::BackendNotFound(_))
        ));
    }

    #[cfg(all(feature = "desktop-shims", not(feature = "secure-store")))]
    #[test]
    fn test_keyring_without_feature_is_not_found() {
        let cfg = config(BackendIdentifier::keyring("svc")).build().unwrap();
        let locator = BackendLocator::from_config(&cfg);

        assert!(matches!(
            locator.resolve(&cfg.backend),
            Err(StorageError::BackendNotFound(_))
        ));
    }
}
