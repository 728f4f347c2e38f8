//! Secure storage bridge.
//!
//! Every call walks the same path:
//!
//! ```text
//! environment -> application context -> backend -> invoke -> decode -> outcome
//! ```
//!
//! Precondition and configuration problems are returned as `Err`. Anything
//! the backend reports (including transport errors and payloads that fail to
//! decode) is turned into data: a [`StatusCode`] for writes, an [`Outcome`]
//! for reads. Nothing is retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{
    BackendIdentifier, ContextHandle, ContextProvider, EnvironmentHandle, Outcome, ResultCodec,
    SecretKey, StatusCode,
};
use core_runtime::config::BridgeConfig;
use tracing::{debug, instrument, trace, warn};

use crate::environment::{process_environment, ProcessEnvironment};
use crate::error::{Result, StorageError};
use crate::locator::{BackendHandle, BackendLocator};

/// Where the bridge reads the calling environment from.
#[derive(Debug, Clone)]
enum EnvironmentSource {
    Process,
    Scoped(Arc<ProcessEnvironment>),
}

pub struct SecureStorageBridge {
    backend: BackendIdentifier,
    locator: BackendLocator,
    context_provider: Arc<dyn ContextProvider>,
    environment: EnvironmentSource,
    operation_timeout: Option<Duration>,
}

impl SecureStorageBridge {
    /// Build a bridge reading the process-wide environment handle.
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_locator(BackendLocator::from_config(&config), config)
    }

    /// Build a bridge resolving backends through a pre-populated locator.
    ///
    /// Host backends in `config` are ignored; register them on `locator`.
    pub fn with_locator(locator: BackendLocator, config: BridgeConfig) -> Self {
        debug!(
            kind = config.backend.kind(),
            backend = %config.backend,
            timeout_ms = config.operation_timeout.map(|t| t.as_millis() as u64),
            "Secure storage bridge created"
        );

        Self {
            backend: config.backend,
            locator,
            context_provider: config.context_provider,
            environment: EnvironmentSource::Process,
            operation_timeout: config.operation_timeout,
        }
    }

    /// Build a bridge from `SECURE_STORAGE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(BridgeConfig::from_env()?))
    }

    /// Read the calling environment from `environment` instead of the
    /// process-global instance.
    pub fn with_environment(mut self, environment: Arc<ProcessEnvironment>) -> Self {
        self.environment = EnvironmentSource::Scoped(environment);
        self
    }

    pub fn backend(&self) -> &BackendIdentifier {
        &self.backend
    }

    /// Store `value` under `key` using the registered calling environment.
    ///
    /// Returns the backend's status; non-zero means success. A backend that
    /// fails to respond yields [`StatusCode::FAILURE`].
    ///
    /// # Errors
    ///
    /// - [`StorageError::EnvironmentNotInitialized`] before `set_environment`
    /// - [`StorageError::InvalidKey`], [`StorageError::ContextUnavailable`],
    ///   [`StorageError::BackendNotFound`], [`StorageError::Timeout`]
    pub async fn write(&self, key: &str, value: &str) -> Result<StatusCode> {
        let environment = self.current_environment()?;
        self.write_with_environment(&environment, key, value).await
    }

    /// Fetch the value stored under `key` using the registered calling
    /// environment.
    ///
    /// Backend-reported failures ("not found", unreadable storage, malformed
    /// payloads) come back as [`Outcome::Failure`].
    ///
    /// # Errors
    ///
    /// Same set as [`write`](Self::write).
    pub async fn read(&self, key: &str) -> Result<Outcome> {
        let environment = self.current_environment()?;
        self.read_with_environment(&environment, key).await
    }

    /// [`write`](Self::write) with an explicit environment handle.
    #[instrument(skip(self, environment, key, value), fields(key = %key, backend = %self.backend))]
    pub async fn write_with_environment(
        &self,
        environment: &EnvironmentHandle,
        key: &str,
        value: &str,
    ) -> Result<StatusCode> {
        let key = SecretKey::parse(key)?;
        let (context, backend) = self.prepare(environment)?;

        let response = self
            .bounded(backend.write(&context, &key, value))
            .await?;
        trace!("Invoked");

        let status = match response {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "Backend write failed");
                StatusCode::FAILURE
            }
        };

        if status.is_success() {
            debug!(status = status.code(), "Secret written");
        } else {
            warn!(status = status.code(), "Backend reported write failure");
        }
        Ok(status)
    }

    /// [`read`](Self::read) with an explicit environment handle.
    #[instrument(skip(self, environment, key), fields(key = %key, backend = %self.backend))]
    pub async fn read_with_environment(
        &self,
        environment: &EnvironmentHandle,
        key: &str,
    ) -> Result<Outcome> {
        let key = SecretKey::parse(key)?;
        let (context, backend) = self.prepare(environment)?;

        let response = self.bounded(backend.read(&context, &key)).await?;
        trace!("Invoked");

        let outcome = match response {
            Ok(raw) => match ResultCodec::decode(&raw) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "Backend returned malformed result");
                    Outcome::failure(format!("malformed storage result: {}", e))
                }
            },
            Err(e) => {
                warn!(error = %e, "Backend read failed");
                Outcome::failure(format!("secure storage read failed: {}", e))
            }
        };
        trace!("Decoded");

        match &outcome {
            Outcome::Success(value) => debug!(size = value.len(), "Secret read"),
            Outcome::Failure(message) => debug!(error = %message, "Secret read failed"),
        }
        Ok(outcome)
    }

    fn current_environment(&self) -> Result<EnvironmentHandle> {
        let environment = match &self.environment {
            EnvironmentSource::Process => process_environment().current(),
            EnvironmentSource::Scoped(environment) => environment.current(),
        };

        environment.map_err(|e| {
            warn!("Secure storage called before set_environment");
            e
        })
    }

    fn prepare(&self, environment: &EnvironmentHandle) -> Result<(ContextHandle, BackendHandle)> {
        trace!("Start");

        let context = self
            .context_provider
            .current_application_context(environment)
            .map_err(|e| {
                warn!(error = %e, "Application context unavailable");
                StorageError::ContextUnavailable(e.to_string())
            })?;
        trace!(context = context.label(), "ContextAcquired");

        let backend = self.locator.resolve(&self.backend).map_err(|e| {
            warn!(error = %e, "Backend resolution failed");
            e
        })?;
        trace!("BackendResolved");

        Ok((context, backend))
    }

    async fn bounded<F: Future>(&self, call: F) -> Result<F::Output> {
        match self.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                warn!(timeout_ms = limit.as_millis() as u64, "Backend call timed out");
                StorageError::Timeout(limit)
            }),
            None => Ok(call.await),
        }
    }
}

impl std::fmt::Debug for SecureStorageBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureStorageBridge")
            .field("backend", &self.backend)
            .field("environment", &self.environment)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}
