//! Blocking entry points for foreign callers.
//!
//! Hosts on the other side of a language boundary (JNI, Swift, C) call these
//! synchronously on their own thread. Each call runs the async bridge to
//! completion on a current-thread Tokio runtime owned by the installed bridge.
//!
//! Nothing here returns an error or panics across the boundary: writes report
//! `0` on any failure and reads report a failure JSON document
//! (`{"result":"","success":"0","error":"..."}`).
//!
//! With the `ffi` feature enabled the entry points are exported through
//! UniFFI.

use std::ffi::c_void;
use std::future::Future;
use std::sync::OnceLock;
use std::thread;

use bridge_traits::{EnvironmentHandle, Outcome, ResultCodec, StatusCode};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{error, info};

use crate::bridge::SecureStorageBridge;
use crate::environment::set_environment;
use crate::error::{Result, StorageError};

static INSTALLED: OnceLock<BlockingBridge> = OnceLock::new();

/// A bridge paired with the runtime that drives it.
pub struct BlockingBridge {
    bridge: SecureStorageBridge,
    runtime: Runtime,
}

impl BlockingBridge {
    pub fn new(bridge: SecureStorageBridge) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                StorageError::Config(core_runtime::Error::Internal(format!(
                    "Failed to create Tokio runtime for secure storage: {}",
                    e
                )))
            })?;

        Ok(Self { bridge, runtime })
    }

    pub fn bridge(&self) -> &SecureStorageBridge {
        &self.bridge
    }

    /// Drive `future` on the bridge's runtime.
    ///
    /// `Runtime::block_on` panics on a thread that is already driving a
    /// runtime, so such callers are moved onto a scoped worker thread.
    fn block_on<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future + Send,
        F::Output: Send,
    {
        if Handle::try_current().is_err() {
            return Ok(self.runtime.block_on(future));
        }

        thread::scope(|scope| scope.spawn(|| self.runtime.block_on(future)).join())
            .map_err(|_| {
                StorageError::Config(core_runtime::Error::Internal(
                    "Secure storage worker thread panicked".to_string(),
                ))
            })
    }

    /// Status code of the write; `0` on any failure.
    pub fn write(&self, key: &str, value: &str) -> i32 {
        match self.block_on(self.bridge.write(key, value)).and_then(|status| status) {
            Ok(status) => status.code(),
            Err(e) => {
                error!(key = %key, error = %e, "Secure storage write rejected");
                StatusCode::FAILURE.code()
            }
        }
    }

    /// Read outcome as a JSON document.
    pub fn read(&self, key: &str) -> String {
        let outcome = match self.block_on(self.bridge.read(key)).and_then(|outcome| outcome) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(key = %key, error = %e, "Secure storage read rejected");
                Outcome::failure(e.to_string())
            }
        };

        ResultCodec::encode_json(&outcome)
    }
}

/// Install the bridge used by the foreign entry points.
///
/// # Errors
///
/// [`StorageError::Config`] if a bridge is already installed or the runtime
/// cannot be created.
pub fn install(bridge: SecureStorageBridge) -> Result<()> {
    let blocking = BlockingBridge::new(bridge)?;
    let backend = blocking.bridge().backend().to_string();

    INSTALLED.set(blocking).map_err(|_| {
        StorageError::Config(core_runtime::Error::Config(
            "Secure storage bridge already installed".to_string(),
        ))
    })?;

    info!(backend = %backend, "Secure storage bridge installed");
    Ok(())
}

/// Install a bridge configured from `SECURE_STORAGE_*` environment variables.
pub fn install_from_env() -> Result<()> {
    install(SecureStorageBridge::from_env()?)
}

pub fn is_installed() -> bool {
    INSTALLED.get().is_some()
}

fn installed() -> Result<&'static BlockingBridge> {
    INSTALLED.get().ok_or_else(|| {
        StorageError::Config(core_runtime::Error::CapabilityMissing {
            capability: "SecureStorageBridge".to_string(),
            message: "No bridge installed. Call core_service::ffi::install during host startup."
                .to_string(),
        })
    })
}

/// Record the host's calling environment from its raw address.
///
/// Returns `1` on success, `0` for a null handle or when a different handle
/// is already registered.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn secure_storage_set_environment(raw: u64) -> i32 {
    let Some(handle) = EnvironmentHandle::from_raw(raw as usize as *mut c_void) else {
        error!("Null calling environment handed to secure storage");
        return StatusCode::FAILURE.code();
    };

    match set_environment(handle) {
        Ok(()) => StatusCode::SUCCESS.code(),
        Err(e) => {
            error!(error = %e, "Failed to set calling environment");
            StatusCode::FAILURE.code()
        }
    }
}

/// Store `value` under `key`. Returns the backend status, `0` on failure.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn secure_storage_write(key: String, value: String) -> i32 {
    match installed() {
        Ok(blocking) => blocking.write(&key, &value),
        Err(e) => {
            error!(key = %key, error = %e, "Secure storage write rejected");
            StatusCode::FAILURE.code()
        }
    }
}

/// Fetch the value stored under `key` as a `{result, success, error}` JSON
/// document.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn secure_storage_read(key: String) -> String {
    match installed() {
        Ok(blocking) => blocking.read(&key),
        Err(e) => {
            error!(key = %key, error = %e, "Secure storage read rejected");
            ResultCodec::encode_json(&Outcome::failure(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ProcessEnvironment;
    use bridge_traits::{BackendIdentifier, ContextHandle, FixedContextProvider};
    use core_runtime::config::BridgeConfig;
    use std::sync::Arc;

    fn memory_bridge(environment: Arc<ProcessEnvironment>) -> SecureStorageBridge {
        let config = BridgeConfig::builder()
            .backend(BackendIdentifier::host("memory-host"))
            .host_backend(
                "memory-host",
                Arc::new(bridge_desktop::InMemorySecureStore::new()),
            )
            .context_provider(Arc::new(FixedContextProvider::new(ContextHandle::new(
                "app",
                (),
            ))))
            .build()
            .unwrap();
        SecureStorageBridge::new(config).with_environment(environment)
    }

    #[test]
    fn test_blocking_round_trip() {
        let environment = Arc::new(ProcessEnvironment::new());
        environment.set(EnvironmentHandle::detached()).unwrap();
        let blocking = BlockingBridge::new(memory_bridge(environment)).unwrap();

        assert_eq!(blocking.write("apple", "say \"hi\"\n"), 1);
        assert_eq!(
            blocking.read("apple"),
            r#"{"result":"say \"hi\"\n","success":"1","error":""}"#
        );
    }

    #[test]
    fn test_blocking_errors_become_data() {
        let blocking =
            BlockingBridge::new(memory_bridge(Arc::new(ProcessEnvironment::new()))).unwrap();

        assert_eq!(blocking.write("apple", "v"), 0);

        let outcome = ResultCodec::decode_json(&blocking.read("apple")).unwrap();
        assert!(!outcome.succeeded());
        assert!(outcome.error_message().contains("not initialized"));
    }

    #[test]
    fn test_blocking_calls_from_inside_a_runtime() {
        let environment = Arc::new(ProcessEnvironment::new());
        environment.set(EnvironmentHandle::detached()).unwrap();
        let blocking = BlockingBridge::new(memory_bridge(environment)).unwrap();

        // A host thread that is itself driving a Tokio runtime
        let host = Builder::new_current_thread().enable_all().build().unwrap();
        let (status, json) = host.block_on(async {
            let status = blocking.write("apple", "v");
            (status, blocking.read("apple"))
        });

        assert_eq!(status, 1);
        assert_eq!(json, r#"{"result":"v","success":"1","error":""}"#);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_blocking_write_inside_tokio_test() {
        let environment = Arc::new(ProcessEnvironment::new());
        environment.set(EnvironmentHandle::detached()).unwrap();
        let blocking = BlockingBridge::new(memory_bridge(environment)).unwrap();

        assert_eq!(blocking.write("apple", "v"), 1);

        // Dropping a runtime is not allowed from async code
        tokio::task::spawn_blocking(move || drop(blocking))
            .await
            .unwrap();
    }

    #[test]
    fn test_null_environment_is_rejected() {
        assert_eq!(secure_storage_set_environment(0), 0);
    }
}
