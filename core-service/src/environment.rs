//! Process-wide calling environment.
//!
//! Hosts that embed the bridge through a foreign-function boundary hand over
//! their calling environment once, at load time, and every later call reuses
//! it. The handle is init-once: it cannot be swapped while operations may be
//! running against it.

use std::sync::OnceLock;

use bridge_traits::EnvironmentHandle;
use tracing::{debug, warn};

use crate::error::{Result, StorageError};

static PROCESS_ENVIRONMENT: ProcessEnvironment = ProcessEnvironment::new();

/// Holder for a single [`EnvironmentHandle`].
///
/// The free functions [`set_environment`] and [`current_environment`] act on
/// the process-global instance. Separate instances are useful for tests and
/// for embedding several bridges with their own handles.
#[derive(Debug, Default)]
pub struct ProcessEnvironment {
    handle: OnceLock<EnvironmentHandle>,
}

impl ProcessEnvironment {
    pub const fn new() -> Self {
        Self {
            handle: OnceLock::new(),
        }
    }

    /// Record `handle` as the calling environment.
    ///
    /// Setting the handle that is already stored succeeds without effect.
    ///
    /// # Errors
    ///
    /// [`StorageError::EnvironmentAlreadyInitialized`] if a different handle
    /// was stored first.
    pub fn set(&self, handle: EnvironmentHandle) -> Result<()> {
        let stored = *self.handle.get_or_init(|| handle);

        if stored == handle {
            debug!(environment = ?handle, "Calling environment set");
            Ok(())
        } else {
            warn!(current = ?stored, rejected = ?handle, "Calling environment already initialized");
            Err(StorageError::EnvironmentAlreadyInitialized)
        }
    }

    /// # Errors
    ///
    /// [`StorageError::EnvironmentNotInitialized`] before [`set`](Self::set).
    pub fn current(&self) -> Result<EnvironmentHandle> {
        self.handle
            .get()
            .copied()
            .ok_or(StorageError::EnvironmentNotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.get().is_some()
    }
}

/// The process-global environment.
pub fn process_environment() -> &'static ProcessEnvironment {
    &PROCESS_ENVIRONMENT
}

/// Record the process-wide calling environment. See [`ProcessEnvironment::set`].
pub fn set_environment(handle: EnvironmentHandle) -> Result<()> {
    PROCESS_ENVIRONMENT.set(handle)
}

/// The process-wide calling environment. See [`ProcessEnvironment::current`].
pub fn current_environment() -> Result<EnvironmentHandle> {
    PROCESS_ENVIRONMENT.current()
}
