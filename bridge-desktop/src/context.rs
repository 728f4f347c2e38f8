//! Process-based application context for desktop hosts.

use std::path::PathBuf;

use bridge_traits::{
    context::{ContextHandle, ContextProvider, EnvironmentHandle},
    error::{BridgeError, Result},
};
use tracing::debug;

/// Application context on desktop: the running process itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessContext {
    pub pid: u32,
    /// Directory relative file names resolve against.
    pub working_dir: PathBuf,
}

impl ProcessContext {
    pub fn current() -> Result<Self> {
        let working_dir = std::env::current_dir().map_err(|e| {
            BridgeError::NotAvailable(format!("current directory unavailable: {}", e))
        })?;

        Ok(Self {
            pid: std::process::id(),
            working_dir,
        })
    }
}

/// Context provider for hosts without a managed runtime.
///
/// Ignores the environment handle and describes the current process. The
/// working directory is captured at call time so a host that changes
/// directory between calls is observed.
#[derive(Debug, Clone, Default)]
pub struct ProcessContextProvider;

impl ProcessContextProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ContextProvider for ProcessContextProvider {
    fn current_application_context(
        &self,
        _environment: &EnvironmentHandle,
    ) -> Result<ContextHandle> {
        let context = ProcessContext::current()?;
        debug!(pid = context.pid, working_dir = ?context.working_dir, "Captured process context");

        Ok(ContextHandle::new(format!("process:{}", context.pid), context))
    }
}
