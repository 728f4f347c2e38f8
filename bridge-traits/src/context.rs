//! Calling Environment and Application Context
//!
//! Host secure-storage capabilities are reached through two opaque handles:
//!
//! - [`EnvironmentHandle`]: the caller's environment (e.g. a JNI `JNIEnv*`),
//!   owned by the host runtime and registered once at initialization.
//! - [`ContextHandle`]: the ambient application object the backend needs to
//!   locate its storage (e.g. the Android `Application`), fetched from a
//!   [`ContextProvider`] once per bridge operation.

use std::any::Any;
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::{error::Result, platform::PlatformSendSync};

/// Non-owning handle to the host's calling environment.
///
/// The host runtime owns the underlying resource. The bridge only stores and
/// forwards the pointer; it never dereferences or frees it, and it must not be
/// used after the host has torn the environment down.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvironmentHandle {
    raw: NonNull<c_void>,
}

// SAFETY: the handle is an opaque token. It is never dereferenced on the Rust
// side; backends that do dereference it are responsible for using it on the
// thread the host allows.
unsafe impl Send for EnvironmentHandle {}
unsafe impl Sync for EnvironmentHandle {}

impl EnvironmentHandle {
    /// Wrap a raw environment pointer handed over by the host.
    ///
    /// Returns `None` for a null pointer.
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(|raw| Self { raw })
    }

    /// Handle used when no managed host runtime is present (desktop, tests).
    pub fn detached() -> Self {
        Self {
            raw: NonNull::dangling(),
        }
    }

    /// The raw pointer, for backends that call back into the host.
    pub fn as_raw(&self) -> *mut c_void {
        self.raw.as_ptr()
    }

    pub fn is_detached(&self) -> bool {
        self.raw == NonNull::dangling()
    }
}

impl fmt::Debug for EnvironmentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_detached() {
            f.write_str("EnvironmentHandle(detached)")
        } else {
            write!(f, "EnvironmentHandle({:p})", self.raw)
        }
    }
}

/// Opaque, cheaply cloneable application context.
///
/// The concrete payload is type-erased; backends that know what their host
/// provides recover it with [`ContextHandle::downcast_ref`].
#[derive(Clone)]
pub struct ContextHandle {
    label: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ContextHandle {
    pub fn new<T>(label: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            label: label.into(),
            inner: Arc::new(value),
        }
    }

    /// Human-readable description used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Supplies the ambient application context required by the host backend.
///
/// # Platform notes
///
/// - **Android**: resolve `ActivityThread.currentActivityThread().getApplication()`
///   through the environment handle.
/// - **Desktop**: describe the current process (see `bridge-desktop`).
///
/// # Errors
///
/// Implementations return `BridgeError::NotAvailable` when the host cannot
/// produce a context; the bridge reports this as `ContextUnavailable`.
pub trait ContextProvider: PlatformSendSync {
    fn current_application_context(&self, environment: &EnvironmentHandle)
        -> Result<ContextHandle>;
}

/// Context provider that hands out a context captured once per process.
#[derive(Debug, Clone)]
pub struct FixedContextProvider {
    context: ContextHandle,
}

impl FixedContextProvider {
    pub fn new(context: ContextHandle) -> Self {
        Self { context }
    }
}

impl ContextProvider for FixedContextProvider {
    fn current_application_context(
        &self,
        _environment: &EnvironmentHandle,
    ) -> Result<ContextHandle> {
        Ok(self.context.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_environment_is_rejected() {
        assert!(EnvironmentHandle::from_raw(std::ptr::null_mut()).is_none());
    }

    #[test]
    fn test_environment_identity() {
        let a = EnvironmentHandle::from_raw(0x1000 as *mut c_void).unwrap();
        let b = EnvironmentHandle::from_raw(0x2000 as *mut c_void).unwrap();

        assert_eq!(a, a);
        assert_ne!(a, b);
        assert_eq!(a.as_raw() as usize, 0x1000);
        assert!(!a.is_detached());
        assert!(EnvironmentHandle::detached().is_detached());
    }

    #[test]
    fn test_context_downcast() {
        let context = ContextHandle::new("test-app", 42u32);

        assert_eq!(context.label(), "test-app");
        assert_eq!(context.downcast_ref::<u32>(), Some(&42));
        assert!(context.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_fixed_provider_returns_same_context() {
        let provider = FixedContextProvider::new(ContextHandle::new("cached", "app"));
        let env = EnvironmentHandle::detached();

        let first = provider.current_application_context(&env).unwrap();
        let second = provider.current_application_context(&env).unwrap();

        assert_eq!(first.label(), "cached");
        assert_eq!(second.downcast_ref::<&str>(), Some(&"app"));
    }
}
