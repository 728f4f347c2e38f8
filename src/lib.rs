//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (`core-service`, `bridge-desktop`). Host applications can
//! depend on `secure-bridge-workspace` and enable the documented features
//! without needing to wire each crate individually.

#[cfg(any(feature = "desktop-shims", feature = "secure-store", feature = "ffi"))]
pub use core_service::{SecureStorageBridge, StorageError};
