//! Secure storage bridge façade and bootstrap helpers.
//!
//! This crate wires a host-provided (or desktop default) secure-storage
//! backend into a two-operation API: store a secret under a key, read it
//! back. Desktop builds typically enable the `desktop-shims` feature (which
//! depends on `bridge-desktop`) to get the file and keyring backends; mobile
//! hosts register their platform keystore as a host backend instead.
//!
//! ## Bootstrap
//!
//! ```ignore
//! use bridge_traits::EnvironmentHandle;
//! use core_runtime::config::BridgeConfig;
//! use core_service::{set_environment, SecureStorageBridge};
//!
//! set_environment(EnvironmentHandle::detached())?;
//! let bridge = SecureStorageBridge::new(BridgeConfig::builder().build()?);
//!
//! bridge.write("apple", "hello world").await?;
//! let outcome = bridge.read("apple").await?;
//! ```
//!
//! Foreign callers use the blocking entry points in [`ffi`] after
//! [`ffi::install`].

pub mod bridge;
pub mod environment;
pub mod error;
pub mod ffi;
pub mod locator;

pub use bridge::SecureStorageBridge;
pub use environment::{current_environment, set_environment, ProcessEnvironment};
pub use error::{Result, StorageError};
pub use locator::{BackendHandle, BackendLocator};

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();
