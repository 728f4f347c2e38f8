//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides desktop-ready adapters for hosts that have no managed
//! runtime of their own:
//! - `ContextProvider` describing the current process
//! - `SecureStore` using one plain file per key (fallback)
//! - `SecureStore` using the `keyring` crate
//! - `SecureStore` kept in process memory (tests)
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileSecureStore, ProcessContextProvider};
//! use bridge_traits::{ContextProvider, EnvironmentHandle, SecretKey, SecureStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let context = ProcessContextProvider::new()
//!         .current_application_context(&EnvironmentHandle::detached())
//!         .unwrap();
//!     let store = FileSecureStore::new();
//!
//!     let key = SecretKey::parse("apple").unwrap();
//!     store.write(&context, &key, "hello world").await.unwrap();
//! }
//! ```

mod context;
mod file_store;
mod memory;

#[cfg(feature = "secure-store")]
mod secure_store;

pub use context::{ProcessContext, ProcessContextProvider};
pub use file_store::{FileSecureStore, FILE_NOT_FOUND};
pub use memory::InMemorySecureStore;

#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
