//! # Host Bridge Traits
//!
//! Platform abstraction traits for secure secret storage.
//!
//! ## Overview
//!
//! This crate defines the contract between the secure-storage bridge and the
//! platform-specific backends it talks to. The bridge never stores secrets
//! itself: every write and read is delegated to a backend selected at
//! initialization time.
//!
//! ## Traits
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Two-operation secret persistence (Keystore/Keychain/file)
//!
//! ### Platform Integration
//! - [`ContextProvider`](context::ContextProvider) - Ambient application context lookup
//!
//! ### Utilities
//! - [`ResultCodec`](codec::ResultCodec) - `{ result, success, error }` triple encoding
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Backend |
//! |----------|---------------------|---------|
//! | Desktop  | `bridge-desktop`    | OS keychain or plain file |
//! | Android  | host-provided       | Keystore-backed encrypted file |
//! | iOS      | host-provided       | Keychain |
//!
//! ## Error Handling
//!
//! Backend transport problems surface as [`BridgeError`](error::BridgeError).
//! Storage-level failures (missing entry, unreadable file) are *data*: a read
//! returns a failure [`Outcome`](outcome::Outcome), a write returns a zero
//! [`StatusCode`](outcome::StatusCode).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` on native targets so a backend can
//! be shared across threads behind an `Arc`.
//!
//! ## Examples
//!
//! ### Implementing SecureStore
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::{ContextHandle, RawResult, SecretKey, SecureStore, StatusCode};
//! use bridge_traits::error::Result;
//!
//! pub struct HostKeystore;
//!
//! #[async_trait]
//! impl SecureStore for HostKeystore {
//!     async fn write(&self, context: &ContextHandle, key: &SecretKey, value: &str) -> Result<StatusCode> {
//!         // Call into the platform keystore
//!         todo!()
//!     }
//!
//!     async fn read(&self, context: &ContextHandle, key: &SecretKey) -> Result<RawResult> {
//!         todo!()
//!     }
//! }
//! ```

pub mod codec;
pub mod context;
pub mod error;
pub mod logging;
pub mod outcome;
pub mod platform;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use codec::{DecodeError, Encoding, RawResult, ResultCodec};
pub use context::{ContextHandle, ContextProvider, EnvironmentHandle, FixedContextProvider};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use outcome::{FailureMessage, Outcome, SecretValue, StatusCode};
pub use platform::PlatformSendSync;
pub use storage::{BackendIdentifier, SecretKey, SecureStore, DEFAULT_KEYRING_SERVICE};
