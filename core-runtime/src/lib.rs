//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the secure-storage bridge:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions and
//! for the validated [`BridgeConfig`](config::BridgeConfig) a bridge is built
//! from.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use error::{Error, Result};
