//! Read outcomes and write status codes.
//!
//! These are the values that cross the bridge boundary instead of thrown
//! errors: a read yields an [`Outcome`], a write yields a [`StatusCode`].

use std::fmt;
use std::ops::Deref;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Message used when a backend reports failure without saying why.
pub const UNSPECIFIED_FAILURE: &str = "secure storage operation failed";

/// Secret payload read from or written to secure storage.
///
/// The buffer is wiped on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the secret. Callers must not log the returned string.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED; {} bytes])", self.0.len())
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Non-empty description of why a read failed.
///
/// Only [`Outcome::failure`] builds one, so a failure always says something.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureMessage(String);

impl FailureMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for FailureMessage {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FailureMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a secure-storage read.
///
/// Exactly one state holds: a value on success, a non-empty message on
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(SecretValue),
    Failure(FailureMessage),
}

impl Outcome {
    pub fn success(value: impl Into<SecretValue>) -> Self {
        Self::Success(value.into())
    }

    /// Failure with the given message; an empty message is replaced by
    /// [`UNSPECIFIED_FAILURE`].
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            Self::Failure(FailureMessage(UNSPECIFIED_FAILURE.to_string()))
        } else {
            Self::Failure(FailureMessage(message))
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn value(&self) -> Option<&SecretValue> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// The failure message, or `""` on success.
    pub fn error_message(&self) -> &str {
        match self {
            Self::Success(_) => "",
            Self::Failure(message) => message.as_str(),
        }
    }

    /// Convert into a `Result`, mapping the failure message with `on_failure`.
    pub fn into_result<E>(self, on_failure: impl FnOnce(String) -> E) -> Result<SecretValue, E> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(message) => Err(on_failure(message.into_string())),
        }
    }
}

/// Integer status reported by a backend write.
///
/// Non-zero means success. Backends conventionally report `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const SUCCESS: StatusCode = StatusCode(1);
    pub const FAILURE: StatusCode = StatusCode(0);

    pub fn is_success(self) -> bool {
        self.0 != 0
    }

    pub fn code(self) -> i32 {
        self.0
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl From<StatusCode> for i32 {
    fn from(status: StatusCode) -> Self {
        status.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
