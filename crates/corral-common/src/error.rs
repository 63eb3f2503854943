//! Unified error types for the corral workspace.
//!
//! Kernel call failures carry the raw `errno` and the kernel's own
//! description so the operator sees the same text `strerror(3)` would print.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A failed kernel call: the `errno` value and its textual description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    /// Raw `errno` value captured right after the failing call.
    pub code: i32,
    /// Human-readable description of `code`.
    pub message: String,
}

impl PlatformError {
    /// Creates a platform error from an already resolved description.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (errno {})", self.message, self.code)
    }
}

impl std::error::Error for PlatformError {}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CorralError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The launch request itself is malformed.
    #[error("usage: {message}")]
    Usage {
        /// Description of what is wrong with the request.
        message: String,
    },

    /// A kernel call returned failure.
    #[error("{call} failed: {source}")]
    Platform {
        /// Name of the failing call, e.g. `execve`.
        call: &'static str,
        /// Captured `errno` and its description.
        source: PlatformError,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CorralError {
    /// Returns the `errno` carried by a [`CorralError::Platform`] error.
    #[must_use]
    pub const fn errno(&self) -> Option<i32> {
        match self {
            Self::Platform { source, .. } => Some(source.code),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CorralError>;
