//! Plugin error types.
//!
//! Every failure in `libclaim` is represented by the [`PluginError`] enum,
//! which derives [`thiserror::Error`] and implements
//! [`Serialize`]/[`Deserialize`] so errors can travel back to the
//! orchestration platform over the transport layer.  The finer-grained
//! variants collapse into the two protocol-visible classes via
//! [`PluginError::code`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for plugin operations.
#[derive(Debug, Error, Serialize, Deserialize, Clone)]
pub enum PluginError {
    /// The caller supplied a malformed request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A bind-mount operation failed.
    #[error("mount failed at {path}: {reason}")]
    MountFailed {
        /// Filesystem path where the mount was attempted.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// An unmount operation failed.
    #[error("unmount failed at {path}: {reason}")]
    UnmountFailed {
        /// Filesystem path where the unmount was attempted.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// The claim daemon rejected or failed a volume request.
    #[error("backend error: {0}")]
    Backend(String),

    /// A QUIC / transport-level error.
    #[error("transport error: {0}")]
    Transport(String),

    /// An unclassified local failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The two failure classes the lifecycle protocol distinguishes.
///
/// Request-validation failures are never retried by the platform; everything
/// else is surfaced as an internal failure and retried at the platform's
/// discretion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The request itself was malformed.
    InvalidArgument,
    /// A local, backend, or transport failure while serving a valid request.
    Internal,
}

impl PluginError {
    /// Create a [`PluginError::Backend`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn backend<E: std::fmt::Display>(e: E) -> Self {
        Self::Backend(e.to_string())
    }

    /// Create a [`PluginError::Transport`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn transport<E: std::fmt::Display>(e: E) -> Self {
        Self::Transport(e.to_string())
    }

    /// Create a [`PluginError::Internal`] from anything that implements
    /// [`std::fmt::Display`].
    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }

    /// Protocol failure class for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            _ => ErrorCode::Internal,
        }
    }
}
