//! Unified error type for working memory writes
//!
//! Every rejection a writer can see is one variant of [`WmError`]. Rejections
//! are reported to the caller as-is; nothing in the write path logs and
//! swallows them.

use crate::types::WorkingMemoryAddress;
use serde::{Deserialize, Serialize};

/// Error type for all working memory write operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WmError {
    /// An entry already exists at the address being added
    #[error("Entry already exists at {address}")]
    AlreadyExists {
        /// The populated address
        address: WorkingMemoryAddress,
    },

    /// No entry exists at the address being overwritten or deleted
    #[error("No entry at {address}")]
    NotFound {
        /// The empty address
        address: WorkingMemoryAddress,
    },

    /// The writer holds neither a lock nor policy permission for the operation
    #[error("Permission denied at {address}: {message}")]
    Permission {
        /// The protected address
        address: WorkingMemoryAddress,
        /// Which permission was missing
        message: String,
    },

    /// The writer's copy of the entry is older than the authoritative one
    #[error("Stale write at {address}: {message}")]
    Consistency {
        /// The address whose version diverged
        address: WorkingMemoryAddress,
        /// Details of the version mismatch
        message: String,
    },

    /// Empty identifier or partition, or a malformed configuration value
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the offending argument
        message: String,
    },

    /// The store could not be reached
    #[error("Store unreachable: {message}")]
    Unreachable {
        /// Transport-level description
        message: String,
    },

    /// The store does not host the requested partition
    #[error("Unknown partition: {partition}")]
    UnknownPartition {
        /// The partition name that was not recognised
        partition: String,
    },

    /// The payload could not be encoded for a serializing write
    #[error("Serialization error: {message}")]
    Serialization {
        /// Encoder error description
        message: String,
    },

    /// A local invariant was broken
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the broken invariant
        message: String,
    },
}

/// Coarse classification of [`WmError`] for callers that branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WmErrorKind {
    /// See [`WmError::AlreadyExists`]
    AlreadyExists,
    /// See [`WmError::NotFound`]
    NotFound,
    /// See [`WmError::Permission`]
    Permission,
    /// See [`WmError::Consistency`]
    Consistency,
    /// See [`WmError::InvalidArgument`]
    InvalidArgument,
    /// See [`WmError::Unreachable`]
    Unreachable,
    /// See [`WmError::UnknownPartition`]
    UnknownPartition,
    /// See [`WmError::Serialization`]
    Serialization,
    /// See [`WmError::Internal`]
    Internal,
}

impl WmError {
    /// Create an already-exists error
    pub fn already_exists(address: &WorkingMemoryAddress) -> Self {
        Self::AlreadyExists {
            address: address.clone(),
        }
    }

    /// Create a not-found error
    pub fn not_found(address: &WorkingMemoryAddress) -> Self {
        Self::NotFound {
            address: address.clone(),
        }
    }

    /// Create a permission error
    pub fn permission(address: &WorkingMemoryAddress, message: impl Into<String>) -> Self {
        Self::Permission {
            address: address.clone(),
            message: message.into(),
        }
    }

    /// Create a consistency error
    pub fn consistency(address: &WorkingMemoryAddress, message: impl Into<String>) -> Self {
        Self::Consistency {
            address: address.clone(),
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an unreachable store error
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    /// Create an unknown partition error
    pub fn unknown_partition(partition: impl Into<String>) -> Self {
        Self::UnknownPartition {
            partition: partition.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The kind tag of this error
    pub fn kind(&self) -> WmErrorKind {
        match self {
            Self::AlreadyExists { .. } => WmErrorKind::AlreadyExists,
            Self::NotFound { .. } => WmErrorKind::NotFound,
            Self::Permission { .. } => WmErrorKind::Permission,
            Self::Consistency { .. } => WmErrorKind::Consistency,
            Self::InvalidArgument { .. } => WmErrorKind::InvalidArgument,
            Self::Unreachable { .. } => WmErrorKind::Unreachable,
            Self::UnknownPartition { .. } => WmErrorKind::UnknownPartition,
            Self::Serialization { .. } => WmErrorKind::Serialization,
            Self::Internal { .. } => WmErrorKind::Internal,
        }
    }

    /// Whether a caller may reasonably retry the same request unchanged
    ///
    /// The write path itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Standard result type for working memory writes
pub type Result<T> = std::result::Result<T, WmError>;

impl From<std::io::Error> for WmError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::TimedOut => Self::unreachable(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}
