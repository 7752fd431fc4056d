// crates/query-gate-store-fs/src/error.rs
// ============================================================================
// Module: Result Store Errors
// Description: Error taxonomy for catalog, lock, and payload operations.
// Purpose: Let callers tell retryable, invalid-handle, and size failures apart.
// Dependencies: query-gate-core, serde, thiserror
// ============================================================================

//! ## Overview
//! Every store failure maps to one [`StoreErrorKind`]. Callers use the kind to
//! decide whether to retry ([`StoreErrorKind::LockTimeout`],
//! [`StoreErrorKind::IoFailure`]), drop the handle
//! ([`StoreErrorKind::NotFound`]), or switch to a capped read
//! ([`StoreErrorKind::SizeExceeded`]).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::error::Error as _;
use std::io;
use std::path::PathBuf;

use query_gate_core::ResultId;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::locator::LocatorError;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Stable classification of store errors.
///
/// # Invariants
/// - Labels are stable for caller error mapping and event logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    /// Unknown result identifier.
    NotFound,
    /// Catalog lock not acquired within the wait budget.
    LockTimeout,
    /// Resource larger than the permitted size.
    SizeExceeded,
    /// Disk read, write, or stat failure.
    IoFailure,
    /// Catalog document could not be parsed.
    CorruptCatalog,
    /// Request or configuration rejected.
    Invalid,
    /// Record serialization failure.
    Serialization,
}

impl StoreErrorKind {
    /// Returns the stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::LockTimeout => "lock_timeout",
            Self::SizeExceeded => "size_exceeded",
            Self::IoFailure => "io_failure",
            Self::CorruptCatalog => "corrupt_catalog",
            Self::Invalid => "invalid",
            Self::Serialization => "serialization",
        }
    }

    /// Returns true when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::LockTimeout | Self::IoFailure)
    }
}

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Result store errors.
///
/// # Invariants
/// - Variants are stable for caller error mapping.
/// - [`StoreError::Io`] exposes the underlying I/O error as its source.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Result identifier is not present in the catalog.
    #[error("result not found: {0}")]
    NotFound(ResultId),
    /// Catalog lock wait budget exhausted.
    #[error("catalog lock {} not acquired within {waited_ms} ms", path.display())]
    LockTimeout {
        /// Lock marker path.
        path: PathBuf,
        /// Milliseconds spent waiting.
        waited_ms: u64,
    },
    /// Resource exceeds a configured size limit.
    #[error("{subject} is {actual_bytes} bytes, above the {max_bytes} byte limit")]
    SizeExceeded {
        /// What was measured (result id or payload).
        subject: String,
        /// Actual size in bytes.
        actual_bytes: u64,
        /// Permitted maximum in bytes.
        max_bytes: u64,
    },
    /// Filesystem failure.
    #[error("result store io failure: {context}")]
    Io {
        /// Operation and path that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Catalog document could not be parsed.
    #[error("catalog document corrupt: {0}")]
    CorruptCatalog(String),
    /// Request or configuration rejected.
    #[error("invalid result store request: {0}")]
    Invalid(String),
    /// Record could not be serialized.
    #[error("result store serialization failure: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Builds an I/O error with operation context.
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> StoreErrorKind {
        match self {
            Self::NotFound(_) => StoreErrorKind::NotFound,
            Self::LockTimeout {
                ..
            } => StoreErrorKind::LockTimeout,
            Self::SizeExceeded {
                ..
            } => StoreErrorKind::SizeExceeded,
            Self::Io {
                ..
            } => StoreErrorKind::IoFailure,
            Self::CorruptCatalog(_) => StoreErrorKind::CorruptCatalog,
            Self::Invalid(_) => StoreErrorKind::Invalid,
            Self::Serialization(_) => StoreErrorKind::Serialization,
        }
    }

    /// Returns true when retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns the underlying cause rendered as text, when one exists.
    #[must_use]
    pub fn cause(&self) -> Option<String> {
        self.source().map(ToString::to_string)
    }
}

impl From<LocatorError> for StoreError {
    fn from(error: LocatorError) -> Self {
        Self::Invalid(error.to_string())
    }
}
