// crates/query-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Query Gate Identifiers
// Description: Opaque identifiers for stored results, producers, and backends.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: rand, serde, thiserror
// ============================================================================

//! ## Overview
//! Identifiers serialize as plain strings. [`ResultId`] is the only validated
//! identifier: its string form doubles as a payload file stem, so parsing
//! rejects anything other than ASCII alphanumerics and `-`. Tool tags and
//! datasource identifiers are opaque labels supplied by producers.
//!
//! Security posture: result identifiers arrive from untrusted callers; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a result identifier string.
pub const MAX_RESULT_ID_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing identifiers.
///
/// # Invariants
/// - Variants are stable for caller error mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier was empty.
    #[error("result id must not be empty")]
    Empty,
    /// Identifier exceeded the maximum length.
    #[error("result id exceeds {max} characters")]
    TooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Identifier contained a character outside the permitted set.
    #[error("result id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

// ============================================================================
// SECTION: Result Identifier
// ============================================================================

/// Identifier of a stored result.
///
/// # Invariants
/// - Non-empty, at most [`MAX_RESULT_ID_LENGTH`] characters.
/// - Contains only ASCII alphanumerics and `-`, so it is a safe file stem.
/// - Generated identifiers sort lexically by creation millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResultId(String);

impl ResultId {
    /// Generates a fresh, time-ordered identifier for the provided instant.
    ///
    /// The identifier is the zero-padded unix millisecond followed by 32 random
    /// bits in hex, e.g. `1760000000000-9f3ac21e`.
    #[must_use]
    pub fn generate(now: Timestamp) -> Self {
        let millis = now.as_unix_millis().max(0);
        let suffix: u32 = rand::random();
        Self(format!("{millis:013}-{suffix:08x}"))
    }

    /// Parses and validates an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] when the value is empty, too long, or contains
    /// characters outside `[A-Za-z0-9-]`.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        if value.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if value.len() > MAX_RESULT_ID_LENGTH {
            return Err(IdentifierError::TooLong {
                max: MAX_RESULT_ID_LENGTH,
            });
        }
        if let Some(invalid) = value.chars().find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-'))
        {
            return Err(IdentifierError::InvalidCharacter(invalid));
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ResultId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ResultId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResultId> for String {
    fn from(value: ResultId) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Producer Identifiers
// ============================================================================

/// Tag naming the query tool that produced a result (e.g. `log_query`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolTag(String);

impl ToolTag {
    /// Creates a new tool tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ToolTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ToolTag {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Identifier of the backend datasource a query ran against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasourceId(String);

impl DatasourceId {
    /// Creates a new datasource identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DatasourceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DatasourceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
