// crates/query-gate-core/src/core/payload.rs
// ============================================================================
// Module: Query Gate Raw Payloads
// Description: Opaque serialized query results and their format tags.
// Purpose: Carry producer output to the store without interpreting it.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`RawPayload`] is the serialized bytes of one query result plus a
//! [`PayloadFormat`] tag. The store never inspects payload contents; the
//! format only selects the file extension and the MIME type advertised to
//! resource readers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Payload Format
// ============================================================================

/// Serialization format of a stored payload.
///
/// # Invariants
/// - Labels and file extensions are stable; they appear in catalog documents and file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    /// A single JSON document.
    #[default]
    Json,
    /// Newline-delimited JSON records.
    Ndjson,
    /// Comma-separated values.
    Csv,
    /// Plain UTF-8 text.
    Text,
    /// Anything else.
    Binary,
}

impl PayloadFormat {
    /// All formats, in label order.
    pub const ALL: [Self; 5] = [Self::Json, Self::Ndjson, Self::Csv, Self::Text, Self::Binary];

    /// Returns the stable label for the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Csv => "csv",
            Self::Text => "text",
            Self::Binary => "binary",
        }
    }

    /// Returns the file extension used for payload files.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ndjson => "ndjson",
            Self::Csv => "csv",
            Self::Text => "txt",
            Self::Binary => "bin",
        }
    }

    /// Returns the MIME type advertised for the format.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Ndjson => "application/x-ndjson",
            Self::Csv => "text/csv",
            Self::Text => "text/plain",
            Self::Binary => "application/octet-stream",
        }
    }

    /// Parses a format label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.as_str() == label)
    }

    /// Maps a payload file extension back to its format.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.extension() == extension)
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Raw Payload
// ============================================================================

/// Serialized query result bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    /// Payload format tag.
    pub format: PayloadFormat,
    /// Serialized bytes.
    pub bytes: Vec<u8>,
}

impl RawPayload {
    /// Creates a payload from raw bytes.
    #[must_use]
    pub const fn new(format: PayloadFormat, bytes: Vec<u8>) -> Self {
        Self {
            format,
            bytes,
        }
    }

    /// Serializes a value as a pretty-printed JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the value cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(PayloadFormat::Json, serde_json::to_vec_pretty(value)?))
    }

    /// Creates a plain text payload.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(PayloadFormat::Text, value.into().into_bytes())
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when the payload holds no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
