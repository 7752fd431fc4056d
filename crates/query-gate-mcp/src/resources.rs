// crates/query-gate-mcp/src/resources.rs
// ============================================================================
// Module: Result Resources
// Description: Resource listing and reads addressed by result locators.
// Purpose: Serve stored payloads to out-of-process callers without paths.
// Dependencies: base64, query-gate-core, query-gate-store-fs, serde, thiserror, tokio
// ============================================================================

//! ## Overview
//! The resources surface lists stored results newest-first and reads them by
//! locator, either in full (bounded by the store's maximum resource size) or
//! as a capped preview. Textual payloads are returned as `text`; binary or
//! non-UTF-8 payloads are returned as a base64 `blob`.
//! Security posture: locators are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use query_gate_core::PayloadFormat;
use query_gate_store_fs::LocatorError;
use query_gate_store_fs::ResultListing;
use query_gate_store_fs::ResultStore;
use query_gate_store_fs::StoreError;
use query_gate_store_fs::from_locator;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resource metadata returned from `resources/list`.
///
/// # Invariants
/// - `uri` is the result locator; filesystem paths never appear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceMetadata {
    /// Result locator.
    pub uri: String,
    /// Human-readable name for resource listings.
    pub name: String,
    /// Short description built from the result summary.
    pub description: String,
    /// MIME type for resource content.
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
    /// Payload size in bytes as last observed.
    pub size: u64,
}

impl From<&ResultListing> for ResourceMetadata {
    fn from(listing: &ResultListing) -> Self {
        let mut description =
            format!("{} result, {} bytes", listing.summary.kind_label(), listing.size_bytes);
        if let Some(records) = listing.summary.record_count() {
            description.push_str(&format!(", {records} records"));
        }
        description.push_str(&format!(", created {}", listing.created_at.to_rfc3339()));
        Self {
            uri: listing.locator.clone(),
            name: format!("{} {}", listing.tool, listing.id),
            description,
            mime_type: listing.format.mime_type(),
            size: listing.size_bytes,
        }
    }
}

/// Read mode for `resources/read`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReadMode {
    /// Entire payload; refused above the maximum resource size.
    #[default]
    Full,
    /// Leading bytes bounded by the server preview ceiling.
    Preview {
        /// Requested byte budget; the server default applies when absent.
        #[serde(default)]
        max_bytes: Option<u64>,
    },
}

/// Encoded payload body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceBody {
    /// UTF-8 content.
    Text(String),
    /// Base64-encoded content.
    Blob(String),
}

/// Resource content returned from `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceContent {
    /// URI matching the requested resource.
    pub uri: String,
    /// MIME type for the payload.
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
    /// Payload body.
    #[serde(flatten)]
    pub body: ResourceBody,
    /// True when a preview stopped before the end of the payload.
    pub truncated: bool,
}

/// Resource surface errors.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// URI is not a result locator.
    #[error("invalid resource uri: {0}")]
    InvalidUri(#[from] LocatorError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Blocking task failed to complete.
    #[error("resource task failed: {0}")]
    Internal(String),
}

impl ResourceError {
    /// Returns the stable error kind label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUri(_) => "invalid_uri",
            Self::Store(error) => error.kind().as_str(),
            Self::Internal(_) => "internal",
        }
    }

    /// Returns true when retrying the same read may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(error) => error.is_retryable(),
            Self::InvalidUri(_) | Self::Internal(_) => false,
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Resource view over a result store.
#[derive(Clone)]
pub struct ResourceCatalog {
    /// Backing store.
    store: Arc<ResultStore>,
}

impl ResourceCatalog {
    /// Creates a resource catalog over a store.
    #[must_use]
    pub const fn new(store: Arc<ResultStore>) -> Self {
        Self {
            store,
        }
    }

    /// Lists stored results newest-first.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Store`] when the catalog cannot be loaded.
    pub async fn list(&self) -> Result<Vec<ResourceMetadata>, ResourceError> {
        let store = Arc::clone(&self.store);
        let listings = tokio::task::spawn_blocking(move || store.list())
            .await
            .map_err(|err| ResourceError::Internal(format!("resource list join failed: {err}")))??;
        Ok(listings.iter().map(ResourceMetadata::from).collect())
    }

    /// Reads a stored result by locator.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidUri`] for foreign or malformed
    /// locators and [`ResourceError::Store`] for unknown results, oversized
    /// full reads, and I/O failures.
    pub async fn read(&self, uri: &str, mode: ReadMode) -> Result<ResourceContent, ResourceError> {
        let id = from_locator(uri)?;
        let store = Arc::clone(&self.store);
        let (format, bytes, truncated) = tokio::task::spawn_blocking(move || match mode {
            ReadMode::Full => {
                store.read_full(&id).map(|content| (content.entry.format, content.bytes, false))
            }
            ReadMode::Preview {
                max_bytes,
            } => store
                .fetch(&id, max_bytes)
                .map(|content| (content.entry.format, content.bytes, content.truncated)),
        })
        .await
        .map_err(|err| ResourceError::Internal(format!("resource read join failed: {err}")))??;
        Ok(ResourceContent {
            uri: uri.to_string(),
            mime_type: format.mime_type(),
            body: encode_body(format, bytes, truncated),
            truncated,
        })
    }
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes payload bytes as text when they are UTF-8, otherwise as base64.
///
/// A truncated read may end inside a multi-byte character; that partial
/// character is dropped instead of forcing the whole body to base64.
pub(crate) fn encode_body(format: PayloadFormat, bytes: Vec<u8>, truncated: bool) -> ResourceBody {
    if format == PayloadFormat::Binary {
        return ResourceBody::Blob(STANDARD.encode(&bytes));
    }
    let text_len = match std::str::from_utf8(&bytes) {
        Ok(_) => bytes.len(),
        Err(err) if truncated && err.error_len().is_none() => err.valid_up_to(),
        Err(_) => return ResourceBody::Blob(STANDARD.encode(&bytes)),
    };
    let mut bytes = bytes;
    bytes.truncate(text_len);
    String::from_utf8(bytes).map_or_else(
        |err| ResourceBody::Blob(STANDARD.encode(err.as_bytes())),
        ResourceBody::Text,
    )
}

// ============================================================================
// SECTION: Tests
// ============================================================================
