// crates/query-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Query Gate Interfaces
// Description: Backend-agnostic seams for producers, notification, and time.
// Purpose: Define the contract surfaces the result store integrates through.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces keep the result store independent of the query backends that
//! feed it and of the transports that listen to it. Producers turn a query
//! request into a raw payload plus summary; change notifiers receive advisory
//! signals after the catalog changes; clocks supply every instant the store
//! records or compares.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::DatasourceId;
use crate::core::identifiers::ResultId;
use crate::core::identifiers::ToolTag;
use crate::core::payload::RawPayload;
use crate::core::summary::ResultSummary;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of wall-clock instants.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

// ============================================================================
// SECTION: Query Producer
// ============================================================================

/// Query issued to a producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Producing tool tag.
    pub tool: ToolTag,
    /// Optional backend datasource.
    #[serde(default)]
    pub datasource_id: Option<DatasourceId>,
    /// Tool-specific arguments.
    #[serde(default)]
    pub arguments: Value,
}

/// Producer output handed to the result store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    /// Serialized result.
    pub payload: RawPayload,
    /// Compact digest of the result.
    pub summary: ResultSummary,
}

/// Producer errors.
///
/// # Invariants
/// - Variants are stable for caller error mapping.
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Arguments were rejected before reaching the backend.
    #[error("invalid query arguments: {0}")]
    InvalidArguments(String),
    /// Backend reported a failure.
    #[error("query backend error: {0}")]
    Backend(String),
}

/// Executes queries against one backend type.
pub trait QueryProducer: Send + Sync {
    /// Runs the query and returns its raw payload and summary.
    ///
    /// # Errors
    ///
    /// Returns [`ProducerError`] when arguments are invalid or the backend fails.
    fn produce(&self, request: &QueryRequest) -> Result<QueryOutput, ProducerError>;
}

// ============================================================================
// SECTION: Change Notification
// ============================================================================

/// Catalog change reported to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum CatalogChange {
    /// A new result was persisted.
    Persisted {
        /// Identifier of the new result.
        id: ResultId,
    },
    /// A result was deleted explicitly.
    Deleted {
        /// Identifier of the deleted result.
        id: ResultId,
    },
    /// A sweep or trim removed results.
    Pruned {
        /// Identifiers removed in the pass.
        removed: Vec<ResultId>,
    },
}

/// Change notification errors.
#[derive(Debug, Error)]
#[error("change notification failed: {0}")]
pub struct NotifyError(pub String);

/// Advisory listener for catalog changes.
///
/// Failures are reported to the caller for logging only; the catalog change
/// has already been committed when a notifier runs.
pub trait ChangeNotifier: Send + Sync {
    /// Signals that the externally visible listing changed.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the signal cannot be delivered.
    fn notify_changed(&self, change: &CatalogChange) -> Result<(), NotifyError>;
}

/// Notifier that discards every change.
pub struct NoopChangeNotifier;

impl ChangeNotifier for NoopChangeNotifier {
    fn notify_changed(&self, _change: &CatalogChange) -> Result<(), NotifyError> {
        Ok(())
    }
}
