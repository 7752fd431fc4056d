// crates/query-gate-store-fs/src/events.rs
// ============================================================================
// Module: Result Store Events
// Description: Structured operational events for catalog and lock activity.
// Purpose: Emit JSON-line logs without a hard logging dependency.
// Dependencies: query-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! The store reports recoveries and non-fatal failures (corrupt catalogs,
//! stale lock reclaims, failed file deletions, failed notifications) as
//! [`StoreEvent`] records. Sinks route them to stderr, an append-only file,
//! memory, or nowhere; deployments pick one in configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use query_gate_core::ResultId;
use serde::Serialize;

use crate::error::StoreError;
use crate::error::StoreErrorKind;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Store event identifiers.
///
/// # Invariants
/// - Labels are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreEventKind {
    /// Catalog document was absent; starting empty.
    CatalogMissing,
    /// Catalog document was unparsable; reset to empty.
    CatalogCorrupt,
    /// A malformed entry was skipped while loading the catalog.
    CatalogEntrySkipped,
    /// An abandoned lock marker was deleted.
    LockReclaimedStale,
    /// Lock marker release failed.
    LockReleaseFailed,
    /// A result was persisted.
    ResultPersisted,
    /// A payload was written but its catalog entry was not recorded.
    PersistOrphaned,
    /// A result was deleted explicitly.
    ResultDeleted,
    /// A payload file could not be stat'ed or deleted.
    FileDeleteFailed,
    /// A sweep completed.
    SweepCompleted,
    /// A sweep failed before reaching a decision.
    SweepFailed,
    /// A trim completed.
    TrimCompleted,
    /// An untracked payload file was deleted.
    OrphanDeleted,
    /// A change notifier reported a failure.
    NotifyFailed,
}

/// Store event payload.
#[derive(Debug, Clone, Serialize)]
pub struct StoreEvent {
    /// Event identifier.
    pub event: StoreEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Result the event concerns, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<ResultId>,
    /// Human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Error classification for failure events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<StoreErrorKind>,
}

impl StoreEvent {
    /// Creates an event stamped with the current wall-clock time.
    #[must_use]
    pub fn new(event: StoreEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            result_id: None,
            detail: None,
            error_kind: None,
        }
    }

    /// Attaches a result identifier.
    #[must_use]
    pub fn with_result(mut self, id: &ResultId) -> Self {
        self.result_id = Some(id.clone());
        self
    }

    /// Attaches a detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attaches an error's kind and message as detail.
    #[must_use]
    pub fn with_error(mut self, error: &StoreError) -> Self {
        self.error_kind = Some(error.kind());
        self.detail = Some(error.to_string());
        self
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for store events.
pub trait StoreEventSink: Send + Sync {
    /// Record a store event.
    fn record(&self, event: &StoreEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrStoreEventSink;

impl StoreEventSink for StderrStoreEventSink {
    fn record(&self, event: &StoreEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileStoreEventSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileStoreEventSink {
    /// Opens the event log in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl StoreEventSink for FileStoreEventSink {
    fn record(&self, event: &StoreEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopStoreEventSink;

impl StoreEventSink for NoopStoreEventSink {
    fn record(&self, _event: &StoreEvent) {}
}

/// Event sink that keeps events in memory for inspection.
#[derive(Default)]
pub struct RecordingStoreEventSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<StoreEvent>>,
}

impl RecordingStoreEventSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns how many events of one kind were recorded.
    #[must_use]
    pub fn count(&self, kind: StoreEventKind) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|event| event.event == kind)
            .count()
    }
}

impl StoreEventSink for RecordingStoreEventSink {
    fn record(&self, event: &StoreEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}
