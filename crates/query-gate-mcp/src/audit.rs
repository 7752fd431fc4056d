// crates/query-gate-mcp/src/audit.rs
// ============================================================================
// Module: Tool Call Audit Logging
// Description: Structured audit events for routed tool calls.
// Purpose: Emit one JSON-line record per tool call without a logging framework.
// Dependencies: query-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every call through [`crate::ToolRouter`] produces exactly one
//! [`ToolAuditEvent`]. Events carry the tool name, outcome, error kind, the
//! result they touched, and elapsed time. Arguments and payloads are never
//! logged.

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

// ============================================================================
// SECTION: Types
// ============================================================================

/// Tool call outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// Handler returned a response.
    Ok,
    /// Handler returned an error.
    Error,
}

/// Tool call audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ToolAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Tool name as requested by the caller.
    pub tool: String,
    /// Call outcome.
    pub outcome: ToolOutcome,
    /// Normalized error kind label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Result created or addressed by the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<ResultId>,
    /// Wall time spent in the handler.
    pub elapsed_ms: u64,
}

impl ToolAuditEvent {
    /// Builds a `tool_call` event stamped with the current time.
    #[must_use]
    pub fn tool_call(
        tool: impl Into<String>,
        error_kind: Option<&'static str>,
        result_id: Option<ResultId>,
        elapsed_ms: u64,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let outcome = if error_kind.is_some() { ToolOutcome::Error } else { ToolOutcome::Ok };
        Self {
            event: "tool_call",
            timestamp_ms,
            tool: tool.into(),
            outcome,
            error_kind,
            result_id,
            elapsed_ms,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sink for tool call audit events.
pub trait ToolAuditSink: Send + Sync {
    /// Record a tool call event.
    fn record(&self, event: &ToolAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrToolAuditSink;

impl ToolAuditSink for StderrToolAuditSink {
    fn record(&self, event: &ToolAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileToolAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileToolAuditSink {
    /// Opens an audit log file in append mode.
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

impl ToolAuditSink for FileToolAuditSink {
    fn record(&self, event: &ToolAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopToolAuditSink;

impl ToolAuditSink for NoopToolAuditSink {
    fn record(&self, _event: &ToolAuditEvent) {}
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingToolAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<ToolAuditEvent>>,
}

impl RecordingToolAuditSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event.
    #[must_use]
    pub fn events(&self) -> Vec<ToolAuditEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ToolAuditSink for RecordingToolAuditSink {
    fn record(&self, event: &ToolAuditEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}
