// crates/query-gate-core/src/core/summary.rs
// ============================================================================
// Module: Query Gate Result Summaries
// Description: Producer-specific digests of large query results.
// Purpose: Give callers a compact inline view of a stored payload.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each query producer describes its raw payload with a small structured
//! digest. Summaries are modeled as a tagged variant so the catalog schema
//! stays precise per producer; the `kind` tag selects the variant on the
//! wire. Summaries are returned inline to callers, so [`ResultSummary::compact`]
//! bounds every list and string before an entry is recorded.
//!
//! Security posture: summaries are echoed to callers and must not carry raw
//! payload bulk; see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of list items retained in a compacted summary.
pub const MAX_SUMMARY_LIST_ITEMS: usize = 32;
/// Maximum number of sample messages retained in a log summary.
pub const MAX_SUMMARY_SAMPLES: usize = 5;
/// Maximum characters retained per summary string.
pub const MAX_SUMMARY_STRING_CHARS: usize = 256;

// ============================================================================
// SECTION: Summary Variants
// ============================================================================

/// Tool-specific digest of a stored result.
///
/// # Invariants
/// - Serialized with an internal `kind` tag (`log_query`, `metrics`, `sql`, `generic`).
/// - Defaults to an empty [`GenericSummary`] when absent from a catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultSummary {
    /// Log search result digest.
    LogQuery(LogQuerySummary),
    /// Metrics query result digest.
    Metrics(MetricsSummary),
    /// Tabular SQL result digest.
    Sql(SqlSummary),
    /// Digest for producers without a dedicated shape.
    Generic(GenericSummary),
}

impl Default for ResultSummary {
    fn default() -> Self {
        Self::Generic(GenericSummary::default())
    }
}

impl ResultSummary {
    /// Returns the stable `kind` label of the summary.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::LogQuery(_) => "log_query",
            Self::Metrics(_) => "metrics",
            Self::Sql(_) => "sql",
            Self::Generic(_) => "generic",
        }
    }

    /// Returns the primary record count the summary reports, if any.
    #[must_use]
    pub const fn record_count(&self) -> Option<u64> {
        match self {
            Self::LogQuery(summary) => Some(summary.returned_rows),
            Self::Metrics(summary) => Some(summary.point_count),
            Self::Sql(summary) => Some(summary.row_count),
            Self::Generic(summary) => summary.record_count,
        }
    }

    /// Returns a copy with every list and string bounded for inline return.
    #[must_use]
    pub fn compact(self) -> Self {
        match self {
            Self::LogQuery(mut summary) => {
                summary.fields = bound_list(summary.fields, MAX_SUMMARY_LIST_ITEMS);
                summary.sample_messages = bound_list(summary.sample_messages, MAX_SUMMARY_SAMPLES);
                Self::LogQuery(summary)
            }
            Self::Metrics(mut summary) => {
                summary.metric_names = bound_list(summary.metric_names, MAX_SUMMARY_LIST_ITEMS);
                Self::Metrics(summary)
            }
            Self::Sql(mut summary) => {
                summary.columns = bound_list(summary.columns, MAX_SUMMARY_LIST_ITEMS);
                Self::Sql(summary)
            }
            Self::Generic(mut summary) => {
                summary.note = summary.note.map(|note| bound_string(&note));
                Self::Generic(summary)
            }
        }
    }
}

/// Digest of a log search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogQuerySummary {
    /// Total hits reported by the backend, when known.
    pub total_hits: Option<u64>,
    /// Rows present in the stored payload.
    pub returned_rows: u64,
    /// Queried time range, when the producer reports one.
    pub time_range: Option<TimeRange>,
    /// Field names observed in the returned rows.
    pub fields: Vec<String>,
    /// A few representative log lines.
    pub sample_messages: Vec<String>,
}

/// Digest of a metrics query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSummary {
    /// Number of returned series.
    pub series_count: u64,
    /// Total data points across all series.
    pub point_count: u64,
    /// Query step in seconds, for range queries.
    pub step_seconds: Option<u64>,
    /// Metric names present in the result.
    pub metric_names: Vec<String>,
}

/// Digest of a tabular SQL result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlSummary {
    /// Rows present in the stored payload.
    pub row_count: u64,
    /// Column names in result order.
    pub columns: Vec<String>,
    /// True when the backend itself truncated the result set.
    pub truncated_by_backend: bool,
}

/// Digest for producers without a dedicated summary shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericSummary {
    /// Record count, when meaningful.
    pub record_count: Option<u64>,
    /// Free-form producer note.
    pub note: Option<String>,
}

/// Inclusive time range expressed as producer-supplied strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Range start.
    pub from: String,
    /// Range end.
    pub to: String,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Truncates a list and every string in it.
fn bound_list(values: Vec<String>, max_items: usize) -> Vec<String> {
    values.into_iter().take(max_items).map(|value| bound_string(&value)).collect()
}

/// Truncates a string to [`MAX_SUMMARY_STRING_CHARS`] characters.
fn bound_string(value: &str) -> String {
    value.chars().take(MAX_SUMMARY_STRING_CHARS).collect()
}
