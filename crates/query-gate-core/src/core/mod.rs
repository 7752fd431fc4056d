// crates/query-gate-core/src/core/mod.rs
// ============================================================================
// Module: Query Gate Core Types
// Description: Canonical identifiers, payload, and summary structures.
// Purpose: Provide stable, serializable types shared by store and gateway.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types describe what a stored query result is: who produced it, what
//! format its bytes use, how it is summarized, and when it was created.
//! These types are the canonical source for the catalog document schema and
//! every gateway response.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod hashing;
pub mod identifiers;
pub mod inputs;
pub mod payload;
pub mod summary;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::DatasourceId;
pub use identifiers::IdentifierError;
pub use identifiers::ResultId;
pub use identifiers::ToolTag;
pub use inputs::input_digest;
pub use inputs::sanitize_inputs;
pub use payload::PayloadFormat;
pub use payload::RawPayload;
pub use summary::GenericSummary;
pub use summary::LogQuerySummary;
pub use summary::MetricsSummary;
pub use summary::ResultSummary;
pub use summary::SqlSummary;
pub use summary::TimeRange;
pub use time::MILLIS_PER_HOUR;
pub use time::Timestamp;
