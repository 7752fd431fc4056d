// crates/query-gate-config/src/lib.rs
// ============================================================================
// Module: Query Gate Config Library
// Description: Canonical config model, loading, and validation.
// Purpose: Single source of truth for query-gate.toml semantics.
// Dependencies: query-gate-store-fs, serde, toml
// ============================================================================

//! ## Overview
//! `query-gate-config` defines the configuration model for the query gate:
//! the result storage root and limits, catalog lock timing, and the event
//! log destination. Validation is strict and fail-closed.
//!
//! Security posture: config inputs are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
