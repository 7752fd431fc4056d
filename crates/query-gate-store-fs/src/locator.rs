// crates/query-gate-store-fs/src/locator.rs
// ============================================================================
// Module: Result Locators
// Description: Mapping between result identifiers and external handles.
// Purpose: Address stored results without exposing filesystem layout.
// Dependencies: query-gate-core, thiserror
// ============================================================================

//! ## Overview
//! A locator is `query-gate://results/<id>`. The mapping is pure and
//! stateless: it neither touches disk nor checks that the result exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use query_gate_core::IdentifierError;
use query_gate_core::ResultId;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fixed prefix of every result locator.
pub const RESULT_LOCATOR_PREFIX: &str = "query-gate://results";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing locators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    /// Locator does not start with the result prefix.
    #[error("locator {0:?} is not a result locator")]
    ForeignPrefix(String),
    /// Locator carries an invalid result id.
    #[error("locator carries an invalid result id: {0}")]
    InvalidId(#[from] IdentifierError),
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// Returns the locator for a result.
#[must_use]
pub fn to_locator(id: &ResultId) -> String {
    format!("{RESULT_LOCATOR_PREFIX}/{id}")
}

/// Parses a locator back into a result identifier.
///
/// # Errors
///
/// Returns [`LocatorError`] for foreign prefixes and invalid identifiers.
pub fn from_locator(locator: &str) -> Result<ResultId, LocatorError> {
    let id = locator
        .strip_prefix(RESULT_LOCATOR_PREFIX)
        .and_then(|rest| rest.strip_prefix('/'))
        .ok_or_else(|| LocatorError::ForeignPrefix(locator.to_string()))?;
    Ok(ResultId::parse(id)?)
}

/// Accepts either a bare result identifier or a locator.
///
/// # Errors
///
/// Returns [`LocatorError`] when neither form parses.
pub fn parse_reference(reference: &str) -> Result<ResultId, LocatorError> {
    if reference.contains("://") {
        from_locator(reference)
    } else {
        Ok(ResultId::parse(reference)?)
    }
}
