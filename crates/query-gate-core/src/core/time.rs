// crates/query-gate-core/src/core/time.rs
// ============================================================================
// Module: Query Gate Time Model
// Description: Canonical timestamp representation for catalog records.
// Purpose: Provide explicit, comparable time values for result lifecycles.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Catalog records carry unix-millisecond timestamps. The core never reads
//! wall-clock time directly; hosts supply instants through a
//! [`crate::interfaces::Clock`] so eviction decisions stay reproducible under
//! test.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: i64 = 3_600_000;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Unix epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; no validation is performed.
/// - Ordering follows the numeric millisecond value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// Creates a timestamp from unix milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp shifted by `millis` (saturating).
    #[must_use]
    pub const fn saturating_add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Returns the milliseconds elapsed from `self` to `later`, clamped at zero.
    #[must_use]
    pub const fn millis_until(self, later: Self) -> i64 {
        let delta = later.0.saturating_sub(self.0);
        if delta < 0 { 0 } else { delta }
    }

    /// Renders the timestamp as an RFC 3339 string.
    ///
    /// Out-of-range values fall back to the raw millisecond count.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }

    /// Parses an RFC 3339 string into a timestamp.
    #[must_use]
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339).ok()?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).ok().map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}
