// crates/query-gate-store-fs/src/clock.rs
// ============================================================================
// Module: Store Clocks
// Description: Wall-clock and manually driven clock implementations.
// Purpose: Supply the instants used for creation times and eviction.
// Dependencies: query-gate-core
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads the host clock. [`ManualClock`] only moves when told
//! to, which makes TTL and age-based trims deterministic in tests and tools.
//! Lock staleness is judged from file modification times and does not go
//! through these clocks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use query_gate_core::Clock;
use query_gate_core::MILLIS_PER_HOUR;
use query_gate_core::Timestamp;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// Clock backed by the host wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}

/// Clock that advances only on request.
pub struct ManualClock {
    /// Current instant in unix milliseconds.
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a clock pinned at `start`.
    #[must_use]
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now_ms: AtomicI64::new(start.as_unix_millis()),
        }
    }

    /// Moves the clock to `instant`.
    pub fn set(&self, instant: Timestamp) {
        self.now_ms.store(instant.as_unix_millis(), Ordering::SeqCst);
    }

    /// Advances the clock by `millis`.
    pub fn advance_millis(&self, millis: i64) {
        self.now_ms.fetch_add(millis, Ordering::SeqCst);
    }

    /// Advances the clock by whole hours.
    pub fn advance_hours(&self, hours: i64) {
        self.advance_millis(hours.saturating_mul(MILLIS_PER_HOUR));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.now_ms.load(Ordering::SeqCst))
    }
}
