// crates/query-gate-store-fs/src/config.rs
// ============================================================================
// Module: Result Store Configuration
// Description: Storage root, size limits, eviction, and lock timing settings.
// Purpose: Inject all store tunables explicitly at construction time.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`ResultStoreConfig`] carries every tunable the store reads. Stores are
//! built from an explicit config value, so independent instances (including
//! parallel test instances) can point at distinct roots with distinct timing.
//! [`ResultStoreConfig::validate`] runs on construction and rejects
//! inconsistent limits before any file is touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::StoreError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Catalog document file name under the storage root.
pub const CATALOG_FILE_NAME: &str = "catalog.json";
/// Lock marker file name under the storage root.
pub const LOCK_FILE_NAME: &str = "catalog.lock";
/// Payload directory name under the storage root.
pub const RESULTS_DIR_NAME: &str = "results";

/// Default preview cap applied when a fetch does not name one.
pub const DEFAULT_PREVIEW_BYTES: u64 = 64 * 1024;
/// Default hard ceiling for preview fetches.
pub const DEFAULT_PREVIEW_MAX_BYTES: u64 = 256 * 1024;
/// Default maximum size for full resource reads.
pub const DEFAULT_MAX_RESOURCE_BYTES: u64 = 8 * 1024 * 1024;
/// Default maximum size of a persisted payload.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 256 * 1024 * 1024;
/// Default lock wait budget in milliseconds.
pub const DEFAULT_LOCK_WAIT_TIMEOUT_MS: u64 = 10_000;
/// Default lock poll interval in milliseconds.
pub const DEFAULT_LOCK_POLL_INTERVAL_MS: u64 = 50;
/// Default lock staleness threshold in milliseconds.
pub const DEFAULT_LOCK_STALE_AFTER_MS: u64 = 30_000;
/// Upper bound for any lock timing value in milliseconds.
pub const MAX_LOCK_TIMING_MS: u64 = 600_000;
/// Maximum total storage root path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single storage root path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Lock timing configuration.
///
/// # Invariants
/// - `poll_interval_ms < wait_timeout_ms` and `poll_interval_ms < stale_after_ms` once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Overall wait budget for acquiring the lock.
    #[serde(default = "default_lock_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Sleep between acquisition attempts.
    #[serde(default = "default_lock_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Marker age after which a holder is presumed dead.
    #[serde(default = "default_lock_stale_after_ms")]
    pub stale_after_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: DEFAULT_LOCK_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_LOCK_POLL_INTERVAL_MS,
            stale_after_ms: DEFAULT_LOCK_STALE_AFTER_MS,
        }
    }
}

impl LockConfig {
    /// Returns the wait budget as a duration.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Returns the poll interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the staleness threshold as a duration.
    #[must_use]
    pub const fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    /// Validates lock timing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when a value is out of range.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_timing("lock.wait_timeout_ms", self.wait_timeout_ms)?;
        validate_timing("lock.poll_interval_ms", self.poll_interval_ms)?;
        validate_timing("lock.stale_after_ms", self.stale_after_ms)?;
        if self.poll_interval_ms >= self.wait_timeout_ms {
            return Err(StoreError::Invalid(
                "lock.poll_interval_ms must be less than lock.wait_timeout_ms".to_string(),
            ));
        }
        if self.poll_interval_ms >= self.stale_after_ms {
            return Err(StoreError::Invalid(
                "lock.poll_interval_ms must be less than lock.stale_after_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the filesystem result store.
///
/// # Invariants
/// - `preview_default_bytes <= preview_max_bytes <= max_resource_bytes` once validated.
/// - `ttl_hours`, when set, is finite and positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultStoreConfig {
    /// Storage root holding the catalog, lock marker, and payload directory.
    pub root: PathBuf,
    /// Preview cap applied when a fetch does not name one.
    #[serde(default = "default_preview_bytes")]
    pub preview_default_bytes: u64,
    /// Hard ceiling for preview fetches regardless of caller request.
    #[serde(default = "default_preview_max_bytes")]
    pub preview_max_bytes: u64,
    /// Maximum size served by full resource reads.
    #[serde(default = "default_max_resource_bytes")]
    pub max_resource_bytes: u64,
    /// Maximum size accepted for a new payload.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
    /// Optional time-to-live applied by sweeps (disabled when absent).
    #[serde(default)]
    pub ttl_hours: Option<f64>,
    /// Optional global entry limit applied by sweeps.
    #[serde(default)]
    pub max_entries: Option<usize>,
    /// Optional age after which untracked payload files are deleted by sweeps.
    #[serde(default)]
    pub orphan_grace_secs: Option<u64>,
    /// Record local-path delivery and hand trusted callers the absolute path.
    #[serde(default)]
    pub expose_local_paths: bool,
    /// Run a sweep when the gateway starts.
    #[serde(default = "default_sweep_on_startup")]
    pub sweep_on_startup: bool,
    /// Lock timing.
    #[serde(default)]
    pub lock: LockConfig,
}

impl ResultStoreConfig {
    /// Creates a configuration with default limits for the given root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            preview_default_bytes: DEFAULT_PREVIEW_BYTES,
            preview_max_bytes: DEFAULT_PREVIEW_MAX_BYTES,
            max_resource_bytes: DEFAULT_MAX_RESOURCE_BYTES,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            ttl_hours: None,
            max_entries: None,
            orphan_grace_secs: None,
            expose_local_paths: false,
            sweep_on_startup: true,
            lock: LockConfig::default(),
        }
    }

    /// Returns the catalog document path.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(CATALOG_FILE_NAME)
    }

    /// Returns the lock marker path.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    /// Returns the payload directory path.
    #[must_use]
    pub fn results_dir(&self) -> PathBuf {
        self.root.join(RESULTS_DIR_NAME)
    }

    /// Returns the preview cap for a requested budget, bounded by the server ceiling.
    #[must_use]
    pub fn effective_preview_cap(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(self.preview_default_bytes).min(self.preview_max_bytes)
    }

    /// Validates configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_root(&self.root)?;
        for (field, value) in [
            ("preview_default_bytes", self.preview_default_bytes),
            ("preview_max_bytes", self.preview_max_bytes),
            ("max_resource_bytes", self.max_resource_bytes),
            ("max_payload_bytes", self.max_payload_bytes),
        ] {
            if value == 0 {
                return Err(StoreError::Invalid(format!("{field} must be greater than zero")));
            }
        }
        if self.preview_default_bytes > self.preview_max_bytes {
            return Err(StoreError::Invalid(
                "preview_default_bytes must not exceed preview_max_bytes".to_string(),
            ));
        }
        if self.preview_max_bytes > self.max_resource_bytes {
            return Err(StoreError::Invalid(
                "preview_max_bytes must not exceed max_resource_bytes".to_string(),
            ));
        }
        if let Some(hours) = self.ttl_hours
            && !(hours.is_finite() && hours > 0.0)
        {
            return Err(StoreError::Invalid("ttl_hours must be a positive number".to_string()));
        }
        if self.max_entries == Some(0) {
            return Err(StoreError::Invalid("max_entries must be greater than zero".to_string()));
        }
        self.lock.validate()
    }
}

/// Returns the default preview cap.
const fn default_preview_bytes() -> u64 {
    DEFAULT_PREVIEW_BYTES
}

/// Returns the default preview ceiling.
const fn default_preview_max_bytes() -> u64 {
    DEFAULT_PREVIEW_MAX_BYTES
}

/// Returns the default full-read limit.
const fn default_max_resource_bytes() -> u64 {
    DEFAULT_MAX_RESOURCE_BYTES
}

/// Returns the default payload limit.
const fn default_max_payload_bytes() -> u64 {
    DEFAULT_MAX_PAYLOAD_BYTES
}

/// Startup sweeps are on unless disabled.
const fn default_sweep_on_startup() -> bool {
    true
}

/// Returns the default lock wait budget.
const fn default_lock_wait_timeout_ms() -> u64 {
    DEFAULT_LOCK_WAIT_TIMEOUT_MS
}

/// Returns the default lock poll interval.
const fn default_lock_poll_interval_ms() -> u64 {
    DEFAULT_LOCK_POLL_INTERVAL_MS
}

/// Returns the default staleness threshold.
const fn default_lock_stale_after_ms() -> u64 {
    DEFAULT_LOCK_STALE_AFTER_MS
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates a lock timing value against `[1, MAX_LOCK_TIMING_MS]`.
fn validate_timing(field: &str, value_ms: u64) -> Result<(), StoreError> {
    if value_ms == 0 || value_ms > MAX_LOCK_TIMING_MS {
        return Err(StoreError::Invalid(format!(
            "{field} must be between 1 and {MAX_LOCK_TIMING_MS} ms"
        )));
    }
    Ok(())
}

/// Validates the storage root for safety limits.
fn validate_root(path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::Invalid("root must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StoreError::Invalid("root exceeds path length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StoreError::Invalid("root contains an overlong component".to_string()));
        }
    }
    if path.is_file() {
        return Err(StoreError::Invalid("root must be a directory, not a file".to_string()));
    }
    Ok(())
}
