// crates/query-gate-config/src/config.rs
// ============================================================================
// Module: Query Gate Configuration
// Description: Configuration loading and validation for query-gate.toml.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: query-gate-store-fs, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The `[storage]` section converts into the store's own
//! [`ResultStoreConfig`], so the same validation guards direct construction
//! and file-driven startup. Missing or invalid configuration fails closed.
//! Security posture: config inputs are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use query_gate_store_fs::LockConfig;
use query_gate_store_fs::ResultStoreConfig;
use query_gate_store_fs::StoreError;
use query_gate_store_fs::config::DEFAULT_LOCK_POLL_INTERVAL_MS;
use query_gate_store_fs::config::DEFAULT_LOCK_STALE_AFTER_MS;
use query_gate_store_fs::config::DEFAULT_LOCK_WAIT_TIMEOUT_MS;
use query_gate_store_fs::config::DEFAULT_MAX_PAYLOAD_BYTES;
use query_gate_store_fs::config::DEFAULT_MAX_RESOURCE_BYTES;
use query_gate_store_fs::config::DEFAULT_PREVIEW_BYTES;
use query_gate_store_fs::config::DEFAULT_PREVIEW_MAX_BYTES;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "query-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "QUERY_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level query gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryGateConfig {
    /// Result storage configuration.
    pub storage: StorageConfig,
    /// Operational event logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional config source metadata (not serialized).
    #[serde(skip)]
    pub source_modified_at: Option<SystemTime>,
}

impl QueryGateConfig {
    /// Creates a configuration with defaults for the given storage root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig::with_root(root),
            logging: LoggingConfig::default(),
            source_modified_at: None,
        }
    }

    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `QUERY_GATE_CONFIG`, then
    /// `query-gate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_modified_at = fs::metadata(&resolved).and_then(|meta| meta.modified()).ok();
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for inconsistent values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.logging.validate()
    }
}

/// Result storage configuration (`[storage]`).
///
/// # Invariants
/// - `preview_default_bytes <= preview_max_bytes <= max_resource_bytes` once validated.
/// - `ttl_hours` is disabled unless set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Storage root directory.
    pub root: PathBuf,
    /// Preview cap for fetches that do not name one.
    #[serde(default = "default_preview_bytes")]
    pub preview_default_bytes: u64,
    /// Hard ceiling for preview fetches.
    #[serde(default = "default_preview_max_bytes")]
    pub preview_max_bytes: u64,
    /// Maximum size served by full reads.
    #[serde(default = "default_max_resource_bytes")]
    pub max_resource_bytes: u64,
    /// Maximum size accepted for a new payload.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: u64,
    /// Optional time-to-live in hours applied by sweeps.
    #[serde(default)]
    pub ttl_hours: Option<f64>,
    /// Optional global entry limit applied by sweeps.
    #[serde(default)]
    pub max_entries: Option<usize>,
    /// Optional age in seconds after which untracked payload files are deleted.
    #[serde(default)]
    pub orphan_grace_secs: Option<u64>,
    /// Hand trusted local callers the absolute payload path.
    #[serde(default)]
    pub expose_local_paths: bool,
    /// Run a sweep when the gateway starts.
    #[serde(default = "default_sweep_on_startup")]
    pub sweep_on_startup: bool,
    /// Catalog lock timing (`[storage.lock]`).
    #[serde(default)]
    pub lock: StorageLockConfig,
}

impl StorageConfig {
    /// Creates storage settings with defaults for the given root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
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
            lock: StorageLockConfig::default(),
        }
    }

    /// Converts to the store configuration.
    #[must_use]
    pub fn to_store_config(&self) -> ResultStoreConfig {
        ResultStoreConfig {
            root: self.root.clone(),
            preview_default_bytes: self.preview_default_bytes,
            preview_max_bytes: self.preview_max_bytes,
            max_resource_bytes: self.max_resource_bytes,
            max_payload_bytes: self.max_payload_bytes,
            ttl_hours: self.ttl_hours,
            max_entries: self.max_entries,
            orphan_grace_secs: self.orphan_grace_secs,
            expose_local_paths: self.expose_local_paths,
            sweep_on_startup: self.sweep_on_startup,
            lock: self.lock.to_lock_config(),
        }
    }

    /// Validates storage settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("storage.root", &self.root.to_string_lossy())?;
        self.to_store_config().validate().map_err(|err| match err {
            StoreError::Invalid(message) => ConfigError::Invalid(format!("storage.{message}")),
            other => ConfigError::Invalid(format!("storage: {other}")),
        })
    }
}

/// Catalog lock timing (`[storage.lock]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageLockConfig {
    /// Overall wait budget in milliseconds.
    #[serde(default = "default_lock_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Sleep between attempts in milliseconds.
    #[serde(default = "default_lock_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Marker age in milliseconds after which a holder is presumed dead.
    #[serde(default = "default_lock_stale_after_ms")]
    pub stale_after_ms: u64,
}

impl Default for StorageLockConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: DEFAULT_LOCK_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_LOCK_POLL_INTERVAL_MS,
            stale_after_ms: DEFAULT_LOCK_STALE_AFTER_MS,
        }
    }
}

impl StorageLockConfig {
    /// Converts to the store lock configuration.
    #[must_use]
    pub const fn to_lock_config(self) -> LockConfig {
        LockConfig {
            wait_timeout_ms: self.wait_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
            stale_after_ms: self.stale_after_ms,
        }
    }
}

/// Event log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// Operational event logging (`[logging]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Event destination.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path, required for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.path is required for the file sink".to_string()))
            }
            (LogSinkKind::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            (LogSinkKind::Stderr | LogSinkKind::None, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid for the file sink".to_string(),
            )),
            (LogSinkKind::Stderr | LogSinkKind::None, None) => Ok(()),
        }
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
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
