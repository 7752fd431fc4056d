// crates/query-gate-store-fs/src/prune.rs
// ============================================================================
// Module: Result Pruner
// Description: Sweep reconciliation and caller-driven trimming.
// Purpose: Keep the catalog consistent with disk and bounded in age and count.
// Dependencies: query-gate-core, serde
// ============================================================================

//! ## Overview
//! [`ResultStore::sweep`] reconciles the catalog with the payload directory:
//! entries whose file vanished are dropped, cached sizes are refreshed, and the
//! configured TTL and entry limit are applied. [`ResultStore::trim`] applies a
//! caller-supplied age cutoff and count limit.
//!
//! ## Invariants
//! - Removal decisions happen in one locked section; payload files are
//!   deleted after the lock is released. A crash between the two leaves only
//!   untracked files, never entries pointing at nothing.
//! - After a sweep that observed no stat failures, every catalog entry has a
//!   backing file.
//! - Untracked files are only touched when orphan reconciliation is enabled,
//!   and only once they are older than the grace period.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;

use query_gate_core::CatalogChange;
use query_gate_core::MILLIS_PER_HOUR;
use query_gate_core::PayloadFormat;
use query_gate_core::ResultId;
use query_gate_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::catalog::CatalogMap;
use crate::catalog::newest_first;
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::events::StoreEventKind;
use crate::store::FileRemoval;
use crate::store::ResultStore;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Caller-driven trim request.
///
/// # Invariants
/// - At least one limit is set.
/// - `max_age_hours`, when set, is finite and non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrimRequest {
    /// Remove entries strictly older than this many hours.
    #[serde(default)]
    pub max_age_hours: Option<f64>,
    /// Keep only this many newest entries.
    #[serde(default)]
    pub max_count: Option<usize>,
}

impl TrimRequest {
    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for empty requests and unusable ages.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_age_hours.is_none() && self.max_count.is_none() {
            return Err(StoreError::Invalid(
                "trim requires max_age_hours or max_count".to_string(),
            ));
        }
        if let Some(hours) = self.max_age_hours
            && !(hours.is_finite() && hours >= 0.0)
        {
            return Err(StoreError::Invalid(
                "max_age_hours must be a finite, non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a trim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrimReport {
    /// Removed identifiers, newest first.
    pub removed: Vec<ResultId>,
    /// Entries left in the catalog.
    pub remaining: usize,
    /// Payload files deleted.
    pub files_deleted: usize,
    /// Payload files that could not be deleted.
    pub delete_failures: usize,
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries dropped because their file was missing.
    pub missing_removed: usize,
    /// Entries dropped by the TTL.
    pub expired_removed: usize,
    /// Entries dropped by the global entry limit.
    pub over_limit_removed: usize,
    /// Entries whose cached size changed.
    pub sizes_refreshed: usize,
    /// Payload files deleted for removed entries.
    pub files_deleted: usize,
    /// Payload files that could not be deleted.
    pub delete_failures: usize,
    /// Untracked payload files deleted.
    pub orphans_deleted: usize,
}

impl SweepReport {
    /// Returns the number of entries removed from the catalog.
    #[must_use]
    pub const fn entries_removed(&self) -> usize {
        self.missing_removed + self.expired_removed + self.over_limit_removed
    }
}

/// Entries removed in a locked section, grouped by whether a file remains.
#[derive(Default)]
struct Removal {
    /// Entries whose file is already gone.
    missing: Vec<ResultId>,
    /// Entries whose file must be deleted after the lock.
    with_files: Vec<CatalogEntry>,
}

impl Removal {
    /// Returns every removed identifier.
    fn ids(&self) -> Vec<ResultId> {
        self.missing.iter().cloned().chain(self.with_files.iter().map(|entry| entry.id.clone())).collect()
    }
}

// ============================================================================
// SECTION: Pruning
// ============================================================================

impl ResultStore {
    /// Reconciles the catalog with disk and applies TTL and entry limits.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockTimeout`] when the lock is unavailable and
    /// [`StoreError::Io`] when the catalog cannot be read or written. File
    /// deletion failures are counted, not returned.
    pub fn sweep(&self) -> Result<SweepReport, StoreError> {
        self.initialize()?;
        let now = self.deps.clock.now();
        let ttl_ms = self.config.ttl_hours.map(hours_to_millis);
        let max_entries = self.config.max_entries;
        let mut report = SweepReport::default();

        let removal = self.catalog.with_write_lock(|entries| {
            let mut removal = Removal::default();
            let mut changed = false;
            let ids: Vec<ResultId> = entries.keys().cloned().collect();
            for id in ids {
                let Some(entry) = entries.get_mut(&id) else {
                    continue;
                };
                match fs::metadata(&entry.path) {
                    Ok(metadata) => {
                        if metadata.len() != entry.size_bytes {
                            entry.size_bytes = metadata.len();
                            report.sizes_refreshed += 1;
                            changed = true;
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        entries.remove(&id);
                        removal.missing.push(id);
                        report.missing_removed += 1;
                        changed = true;
                    }
                    Err(err) => {
                        // Unreadable but maybe present; keep the entry.
                        self.record(
                            StoreEvent::new(StoreEventKind::FileDeleteFailed)
                                .with_result(&id)
                                .with_error(&StoreError::io("stat payload during sweep", err)),
                        );
                    }
                }
            }
            if let Some(ttl_ms) = ttl_ms {
                let expired = take_older_than(entries, now, ttl_ms);
                report.expired_removed = expired.len();
                changed |= !expired.is_empty();
                removal.with_files.extend(expired);
            }
            if let Some(limit) = max_entries {
                let surplus = take_beyond_newest(entries, limit);
                report.over_limit_removed = surplus.len();
                changed |= !surplus.is_empty();
                removal.with_files.extend(surplus);
            }
            Ok((removal, changed))
        })?;

        let (files_deleted, delete_failures) = self.delete_files(&removal.with_files);
        report.files_deleted = files_deleted;
        report.delete_failures = delete_failures;
        if let Some(grace_secs) = self.config.orphan_grace_secs {
            report.orphans_deleted = self.delete_orphans(Duration::from_secs(grace_secs))?;
        }

        self.record(StoreEvent::new(StoreEventKind::SweepCompleted).with_detail(format!(
            "removed {} (missing {}, expired {}, over limit {}), refreshed {}, orphans {}",
            report.entries_removed(),
            report.missing_removed,
            report.expired_removed,
            report.over_limit_removed,
            report.sizes_refreshed,
            report.orphans_deleted
        )));
        let removed = removal.ids();
        if !removed.is_empty() {
            self.notify(&CatalogChange::Pruned {
                removed,
            });
        }
        Ok(report)
    }

    /// Removes entries by age, then keeps only the newest `max_count`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for unusable requests,
    /// [`StoreError::LockTimeout`] when the lock is unavailable, and
    /// [`StoreError::Io`] when the catalog cannot be read or written.
    pub fn trim(&self, request: TrimRequest) -> Result<TrimReport, StoreError> {
        request.validate()?;
        self.initialize()?;
        let now = self.deps.clock.now();

        let (mut removed, remaining) = self.catalog.with_write_lock(|entries| {
            let mut removed = Vec::new();
            if let Some(hours) = request.max_age_hours {
                removed.extend(take_older_than(entries, now, hours_to_millis(hours)));
            }
            if let Some(limit) = request.max_count {
                removed.extend(take_beyond_newest(entries, limit));
            }
            let changed = !removed.is_empty();
            Ok(((removed, entries.len()), changed))
        })?;

        removed.sort_by(newest_first);
        let (files_deleted, delete_failures) = self.delete_files(&removed);
        let report = TrimReport {
            removed: removed.into_iter().map(|entry| entry.id).collect(),
            remaining,
            files_deleted,
            delete_failures,
        };
        self.record(StoreEvent::new(StoreEventKind::TrimCompleted).with_detail(format!(
            "removed {}, remaining {}, delete failures {}",
            report.removed.len(),
            report.remaining,
            report.delete_failures
        )));
        if !report.removed.is_empty() {
            self.notify(&CatalogChange::Pruned {
                removed: report.removed.clone(),
            });
        }
        Ok(report)
    }

    /// Deletes payload files for removed entries; returns (deleted, failed).
    fn delete_files(&self, entries: &[CatalogEntry]) -> (usize, usize) {
        let mut deleted = 0;
        let mut failed = 0;
        for entry in entries {
            match self.remove_payload_file(&entry.id, &entry.path) {
                FileRemoval::Deleted => deleted += 1,
                FileRemoval::Missing => {}
                FileRemoval::Failed => failed += 1,
            }
        }
        (deleted, failed)
    }

    /// Deletes untracked payload files older than `grace`.
    fn delete_orphans(&self, grace: Duration) -> Result<usize, StoreError> {
        let results_dir = self.config.results_dir();
        let tracked: BTreeSet<ResultId> = self.catalog.load()?.into_keys().collect();
        let listing = match fs::read_dir(&results_dir) {
            Ok(listing) => listing,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => {
                return Err(StoreError::io(format!("list {}", results_dir.display()), err));
            }
        };
        let now = SystemTime::now();
        let mut deleted = 0;
        for dir_entry in listing.flatten() {
            let path = dir_entry.path();
            let Some(id) = payload_file_id(&path) else {
                continue;
            };
            if tracked.contains(&id) {
                continue;
            }
            let old_enough = dir_entry
                .metadata()
                .ok()
                .filter(std::fs::Metadata::is_file)
                .and_then(|metadata| metadata.modified().ok())
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age >= grace);
            if !old_enough {
                continue;
            }
            if self.remove_payload_file(&id, &path) == FileRemoval::Deleted {
                deleted += 1;
                self.record(
                    StoreEvent::new(StoreEventKind::OrphanDeleted)
                        .with_result(&id)
                        .with_detail(path.display().to_string()),
                );
            }
        }
        Ok(deleted)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Removes entries whose age at `now` exceeds `max_age_ms`.
fn take_older_than(entries: &mut CatalogMap, now: Timestamp, max_age_ms: i64) -> Vec<CatalogEntry> {
    let expired: Vec<ResultId> = entries
        .values()
        .filter(|entry| entry.created_at.millis_until(now) > max_age_ms)
        .map(|entry| entry.id.clone())
        .collect();
    expired.iter().filter_map(|id| entries.remove(id)).collect()
}

/// Removes every entry beyond the `keep` newest.
fn take_beyond_newest(entries: &mut CatalogMap, keep: usize) -> Vec<CatalogEntry> {
    if entries.len() <= keep {
        return Vec::new();
    }
    let mut ordered: Vec<&CatalogEntry> = entries.values().collect();
    ordered.sort_by(|left, right| newest_first(left, right));
    let surplus: Vec<ResultId> = ordered.into_iter().skip(keep).map(|entry| entry.id.clone()).collect();
    surplus.iter().filter_map(|id| entries.remove(id)).collect()
}

/// Converts fractional hours to whole milliseconds.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "Validated finite, non-negative hours; saturating float-to-int cast is intended."
)]
fn hours_to_millis(hours: f64) -> i64 {
    (hours * MILLIS_PER_HOUR as f64) as i64
}

/// Returns the result id encoded in a payload file name, if it is one.
fn payload_file_id(path: &Path) -> Option<ResultId> {
    let stem = path.file_stem()?.to_str()?;
    let extension = path.extension()?.to_str()?;
    PayloadFormat::from_extension(extension)?;
    ResultId::parse(stem).ok()
}
