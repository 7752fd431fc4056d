// crates/query-gate-store-fs/src/catalog.rs
// ============================================================================
// Module: Result Catalog
// Description: Catalog records, the on-disk document, and locked mutation.
// Purpose: Keep one durable index of stored results shared across processes.
// Dependencies: query-gate-core, serde, serde_json, tempfile
// ============================================================================

//! ## Overview
//! The catalog maps result identifiers to [`CatalogEntry`] records. It is
//! mirrored in memory and persisted as one JSON document under the storage
//! root. The document on disk is the source of truth: every mutation goes
//! through [`CatalogStore::with_write_lock`], which acquires the file lock,
//! reloads the document, applies the mutation, saves when something changed,
//! and always releases the lock.
//!
//! Loading tolerates a missing document (empty catalog), individually
//! malformed entries (skipped), and an unparsable document (reset to empty).
//! Saves go through a temp file and rename so lock-free readers never see a
//! torn document.
//!
//! Security posture: catalog documents may be edited by other processes and
//! are treated as untrusted input; see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use query_gate_core::Clock;
use query_gate_core::DatasourceId;
use query_gate_core::HashDigest;
use query_gate_core::PayloadFormat;
use query_gate_core::ResultId;
use query_gate_core::ResultSummary;
use query_gate_core::Timestamp;
use query_gate_core::ToolTag;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::config::CATALOG_FILE_NAME;
use crate::config::LockConfig;
use crate::config::RESULTS_DIR_NAME;
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::events::StoreEventKind;
use crate::events::StoreEventSink;
use crate::lock::FileLock;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Catalog document format version written by this crate.
pub const CATALOG_FORMAT_VERSION: u32 = 1;
/// Tool tag assumed for records that omit one.
const UNKNOWN_TOOL: &str = "unknown";

// ============================================================================
// SECTION: Records
// ============================================================================

/// How a result handle was handed to its caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Opaque locator only.
    #[default]
    Locator,
    /// Locator plus the absolute file path (trusted local callers).
    LocalPath,
}

/// Delivery bookkeeping for a stored result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryRecord {
    /// Locator returned to the caller.
    pub locator: String,
    /// Delivery mode.
    pub mode: DeliveryMode,
}

/// One stored result.
///
/// # Invariants
/// - `id` is unique for the lifetime of the storage root.
/// - Immutable after creation except for `size_bytes`, which sweeps refresh.
/// - While present, `path` should exist; sweeps enforce this opportunistically.
/// - `path` is `<root>/results/<file_name>` with `file_name` = `<id>.<ext>`;
///   loaded entries that break this are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Result identifier.
    pub id: ResultId,
    /// Producing tool tag.
    #[serde(default = "unknown_tool")]
    pub tool: ToolTag,
    /// Backend datasource, when the producer names one.
    #[serde(default)]
    pub datasource_id: Option<DatasourceId>,
    /// Payload format.
    #[serde(default)]
    pub format: PayloadFormat,
    /// Absolute payload file path.
    pub path: PathBuf,
    /// Payload file name.
    pub file_name: String,
    /// Payload size in bytes as last observed.
    #[serde(default)]
    pub size_bytes: u64,
    /// Creation time.
    #[serde(default)]
    pub created_at: Timestamp,
    /// Sanitized query arguments.
    #[serde(default)]
    pub inputs: Value,
    /// Digest of the sanitized arguments.
    #[serde(default)]
    pub input_hash: Option<HashDigest>,
    /// Producer summary.
    #[serde(default)]
    pub summary: ResultSummary,
    /// Delivery bookkeeping.
    #[serde(default)]
    pub delivery: DeliveryRecord,
}

/// Returns the tool tag assumed for records that omit one.
fn unknown_tool() -> ToolTag {
    ToolTag::new(UNKNOWN_TOOL)
}

/// Orders entries newest-first: creation time descending, then id descending.
#[must_use]
pub fn newest_first(left: &CatalogEntry, right: &CatalogEntry) -> Ordering {
    right.created_at.cmp(&left.created_at).then_with(|| right.id.cmp(&left.id))
}

/// In-memory catalog keyed by result identifier.
pub type CatalogMap = BTreeMap<ResultId, CatalogEntry>;

/// On-disk catalog document.
///
/// # Invariants
/// - Unknown fields are ignored and missing fields default, so documents
///   written by newer or older processes still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogDocument {
    /// Document format version.
    pub format_version: u32,
    /// Generation time (RFC 3339).
    pub generated_at: String,
    /// Entries, newest first.
    pub entries: Vec<CatalogEntry>,
}

/// Document shape used while loading so one bad entry cannot sink the rest.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LenientCatalogDocument {
    /// Raw entry values.
    entries: Vec<Value>,
}

/// Outcome of reading the document from disk.
enum DocumentRead {
    /// No document exists.
    Missing,
    /// Document parsed; entries keyed by id.
    Parsed(CatalogMap),
    /// Document could not be parsed.
    Corrupt(String),
}

// ============================================================================
// SECTION: Catalog Store
// ============================================================================

/// Catalog mirrored between memory and the on-disk document.
pub struct CatalogStore {
    /// Storage root (temp files for atomic saves live here).
    root: PathBuf,
    /// Catalog document path.
    document_path: PathBuf,
    /// Directory every entry's payload must live in.
    results_dir: PathBuf,
    /// Cross-process write lock.
    lock: FileLock,
    /// In-memory mirror of the last loaded or saved state.
    entries: Mutex<CatalogMap>,
    /// Clock for document generation times.
    clock: Arc<dyn Clock>,
    /// Event sink.
    events: Arc<dyn StoreEventSink>,
}

impl CatalogStore {
    /// Creates a catalog store for `root`; nothing is read until [`Self::load`].
    #[must_use]
    pub fn new(
        root: &Path,
        lock_path: &Path,
        lock_config: &LockConfig,
        clock: Arc<dyn Clock>,
        events: Arc<dyn StoreEventSink>,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            document_path: root.join(CATALOG_FILE_NAME),
            results_dir: root.join(RESULTS_DIR_NAME),
            lock: FileLock::new(lock_path, lock_config, Arc::clone(&events)),
            entries: Mutex::new(CatalogMap::new()),
            clock,
            events,
        }
    }

    /// Returns the catalog document path.
    #[must_use]
    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// Returns the write lock.
    #[must_use]
    pub const fn lock(&self) -> &FileLock {
        &self.lock
    }

    /// Returns a copy of the in-memory mirror without touching disk.
    #[must_use]
    pub fn snapshot(&self) -> CatalogMap {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Reloads the document from disk into memory and returns the entries.
    ///
    /// A missing document yields an empty catalog; an unparsable one is
    /// logged and treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the document exists but cannot be read.
    pub fn load(&self) -> Result<CatalogMap, StoreError> {
        let entries = match self.read_document()? {
            DocumentRead::Missing => CatalogMap::new(),
            DocumentRead::Parsed(entries) => entries,
            DocumentRead::Corrupt(reason) => {
                self.events.record(
                    &StoreEvent::new(StoreEventKind::CatalogCorrupt).with_error(&StoreError::CorruptCatalog(reason)),
                );
                CatalogMap::new()
            }
        };
        self.replace_mirror(&entries);
        Ok(entries)
    }

    /// Writes `entries` as the catalog document and updates the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] or [`StoreError::Io`] when the
    /// document cannot be written.
    pub fn save(&self, entries: &CatalogMap) -> Result<(), StoreError> {
        let mut ordered: Vec<CatalogEntry> = entries.values().cloned().collect();
        ordered.sort_by(newest_first);
        let document = CatalogDocument {
            format_version: CATALOG_FORMAT_VERSION,
            generated_at: self.clock.now().to_rfc3339(),
            entries: ordered,
        };
        let payload = serde_json::to_vec_pretty(&document)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        fs::create_dir_all(&self.root)
            .map_err(|err| StoreError::io(format!("create {}", self.root.display()), err))?;
        let mut temp = NamedTempFile::new_in(&self.root)
            .map_err(|err| StoreError::io("create catalog temp file", err))?;
        temp.write_all(&payload).map_err(|err| StoreError::io("write catalog temp file", err))?;
        temp.as_file().sync_all().map_err(|err| StoreError::io("sync catalog temp file", err))?;
        temp.persist(&self.document_path).map_err(|err| {
            StoreError::io(format!("replace {}", self.document_path.display()), err.error)
        })?;
        self.replace_mirror(entries);
        Ok(())
    }

    /// Runs `mutator` under the write lock against freshly loaded entries.
    ///
    /// The mutator returns a value and a changed flag; the document is saved
    /// only when the flag is set. The lock is released on every path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockTimeout`] when the lock is not acquired,
    /// any error produced by the mutator, or a load/save failure. Nothing is
    /// saved when the mutator fails.
    pub fn with_write_lock<T, F>(&self, mutator: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut CatalogMap) -> Result<(T, bool), StoreError>,
    {
        let mut guard = self.lock.acquire()?;
        let outcome = self.load_for_write().and_then(|mut entries| {
            let (value, changed) = mutator(&mut entries)?;
            if changed {
                self.save(&entries)?;
            }
            Ok(value)
        });
        if let Err(err) = guard.release() {
            self.events.record(&StoreEvent::new(StoreEventKind::LockReleaseFailed).with_error(&err));
        }
        outcome
    }

    /// Loads inside the write lock, quarantining an unparsable document first.
    fn load_for_write(&self) -> Result<CatalogMap, StoreError> {
        match self.read_document()? {
            DocumentRead::Missing => {
                self.events.record(
                    &StoreEvent::new(StoreEventKind::CatalogMissing)
                        .with_detail(self.document_path.display().to_string()),
                );
                self.replace_mirror(&CatalogMap::new());
                Ok(CatalogMap::new())
            }
            DocumentRead::Parsed(entries) => {
                self.replace_mirror(&entries);
                Ok(entries)
            }
            DocumentRead::Corrupt(reason) => {
                let quarantine = self.quarantine_corrupt_document();
                let detail = match quarantine {
                    Some(path) => format!("{reason}; preserved at {}", path.display()),
                    None => reason,
                };
                self.events.record(
                    &StoreEvent::new(StoreEventKind::CatalogCorrupt)
                        .with_error(&StoreError::CorruptCatalog(detail)),
                );
                self.replace_mirror(&CatalogMap::new());
                Ok(CatalogMap::new())
            }
        }
    }

    /// Reads and parses the document.
    fn read_document(&self) -> Result<DocumentRead, StoreError> {
        let bytes = match fs::read(&self.document_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(DocumentRead::Missing),
            Err(err) => {
                return Err(StoreError::io(
                    format!("read {}", self.document_path.display()),
                    err,
                ));
            }
        };
        let document: LenientCatalogDocument = match serde_json::from_slice(&bytes) {
            Ok(document) => document,
            Err(err) => return Ok(DocumentRead::Corrupt(err.to_string())),
        };
        let mut entries = CatalogMap::new();
        for raw in document.entries {
            match serde_json::from_value::<CatalogEntry>(raw) {
                Ok(entry) if self.owns_payload_path(&entry) => {
                    entries.insert(entry.id.clone(), entry);
                }
                Ok(entry) => self.events.record(
                    &StoreEvent::new(StoreEventKind::CatalogEntrySkipped)
                        .with_result(&entry.id)
                        .with_detail(format!(
                            "payload path {} is not {}/<id>.<ext>",
                            entry.path.display(),
                            self.results_dir.display()
                        )),
                ),
                Err(err) => self.events.record(
                    &StoreEvent::new(StoreEventKind::CatalogEntrySkipped).with_detail(err.to_string()),
                ),
            }
        }
        Ok(DocumentRead::Parsed(entries))
    }

    /// Returns true when the entry's payload is `<results_dir>/<id>.<ext>`.
    ///
    /// Entries failing this check are never read or deleted through.
    fn owns_payload_path(&self, entry: &CatalogEntry) -> bool {
        let expected_stem = format!("{}.", entry.id);
        entry.path.parent() == Some(self.results_dir.as_path())
            && entry.path.file_name() == Some(OsStr::new(&entry.file_name))
            && entry.file_name.strip_prefix(&expected_stem).is_some_and(|extension| {
                !extension.is_empty() && extension.chars().all(|ch| ch.is_ascii_alphanumeric())
            })
    }

    /// Copies an unparsable document aside before it is overwritten.
    fn quarantine_corrupt_document(&self) -> Option<PathBuf> {
        let stamp = self.clock.now().as_unix_millis();
        let target = self.root.join(format!("{CATALOG_FILE_NAME}.corrupt-{stamp}"));
        fs::copy(&self.document_path, &target).ok().map(|_| target)
    }

    /// Replaces the in-memory mirror.
    fn replace_mirror(&self, entries: &CatalogMap) {
        let mut mirror = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        mirror.clone_from(entries);
    }
}
