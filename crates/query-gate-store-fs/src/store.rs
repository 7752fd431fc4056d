// crates/query-gate-store-fs/src/store.rs
// ============================================================================
// Module: Filesystem Result Store
// Description: Persist, describe, fetch, list, and delete stored results.
// Purpose: Provide the result lifecycle over a shared storage root.
// Dependencies: query-gate-core, serde
// ============================================================================

//! ## Overview
//! [`ResultStore`] owns one storage root:
//!
//! ```text
//! <root>/catalog.json      catalog document
//! <root>/catalog.lock      write lock marker (present only while held)
//! <root>/results/<id>.<ext> payload files, written once
//! ```
//!
//! ## Layer Responsibilities
//! - Writes (persist, delete, sweep, trim) mutate the catalog only through
//!   [`CatalogStore::with_write_lock`].
//! - Reads (describe, fetch, read, list) reload the document and read without
//!   the lock; payload files are immutable so concurrent readers need no
//!   coordination.
//! - A failed payload write aborts before the catalog is touched.
//!
//! Security posture: identifiers and byte budgets come from untrusted callers;
//! see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use query_gate_core::CatalogChange;
use query_gate_core::ChangeNotifier;
use query_gate_core::Clock;
use query_gate_core::DatasourceId;
use query_gate_core::NoopChangeNotifier;
use query_gate_core::PayloadFormat;
use query_gate_core::RawPayload;
use query_gate_core::ResultId;
use query_gate_core::ResultSummary;
use query_gate_core::Timestamp;
use query_gate_core::ToolTag;
use query_gate_core::input_digest;
use query_gate_core::sanitize_inputs;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::CatalogEntry;
use crate::catalog::CatalogStore;
use crate::catalog::DeliveryMode;
use crate::catalog::DeliveryRecord;
use crate::catalog::newest_first;
use crate::clock::SystemClock;
use crate::config::ResultStoreConfig;
use crate::error::StoreError;
use crate::events::NoopStoreEventSink;
use crate::events::StoreEvent;
use crate::events::StoreEventKind;
use crate::events::StoreEventSink;
use crate::locator::to_locator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attempts at finding an unused identifier before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Collaborators injected into a store.
#[derive(Clone)]
pub struct StoreDependencies {
    /// Source of creation and eviction instants.
    pub clock: Arc<dyn Clock>,
    /// Advisory listener for catalog changes.
    pub notifier: Arc<dyn ChangeNotifier>,
    /// Operational event sink.
    pub events: Arc<dyn StoreEventSink>,
}

impl Default for StoreDependencies {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            notifier: Arc::new(NoopChangeNotifier),
            events: Arc::new(NoopStoreEventSink),
        }
    }
}

impl StoreDependencies {
    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the change notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn StoreEventSink>) -> Self {
        self.events = events;
        self
    }
}

/// Request to persist one query result.
#[derive(Debug, Clone)]
pub struct PersistRequest {
    /// Producing tool tag.
    pub tool: ToolTag,
    /// Backend datasource, when known.
    pub datasource_id: Option<DatasourceId>,
    /// Raw query arguments (sanitized before recording).
    pub inputs: Value,
    /// Serialized result.
    pub payload: RawPayload,
    /// Producer summary.
    pub summary: ResultSummary,
}

/// Outcome of a successful persist.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedResult {
    /// Recorded catalog entry.
    pub entry: CatalogEntry,
    /// External handle for the result.
    pub locator: String,
    /// Absolute payload path, only when local paths are exposed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// Capped read of a stored payload.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Catalog entry of the result.
    pub entry: CatalogEntry,
    /// Bytes read, at most `effective_cap`.
    pub bytes: Vec<u8>,
    /// True when the payload is longer than the bytes returned.
    pub truncated: bool,
    /// Payload size at read time.
    pub total_bytes: u64,
    /// Cap applied after bounding the request by the server ceiling.
    pub effective_cap: u64,
}

impl FetchedContent {
    /// Renders the bytes as text.
    ///
    /// A multi-byte character split by the cap is dropped rather than
    /// replaced; other invalid UTF-8 is replaced lossily.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        utf8_prefix(&self.bytes)
    }
}

/// Uncapped read of a stored payload.
#[derive(Debug, Clone)]
pub struct FullContent {
    /// Catalog entry of the result.
    pub entry: CatalogEntry,
    /// Complete payload bytes.
    pub bytes: Vec<u8>,
}

/// Listing row for one stored result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultListing {
    /// Result identifier.
    pub id: ResultId,
    /// Producing tool tag.
    pub tool: ToolTag,
    /// Backend datasource, when known.
    pub datasource_id: Option<DatasourceId>,
    /// Payload format.
    pub format: PayloadFormat,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Creation time.
    pub created_at: Timestamp,
    /// External handle.
    pub locator: String,
    /// Producer summary.
    pub summary: ResultSummary,
}

impl From<&CatalogEntry> for ResultListing {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            tool: entry.tool.clone(),
            datasource_id: entry.datasource_id.clone(),
            format: entry.format,
            size_bytes: entry.size_bytes,
            created_at: entry.created_at,
            locator: to_locator(&entry.id),
            summary: entry.summary.clone(),
        }
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    /// Entry removed from the catalog.
    pub entry: CatalogEntry,
    /// True when the payload file was deleted.
    pub file_deleted: bool,
}

/// Result of removing a payload file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileRemoval {
    /// File deleted.
    Deleted,
    /// File was already gone.
    Missing,
    /// Deletion failed; logged.
    Failed,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Result store over one storage root.
pub struct ResultStore {
    /// Store configuration.
    pub(crate) config: ResultStoreConfig,
    /// Catalog mirror and write lock.
    pub(crate) catalog: CatalogStore,
    /// Injected collaborators.
    pub(crate) deps: StoreDependencies,
    /// Whether the storage root has been initialized by this instance.
    initialized: AtomicBool,
}

impl ResultStore {
    /// Creates a store from an explicit configuration and collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the configuration is inconsistent.
    pub fn new(config: ResultStoreConfig, deps: StoreDependencies) -> Result<Self, StoreError> {
        config.validate()?;
        let catalog = CatalogStore::new(
            &config.root,
            &config.lock_path(),
            &config.lock,
            Arc::clone(&deps.clock),
            Arc::clone(&deps.events),
        );
        Ok(Self {
            config,
            catalog,
            deps,
            initialized: AtomicBool::new(false),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &ResultStoreConfig {
        &self.config
    }

    /// Returns the catalog store.
    #[must_use]
    pub const fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    /// Ensures the storage directories exist and loads the catalog once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when directories cannot be created or the
    /// catalog cannot be read.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let results_dir = self.config.results_dir();
        fs::create_dir_all(&results_dir)
            .map_err(|err| StoreError::io(format!("create {}", results_dir.display()), err))?;
        if !self.initialized.load(Ordering::Acquire) {
            self.catalog.load()?;
            self.initialized.store(true, Ordering::Release);
        }
        Ok(())
    }

    /// Persists a payload and records its catalog entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SizeExceeded`] for oversized payloads,
    /// [`StoreError::Io`] when the payload cannot be written (no entry is
    /// recorded), and [`StoreError::LockTimeout`] when the catalog lock is
    /// unavailable (the written file is left for orphan reconciliation).
    pub fn persist(&self, request: PersistRequest) -> Result<PersistedResult, StoreError> {
        self.initialize()?;
        let payload_len = u64::try_from(request.payload.len()).unwrap_or(u64::MAX);
        if payload_len > self.config.max_payload_bytes {
            return Err(StoreError::SizeExceeded {
                subject: "payload".to_string(),
                actual_bytes: payload_len,
                max_bytes: self.config.max_payload_bytes,
            });
        }
        let inputs = sanitize_inputs(&request.inputs);
        let input_hash =
            input_digest(&inputs).map_err(|err| StoreError::Serialization(err.to_string()))?;

        let created_at = self.deps.clock.now();
        let (id, path) = self.write_payload_file(created_at, &request.payload)?;
        let size_bytes = fs::metadata(&path)
            .map_err(|err| StoreError::io(format!("stat {}", path.display()), err))?
            .len();
        let locator = to_locator(&id);
        let mode = if self.config.expose_local_paths {
            DeliveryMode::LocalPath
        } else {
            DeliveryMode::Locator
        };
        let file_name = path
            .file_name()
            .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
        let entry = CatalogEntry {
            id: id.clone(),
            tool: request.tool,
            datasource_id: request.datasource_id,
            format: request.payload.format,
            path: path.clone(),
            file_name,
            size_bytes,
            created_at,
            inputs,
            input_hash: Some(input_hash),
            summary: request.summary.compact(),
            delivery: DeliveryRecord {
                locator: locator.clone(),
                mode,
            },
        };

        let recorded = entry.clone();
        let inserted = self.catalog.with_write_lock(move |entries| {
            if entries.contains_key(&recorded.id) {
                return Err(StoreError::Invalid(format!(
                    "result id {} already present in catalog",
                    recorded.id
                )));
            }
            entries.insert(recorded.id.clone(), recorded);
            Ok(((), true))
        });
        if let Err(err) = inserted {
            self.record(
                StoreEvent::new(StoreEventKind::PersistOrphaned)
                    .with_result(&id)
                    .with_error(&err),
            );
            return Err(err);
        }

        self.record(
            StoreEvent::new(StoreEventKind::ResultPersisted)
                .with_result(&id)
                .with_detail(format!("{} bytes from {}", size_bytes, entry.tool)),
        );
        self.notify(&CatalogChange::Persisted {
            id,
        });
        let local_path = self.config.expose_local_paths.then_some(path);
        Ok(PersistedResult {
            entry,
            locator,
            local_path,
        })
    }

    /// Returns the catalog entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is absent after a reload.
    pub fn describe(&self, id: &ResultId) -> Result<CatalogEntry, StoreError> {
        self.initialize()?;
        self.catalog.load()?.remove(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Reads up to `max_bytes` of a payload, bounded by the preview ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id or its file is absent and
    /// [`StoreError::Io`] on read failure.
    pub fn fetch(
        &self,
        id: &ResultId,
        max_bytes: Option<u64>,
    ) -> Result<FetchedContent, StoreError> {
        let entry = self.describe(id)?;
        let effective_cap = self.config.effective_preview_cap(max_bytes);
        let file = open_payload(&entry)?;
        let total_bytes = file
            .metadata()
            .map_err(|err| StoreError::io(format!("stat {}", entry.path.display()), err))?
            .len();
        let mut bytes = Vec::with_capacity(capacity_hint(effective_cap.min(total_bytes)));
        file.take(effective_cap)
            .read_to_end(&mut bytes)
            .map_err(|err| StoreError::io(format!("read {}", entry.path.display()), err))?;
        let returned = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        Ok(FetchedContent {
            truncated: returned < total_bytes,
            entry,
            bytes,
            total_bytes,
            effective_cap,
        })
    }

    /// Reads a whole payload when it fits the maximum resource size.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SizeExceeded`] when the file is larger than
    /// `max_resource_bytes`, [`StoreError::NotFound`] when the id or its file
    /// is absent, and [`StoreError::Io`] on read failure.
    pub fn read_full(&self, id: &ResultId) -> Result<FullContent, StoreError> {
        let entry = self.describe(id)?;
        let mut file = open_payload(&entry)?;
        let size = file
            .metadata()
            .map_err(|err| StoreError::io(format!("stat {}", entry.path.display()), err))?
            .len();
        if size > self.config.max_resource_bytes {
            return Err(StoreError::SizeExceeded {
                subject: format!("result {id}"),
                actual_bytes: size,
                max_bytes: self.config.max_resource_bytes,
            });
        }
        let mut bytes = Vec::with_capacity(capacity_hint(size));
        file.read_to_end(&mut bytes)
            .map_err(|err| StoreError::io(format!("read {}", entry.path.display()), err))?;
        Ok(FullContent {
            entry,
            bytes,
        })
    }

    /// Lists present results, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the catalog cannot be read.
    pub fn list(&self) -> Result<Vec<ResultListing>, StoreError> {
        self.initialize()?;
        let mut entries: Vec<CatalogEntry> = self.catalog.load()?.into_values().collect();
        entries.sort_by(newest_first);
        Ok(entries.iter().map(ResultListing::from).collect())
    }

    /// Removes a result from the catalog, optionally deleting its file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the id is absent and
    /// [`StoreError::LockTimeout`] when the catalog lock is unavailable.
    /// File deletion failures are logged, not returned.
    pub fn delete(&self, id: &ResultId, delete_file: bool) -> Result<DeleteOutcome, StoreError> {
        self.initialize()?;
        let removed = self.catalog.with_write_lock(|entries| {
            let removed = entries.remove(id);
            let changed = removed.is_some();
            Ok((removed, changed))
        })?;
        let entry = removed.ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let file_deleted =
            delete_file && self.remove_payload_file(&entry.id, &entry.path) == FileRemoval::Deleted;
        self.record(
            StoreEvent::new(StoreEventKind::ResultDeleted)
                .with_result(&entry.id)
                .with_detail(format!("file_deleted={file_deleted}")),
        );
        self.notify(&CatalogChange::Deleted {
            id: entry.id.clone(),
        });
        Ok(DeleteOutcome {
            entry,
            file_deleted,
        })
    }

    /// Writes the payload to a fresh file, retrying on id collisions.
    fn write_payload_file(
        &self,
        created_at: Timestamp,
        payload: &RawPayload,
    ) -> Result<(ResultId, PathBuf), StoreError> {
        let results_dir = self.config.results_dir();
        for _ in 0 .. MAX_ID_ATTEMPTS {
            let id = ResultId::generate(created_at);
            let path = results_dir.join(format!("{id}.{}", payload.format.extension()));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(StoreError::io(format!("create {}", path.display()), err));
                }
            };
            let written = file.write_all(&payload.bytes).and_then(|()| file.sync_all());
            if let Err(err) = written {
                drop(file);
                let _ = fs::remove_file(&path);
                return Err(StoreError::io(format!("write {}", path.display()), err));
            }
            return Ok((id, path));
        }
        Err(StoreError::Invalid(format!(
            "no unused result id after {MAX_ID_ATTEMPTS} attempts"
        )))
    }

    /// Deletes a payload file, logging failures.
    pub(crate) fn remove_payload_file(&self, id: &ResultId, path: &Path) -> FileRemoval {
        match fs::remove_file(path) {
            Ok(()) => FileRemoval::Deleted,
            Err(err) if err.kind() == ErrorKind::NotFound => FileRemoval::Missing,
            Err(err) => {
                let error = StoreError::io(format!("delete {}", path.display()), err);
                self.record(
                    StoreEvent::new(StoreEventKind::FileDeleteFailed)
                        .with_result(id)
                        .with_error(&error),
                );
                FileRemoval::Failed
            }
        }
    }

    /// Sends a best-effort change notification.
    pub(crate) fn notify(&self, change: &CatalogChange) {
        if let Err(err) = self.deps.notifier.notify_changed(change) {
            self.record(StoreEvent::new(StoreEventKind::NotifyFailed).with_detail(err.to_string()));
        }
    }

    /// Records an operational event.
    pub(crate) fn record(&self, event: StoreEvent) {
        self.deps.events.record(&event);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Opens a payload file, mapping a missing file to `NotFound`.
fn open_payload(entry: &CatalogEntry) -> Result<File, StoreError> {
    File::open(&entry.path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            StoreError::NotFound(entry.id.clone())
        } else {
            StoreError::io(format!("open {}", entry.path.display()), err)
        }
    })
}

/// Converts a byte count to a bounded allocation hint.
fn capacity_hint(bytes: u64) -> usize {
    usize::try_from(bytes).unwrap_or(usize::MAX).min(1024 * 1024)
}

/// Decodes UTF-8, dropping a character split at the end of the buffer.
fn utf8_prefix(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(err) if err.error_len().is_none() => {
            let valid = &bytes[.. err.valid_up_to()];
            std::str::from_utf8(valid).map_or_else(|_| String::from_utf8_lossy(valid), Cow::Borrowed)
        }
        Err(_) => String::from_utf8_lossy(bytes),
    }
}

#[cfg(test)]
mod tests;
