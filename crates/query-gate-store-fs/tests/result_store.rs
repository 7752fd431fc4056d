// crates/query-gate-store-fs/tests/result_store.rs
// ============================================================================
// Module: Result Store Tests
// Description: Persist, read, list, and delete behavior of the result store.
// ============================================================================
//! ## Overview
//! Drives the store against temporary roots and checks catalog and payload
//! state after each operation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::sync::Arc;
use std::sync::Mutex;

use query_gate_core::CatalogChange;
use query_gate_core::ChangeNotifier;
use query_gate_core::DatasourceId;
use query_gate_core::LogQuerySummary;
use query_gate_core::NotifyError;
use query_gate_core::PayloadFormat;
use query_gate_core::RawPayload;
use query_gate_core::ResultId;
use query_gate_core::ResultSummary;
use query_gate_core::Timestamp;
use query_gate_core::ToolTag;
use query_gate_store_fs::DeliveryMode;
use query_gate_store_fs::ManualClock;
use query_gate_store_fs::PersistRequest;
use query_gate_store_fs::RecordingStoreEventSink;
use query_gate_store_fs::ResultStore;
use query_gate_store_fs::ResultStoreConfig;
use query_gate_store_fs::StoreDependencies;
use query_gate_store_fs::StoreErrorKind;
use query_gate_store_fs::StoreEventKind;
use query_gate_store_fs::from_locator;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

#[derive(Default)]
struct RecordingNotifier {
    changes: Mutex<Vec<CatalogChange>>,
}

impl ChangeNotifier for RecordingNotifier {
    fn notify_changed(&self, change: &CatalogChange) -> Result<(), NotifyError> {
        self.changes.lock().unwrap().push(change.clone());
        Ok(())
    }
}

struct FailingNotifier;

impl ChangeNotifier for FailingNotifier {
    fn notify_changed(&self, _change: &CatalogChange) -> Result<(), NotifyError> {
        Err(NotifyError("subscriber gone".to_string()))
    }
}

fn store_at(dir: &TempDir) -> ResultStore {
    ResultStore::new(ResultStoreConfig::new(dir.path()), StoreDependencies::default()).unwrap()
}

fn log_request(payload: RawPayload) -> PersistRequest {
    PersistRequest {
        tool: ToolTag::new("logs_search"),
        datasource_id: Some(DatasourceId::new("loki-prod")),
        inputs: json!({"query": "{app=\"api\"} |= \"error\"", "api_key": "hunter2"}),
        payload,
        summary: ResultSummary::LogQuery(LogQuerySummary {
            total_hits: Some(120),
            returned_rows: 100,
            ..LogQuerySummary::default()
        }),
    }
}

fn text_payload(len: usize) -> RawPayload {
    RawPayload::text("x".repeat(len))
}

// ============================================================================
// SECTION: Persist and Describe
// ============================================================================

#[test]
fn initialize_creates_layout_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("nested").join("store");
    let store = ResultStore::new(ResultStoreConfig::new(&root), StoreDependencies::default())
        .unwrap();
    store.initialize().unwrap();
    store.initialize().unwrap();
    assert!(root.join("results").is_dir());
    assert!(!root.join("catalog.lock").exists());
}

#[test]
fn persist_then_describe_reports_written_size() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let payload = RawPayload::json(&json!({"rows": [{"line": "boom"}]})).unwrap();
    let expected_len = payload.len() as u64;

    let persisted = store.persist(log_request(payload)).unwrap();
    let described = store.describe(&persisted.entry.id).unwrap();

    assert_eq!(described.size_bytes, expected_len);
    assert_eq!(fs::metadata(&described.path).unwrap().len(), expected_len);
    assert_eq!(described.format, PayloadFormat::Json);
    assert!(described.file_name.ends_with(".json"));
    assert_eq!(from_locator(&persisted.locator).unwrap(), persisted.entry.id);
    assert_eq!(described.delivery.mode, DeliveryMode::Locator);
    assert!(persisted.local_path.is_none());
}

#[test]
fn persist_records_sanitized_inputs_and_hash() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let persisted = store.persist(log_request(text_payload(4))).unwrap();
    let entry = store.describe(&persisted.entry.id).unwrap();
    assert_eq!(entry.inputs["api_key"], json!("[redacted]"));
    assert!(entry.input_hash.is_some());
    let document = fs::read_to_string(dir.path().join("catalog.json")).unwrap();
    assert!(!document.contains("hunter2"));
}

#[test]
fn persist_uses_injected_clock_for_creation_time() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(Timestamp::from_unix_millis(1_700_000_000_000)));
    let store = ResultStore::new(
        ResultStoreConfig::new(dir.path()),
        StoreDependencies::default().with_clock(clock),
    )
    .unwrap();
    let persisted = store.persist(log_request(text_payload(1))).unwrap();
    assert_eq!(persisted.entry.created_at.as_unix_millis(), 1_700_000_000_000);
    assert!(persisted.entry.id.as_str().starts_with("1700000000000-"));
}

#[test]
fn persist_rejects_oversized_payload_without_writing() {
    let dir = TempDir::new().unwrap();
    let mut config = ResultStoreConfig::new(dir.path());
    config.max_payload_bytes = 8;
    let store = ResultStore::new(config, StoreDependencies::default()).unwrap();
    let err = store.persist(log_request(text_payload(9))).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::SizeExceeded);
    assert_eq!(fs::read_dir(dir.path().join("results")).unwrap().count(), 0);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn persist_exposes_local_path_when_enabled() {
    let dir = TempDir::new().unwrap();
    let mut config = ResultStoreConfig::new(dir.path());
    config.expose_local_paths = true;
    let store = ResultStore::new(config, StoreDependencies::default()).unwrap();
    let persisted = store.persist(log_request(text_payload(3))).unwrap();
    let local = persisted.local_path.unwrap();
    assert_eq!(fs::read(&local).unwrap(), b"xxx");
    assert_eq!(persisted.entry.delivery.mode, DeliveryMode::LocalPath);
}

#[test]
fn describe_unknown_id_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let err = store.describe(&ResultId::parse("1700000000000-deadbeef").unwrap()).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
    assert!(!err.is_retryable());
}

#[test]
fn describe_sees_writes_from_another_instance() {
    let dir = TempDir::new().unwrap();
    let writer = store_at(&dir);
    let reader = store_at(&dir);
    reader.initialize().unwrap();
    let persisted = writer.persist(log_request(text_payload(2))).unwrap();
    assert_eq!(reader.describe(&persisted.entry.id).unwrap().id, persisted.entry.id);
}

// ============================================================================
// SECTION: Fetch and Read
// ============================================================================

#[test]
fn fetch_below_size_truncates_within_cap() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let persisted = store.persist(log_request(text_payload(1000))).unwrap();

    let fetched = store.fetch(&persisted.entry.id, Some(100)).unwrap();
    assert!(fetched.truncated);
    assert_eq!(fetched.effective_cap, 100);
    assert_eq!(fetched.bytes.len(), 100);
    assert_eq!(fetched.total_bytes, 1000);
}

#[test]
fn fetch_at_or_above_size_returns_exact_content() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let persisted = store.persist(log_request(RawPayload::text("exact body"))).unwrap();

    for cap in [10, 11, 4096] {
        let fetched = store.fetch(&persisted.entry.id, Some(cap)).unwrap();
        assert!(!fetched.truncated);
        assert_eq!(fetched.text(), "exact body");
    }
}

#[test]
fn fetch_is_bounded_by_preview_ceiling() {
    let dir = TempDir::new().unwrap();
    let mut config = ResultStoreConfig::new(dir.path());
    config.preview_default_bytes = 16;
    config.preview_max_bytes = 32;
    let store = ResultStore::new(config, StoreDependencies::default()).unwrap();
    let persisted = store.persist(log_request(text_payload(100))).unwrap();

    let default_cap = store.fetch(&persisted.entry.id, None).unwrap();
    assert_eq!(default_cap.bytes.len(), 16);
    let ceiling = store.fetch(&persisted.entry.id, Some(10_000)).unwrap();
    assert_eq!(ceiling.effective_cap, 32);
    assert_eq!(ceiling.bytes.len(), 32);
    assert!(ceiling.truncated);
}

#[test]
fn fetch_with_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let persisted = store.persist(log_request(text_payload(5))).unwrap();
    fs::remove_file(&persisted.entry.path).unwrap();
    let err = store.fetch(&persisted.entry.id, None).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn read_full_enforces_resource_limit() {
    let dir = TempDir::new().unwrap();
    let mut config = ResultStoreConfig::new(dir.path());
    config.preview_default_bytes = 8;
    config.preview_max_bytes = 16;
    config.max_resource_bytes = 64;
    let store = ResultStore::new(config, StoreDependencies::default()).unwrap();

    let small = store.persist(log_request(text_payload(64))).unwrap();
    assert_eq!(store.read_full(&small.entry.id).unwrap().bytes.len(), 64);

    let large = store.persist(log_request(text_payload(65))).unwrap();
    let err = store.read_full(&large.entry.id).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::SizeExceeded);
    // Capped reads still work on the oversized result.
    assert_eq!(store.fetch(&large.entry.id, None).unwrap().bytes.len(), 8);
}

// ============================================================================
// SECTION: List and Delete
// ============================================================================

#[test]
fn list_is_newest_first() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(Timestamp::from_unix_millis(1_000)));
    let store = ResultStore::new(
        ResultStoreConfig::new(dir.path()),
        StoreDependencies::default().with_clock(Arc::clone(&clock) as _),
    )
    .unwrap();
    let mut ids = Vec::new();
    for _ in 0 .. 3 {
        ids.push(store.persist(log_request(text_payload(1))).unwrap().entry.id);
        clock.advance_millis(10);
    }
    let listed: Vec<ResultId> = store.list().unwrap().into_iter().map(|row| row.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[test]
fn delete_with_file_removes_both() {
    let dir = TempDir::new().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let store = ResultStore::new(
        ResultStoreConfig::new(dir.path()),
        StoreDependencies::default().with_notifier(Arc::clone(&notifier) as _),
    )
    .unwrap();
    let persisted = store.persist(log_request(text_payload(4))).unwrap();

    let outcome = store.delete(&persisted.entry.id, true).unwrap();
    assert!(outcome.file_deleted);
    assert!(!persisted.entry.path.exists());
    assert!(store.list().unwrap().is_empty());

    let changes = notifier.changes.lock().unwrap().clone();
    assert_eq!(changes, vec![
        CatalogChange::Persisted {
            id: persisted.entry.id.clone(),
        },
        CatalogChange::Deleted {
            id: persisted.entry.id.clone(),
        },
    ]);
}

#[test]
fn delete_without_file_keeps_payload() {
    let dir = TempDir::new().unwrap();
    let store = store_at(&dir);
    let persisted = store.persist(log_request(text_payload(4))).unwrap();
    let outcome = store.delete(&persisted.entry.id, false).unwrap();
    assert!(!outcome.file_deleted);
    assert!(persisted.entry.path.exists());
    let err = store.delete(&persisted.entry.id, true).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn notifier_failures_are_logged_not_returned() {
    let dir = TempDir::new().unwrap();
    let events = Arc::new(RecordingStoreEventSink::new());
    let store = ResultStore::new(
        ResultStoreConfig::new(dir.path()),
        StoreDependencies::default()
            .with_notifier(Arc::new(FailingNotifier))
            .with_events(Arc::clone(&events) as _),
    )
    .unwrap();
    store.persist(log_request(text_payload(1))).unwrap();
    assert_eq!(events.count(StoreEventKind::NotifyFailed), 1);
    assert_eq!(events.count(StoreEventKind::ResultPersisted), 1);
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let dir = TempDir::new().unwrap();
    let mut config = ResultStoreConfig::new(dir.path());
    config.preview_default_bytes = config.preview_max_bytes + 1;
    let err = ResultStore::new(config, StoreDependencies::default()).err().unwrap();
    assert_eq!(err.kind(), StoreErrorKind::Invalid);
}
