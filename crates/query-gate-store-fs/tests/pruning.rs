// crates/query-gate-store-fs/tests/pruning.rs
// ============================================================================
// Module: Pruning Tests
// Description: Sweep reconciliation, TTL, entry limits, and explicit trims.
// ============================================================================
//! ## Overview
//! Drives sweep and trim against a manual clock so age decisions are exact,
//! then checks that catalog entries and payload files agree.

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

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use query_gate_core::RawPayload;
use query_gate_core::ResultId;
use query_gate_core::ResultSummary;
use query_gate_core::Timestamp;
use query_gate_core::ToolTag;
use query_gate_store_fs::CatalogEntry;
use query_gate_store_fs::LockConfig;
use query_gate_store_fs::ManualClock;
use query_gate_store_fs::PersistRequest;
use query_gate_store_fs::ResultStore;
use query_gate_store_fs::ResultStoreConfig;
use query_gate_store_fs::StoreDependencies;
use query_gate_store_fs::StoreErrorKind;
use query_gate_store_fs::TrimRequest;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const START_MS: i64 = 1_700_000_000_000;

fn store_with_clock(config: ResultStoreConfig) -> (ResultStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_unix_millis(START_MS)));
    let store = ResultStore::new(
        config,
        StoreDependencies::default().with_clock(Arc::clone(&clock) as _),
    )
    .unwrap();
    (store, clock)
}

fn persist_one(store: &ResultStore, label: &str) -> CatalogEntry {
    store
        .persist(PersistRequest {
            tool: ToolTag::new("logs_search"),
            datasource_id: None,
            inputs: json!({"label": label}),
            payload: RawPayload::text(label),
            summary: ResultSummary::default(),
        })
        .unwrap()
        .entry
}

fn catalog_ids(store: &ResultStore) -> BTreeSet<ResultId> {
    store.list().unwrap().into_iter().map(|row| row.id).collect()
}

fn document_entry_count(root: &Path) -> usize {
    let document: serde_json::Value =
        serde_json::from_slice(&fs::read(root.join("catalog.json")).unwrap()).unwrap();
    document["entries"].as_array().unwrap().len()
}

fn ids_with_files(root: &Path) -> BTreeSet<ResultId> {
    fs::read_dir(root.join("results"))
        .unwrap()
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let stem = name.split('.').next()?.to_string();
            ResultId::parse(&stem).ok()
        })
        .collect()
}

// ============================================================================
// SECTION: Trim
// ============================================================================

#[test]
fn trim_by_age_keeps_only_newer_entries() {
    let dir = TempDir::new().unwrap();
    let (store, clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    let first = persist_one(&store, "t1");
    clock.advance_hours(1);
    let second = persist_one(&store, "t2");
    clock.advance_hours(2);
    let third = persist_one(&store, "t3");
    clock.advance_hours(1);

    // Ages are now 4h, 3h, and 1h; the cutoff falls between t2 and t3.
    let report = store
        .trim(TrimRequest {
            max_age_hours: Some(2.0),
            max_count: None,
        })
        .unwrap();

    assert_eq!(report.removed, vec![second.id.clone(), first.id.clone()]);
    assert_eq!(report.remaining, 1);
    assert_eq!(report.files_deleted, 2);
    assert!(third.path.exists());
    assert!(!first.path.exists());
    assert!(!second.path.exists());
    assert_eq!(document_entry_count(dir.path()), 1);
    assert_eq!(catalog_ids(&store), BTreeSet::from([third.id]));
}

#[test]
fn trim_by_count_keeps_newest() {
    let dir = TempDir::new().unwrap();
    let (store, clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    let mut entries = Vec::new();
    for index in 0 .. 5 {
        entries.push(persist_one(&store, &format!("r{index}")));
        clock.advance_millis(1_000);
    }

    let report = store
        .trim(TrimRequest {
            max_age_hours: None,
            max_count: Some(2),
        })
        .unwrap();

    assert_eq!(report.removed.len(), 3);
    assert_eq!(report.remaining, 2);
    assert_eq!(report.files_deleted, 3);
    let kept: BTreeSet<ResultId> = entries[3 ..].iter().map(|entry| entry.id.clone()).collect();
    assert_eq!(catalog_ids(&store), kept);
    for entry in &entries[.. 3] {
        assert!(!entry.path.exists());
    }
    for entry in &entries[3 ..] {
        assert!(entry.path.exists());
    }
}

#[test]
fn trim_applies_age_then_count() {
    let dir = TempDir::new().unwrap();
    let (store, clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    let old = persist_one(&store, "old");
    clock.advance_hours(10);
    let a = persist_one(&store, "a");
    clock.advance_millis(1);
    let b = persist_one(&store, "b");
    clock.advance_millis(1);
    let c = persist_one(&store, "c");

    let report = store
        .trim(TrimRequest {
            max_age_hours: Some(5.0),
            max_count: Some(2),
        })
        .unwrap();
    let removed: BTreeSet<ResultId> = report.removed.into_iter().collect();
    assert_eq!(removed, BTreeSet::from([old.id, a.id]));
    assert_eq!(catalog_ids(&store), BTreeSet::from([b.id, c.id]));
}

#[test]
fn trim_without_limits_is_invalid() {
    let dir = TempDir::new().unwrap();
    let (store, _clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    let err = store.trim(TrimRequest::default()).unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::Invalid);
}

#[test]
fn trim_with_nothing_to_remove_leaves_document_untouched() {
    let dir = TempDir::new().unwrap();
    let (store, _clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    persist_one(&store, "only");
    let before = fs::read(dir.path().join("catalog.json")).unwrap();
    let report = store
        .trim(TrimRequest {
            max_age_hours: Some(1.0),
            max_count: Some(10),
        })
        .unwrap();
    assert!(report.removed.is_empty());
    assert_eq!(fs::read(dir.path().join("catalog.json")).unwrap(), before);
}

// ============================================================================
// SECTION: Sweep
// ============================================================================

#[test]
fn sweep_drops_entries_with_missing_files_and_refreshes_sizes() {
    let dir = TempDir::new().unwrap();
    let (store, _clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    let gone = persist_one(&store, "gone");
    let grown = persist_one(&store, "grown");
    let intact = persist_one(&store, "intact");
    fs::remove_file(&gone.path).unwrap();
    fs::write(&grown.path, b"grown and then some").unwrap();

    let report = store.sweep().unwrap();
    assert_eq!(report.missing_removed, 1);
    assert_eq!(report.sizes_refreshed, 1);
    assert_eq!(report.files_deleted, 0);
    assert_eq!(store.describe(&grown.id).unwrap().size_bytes, 19);
    assert_eq!(catalog_ids(&store), BTreeSet::from([grown.id, intact.id]));
    assert_eq!(catalog_ids(&store), ids_with_files(dir.path()));
}

#[test]
fn sweep_applies_ttl_when_configured() {
    let dir = TempDir::new().unwrap();
    let mut config = ResultStoreConfig::new(dir.path());
    config.ttl_hours = Some(24.0);
    let (store, clock) = store_with_clock(config);
    let stale = persist_one(&store, "stale");
    clock.advance_hours(20);
    let fresh = persist_one(&store, "fresh");
    clock.advance_hours(5);

    let report = store.sweep().unwrap();
    assert_eq!(report.expired_removed, 1);
    assert_eq!(report.files_deleted, 1);
    assert!(!stale.path.exists());
    assert_eq!(catalog_ids(&store), BTreeSet::from([fresh.id]));
    assert_eq!(catalog_ids(&store), ids_with_files(dir.path()));
}

#[test]
fn sweep_without_ttl_keeps_old_entries() {
    let dir = TempDir::new().unwrap();
    let (store, clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    let ancient = persist_one(&store, "ancient");
    clock.advance_hours(24 * 365);
    let report = store.sweep().unwrap();
    assert_eq!(report.entries_removed(), 0);
    assert!(ancient.path.exists());
}

#[test]
fn sweep_enforces_max_entries() {
    let dir = TempDir::new().unwrap();
    let mut config = ResultStoreConfig::new(dir.path());
    config.max_entries = Some(2);
    let (store, clock) = store_with_clock(config);
    let mut entries = Vec::new();
    for index in 0 .. 4 {
        entries.push(persist_one(&store, &format!("e{index}")));
        clock.advance_millis(10);
    }
    let report = store.sweep().unwrap();
    assert_eq!(report.over_limit_removed, 2);
    let kept: BTreeSet<ResultId> = entries[2 ..].iter().map(|entry| entry.id.clone()).collect();
    assert_eq!(catalog_ids(&store), kept);
    assert_eq!(catalog_ids(&store), ids_with_files(dir.path()));
}

#[test]
fn sweep_leaves_untracked_files_unless_enabled() {
    let dir = TempDir::new().unwrap();
    let (store, _clock) = store_with_clock(ResultStoreConfig::new(dir.path()));
    store.initialize().unwrap();
    let orphan = dir.path().join("results").join("1700000000000-0badf00d.json");
    fs::write(&orphan, b"{}").unwrap();
    let report = store.sweep().unwrap();
    assert_eq!(report.orphans_deleted, 0);
    assert!(orphan.exists());
}

#[test]
fn sweep_reconciles_orphan_from_crashed_writer() {
    let dir = TempDir::new().unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_lock_crash_holder"))
        .arg(dir.path())
        .arg("--with-orphan")
        .status()
        .unwrap();
    assert!(!status.success());
    let unrelated = dir.path().join("results").join("operator_notes.md");
    fs::write(&unrelated, b"operator notes").unwrap();

    let mut config = ResultStoreConfig::new(dir.path());
    config.orphan_grace_secs = Some(0);
    config.lock = LockConfig {
        wait_timeout_ms: 5_000,
        poll_interval_ms: 10,
        stale_after_ms: 200,
    };
    let (store, _clock) = store_with_clock(config);
    let tracked = persist_one(&store, "tracked");

    let report = store.sweep().unwrap();
    assert_eq!(report.orphans_deleted, 1);
    assert!(tracked.path.exists());
    assert!(unrelated.exists());
    assert_eq!(catalog_ids(&store), ids_with_files(dir.path()));
}
