// crates/query-gate-store-fs/tests/locator_config.rs
// ============================================================================
// Module: Locator and Config Tests
// Description: Locator mapping properties and store config validation.
// ============================================================================
//! ## Overview
//! Checks that locators map back to the identifiers they were built from and
//! that inconsistent limits are rejected before a store is built.

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

use proptest::prelude::*;
use query_gate_core::ResultId;
use query_gate_core::Timestamp;
use query_gate_store_fs::LockConfig;
use query_gate_store_fs::LocatorError;
use query_gate_store_fs::RESULT_LOCATOR_PREFIX;
use query_gate_store_fs::ResultStoreConfig;
use query_gate_store_fs::StoreError;
use query_gate_store_fs::StoreErrorKind;
use query_gate_store_fs::from_locator;
use query_gate_store_fs::parse_reference;
use query_gate_store_fs::to_locator;

// ============================================================================
// SECTION: Locators
// ============================================================================

proptest! {
    #[test]
    fn generated_ids_map_back_from_locators(millis in 0_i64 .. 4_102_444_800_000) {
        let id = ResultId::generate(Timestamp::from_unix_millis(millis));
        let locator = to_locator(&id);
        prop_assert!(locator.starts_with(RESULT_LOCATOR_PREFIX));
        prop_assert_eq!(from_locator(&locator).unwrap(), id.clone());
        prop_assert_eq!(parse_reference(id.as_str()).unwrap(), id);
    }

    #[test]
    fn arbitrary_strings_never_panic(input in ".{0,80}") {
        let _ = from_locator(&input);
        let _ = parse_reference(&input);
    }
}

#[test]
fn foreign_prefixes_are_rejected() {
    for locator in [
        "file:///etc/passwd",
        "query-gate://other/1700000000000-0000abcd",
        "query-gate://results1700000000000-0000abcd",
    ] {
        assert!(matches!(from_locator(locator), Err(LocatorError::ForeignPrefix(_))), "{locator}");
    }
}

#[test]
fn traversal_ids_are_rejected() {
    let err = from_locator("query-gate://results/../../catalog.json").unwrap_err();
    assert!(matches!(err, LocatorError::InvalidId(_)));
    let store_err = StoreError::from(err);
    assert_eq!(store_err.kind(), StoreErrorKind::Invalid);
}

// ============================================================================
// SECTION: Config Validation
// ============================================================================

#[test]
fn defaults_validate() {
    ResultStoreConfig::new("/var/lib/query-gate").validate().unwrap();
}

#[test]
fn size_limits_must_be_ordered() {
    let mut config = ResultStoreConfig::new("/var/lib/query-gate");
    config.preview_max_bytes = config.max_resource_bytes + 1;
    assert!(config.validate().is_err());

    let mut config = ResultStoreConfig::new("/var/lib/query-gate");
    config.preview_default_bytes = 0;
    assert!(config.validate().is_err());
}

#[test]
fn ttl_and_entry_limits_must_be_positive() {
    let mut config = ResultStoreConfig::new("/var/lib/query-gate");
    config.ttl_hours = Some(0.0);
    assert!(config.validate().is_err());
    config.ttl_hours = Some(f64::NAN);
    assert!(config.validate().is_err());
    config.ttl_hours = Some(0.5);
    config.max_entries = Some(0);
    assert!(config.validate().is_err());
}

#[test]
fn lock_timing_must_be_consistent() {
    let invalid = [
        LockConfig {
            wait_timeout_ms: 0,
            ..LockConfig::default()
        },
        LockConfig {
            poll_interval_ms: 10_000,
            ..LockConfig::default()
        },
        LockConfig {
            wait_timeout_ms: 1_000,
            poll_interval_ms: 50,
            stale_after_ms: 50,
        },
        LockConfig {
            stale_after_ms: 600_001,
            ..LockConfig::default()
        },
    ];
    for lock in invalid {
        assert!(lock.validate().is_err(), "{lock:?}");
    }
    LockConfig::default().validate().unwrap();
}

#[test]
fn effective_preview_cap_is_bounded() {
    let mut config = ResultStoreConfig::new("/var/lib/query-gate");
    config.preview_default_bytes = 100;
    config.preview_max_bytes = 200;
    assert_eq!(config.effective_preview_cap(None), 100);
    assert_eq!(config.effective_preview_cap(Some(50)), 50);
    assert_eq!(config.effective_preview_cap(Some(5_000)), 200);
}
