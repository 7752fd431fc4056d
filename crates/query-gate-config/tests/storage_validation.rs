//! Storage and logging validation tests for query-gate-config.
// crates/query-gate-config/tests/storage_validation.rs
// =============================================================================
// Module: Storage Validation Tests
// Description: Validate storage limits, lock timing, and logging sinks.
// Purpose: Ensure inconsistent settings fail closed with the field named.
// =============================================================================

#![allow(
    clippy::use_debug,
    reason = "Test failure messages include debug renderings."
)]

use query_gate_config::LogSinkKind;
use query_gate_config::QueryGateConfig;

type TestResult = Result<(), String>;

fn assert_rejects(toml: &str, needle: &str) -> TestResult {
    match QueryGateConfig::from_toml_str(toml) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected rejection containing {needle}")),
    }
}

#[test]
fn minimal_config_uses_defaults() -> TestResult {
    let config = QueryGateConfig::from_toml_str("[storage]\nroot = \"/tmp/qg\"\n")
        .map_err(|err| err.to_string())?;
    let store = config.storage.to_store_config();
    if store.preview_default_bytes != 64 * 1024
        || store.preview_max_bytes != 256 * 1024
        || store.max_resource_bytes != 8 * 1024 * 1024
        || store.lock.wait_timeout_ms != 10_000
        || store.lock.poll_interval_ms != 50
        || store.lock.stale_after_ms != 30_000
        || store.ttl_hours.is_some()
        || !store.sweep_on_startup
    {
        return Err(format!("unexpected defaults: {store:?}"));
    }
    if config.logging.sink != LogSinkKind::Stderr {
        return Err("logging must default to stderr".to_string());
    }
    Ok(())
}

#[test]
fn storage_section_is_required() -> TestResult {
    assert_rejects("[logging]\nsink = \"none\"\n", "storage")
}

#[test]
fn empty_root_is_rejected() -> TestResult {
    assert_rejects("[storage]\nroot = \"  \"\n", "storage.root")
}

#[test]
fn preview_default_above_ceiling_is_rejected() -> TestResult {
    assert_rejects(
        "[storage]\nroot = \"/tmp/qg\"\npreview_default_bytes = 300000\npreview_max_bytes = 200000\n",
        "storage.preview_default_bytes",
    )
}

#[test]
fn preview_ceiling_above_resource_limit_is_rejected() -> TestResult {
    assert_rejects(
        "[storage]\nroot = \"/tmp/qg\"\npreview_max_bytes = 2000\nmax_resource_bytes = 1000\npreview_default_bytes = 100\n",
        "storage.preview_max_bytes",
    )
}

#[test]
fn zero_byte_limit_is_rejected() -> TestResult {
    assert_rejects("[storage]\nroot = \"/tmp/qg\"\nmax_payload_bytes = 0\n", "storage.max_payload_bytes")
}

#[test]
fn non_positive_ttl_is_rejected() -> TestResult {
    assert_rejects("[storage]\nroot = \"/tmp/qg\"\nttl_hours = 0.0\n", "storage.ttl_hours")?;
    assert_rejects("[storage]\nroot = \"/tmp/qg\"\nttl_hours = -2.5\n", "storage.ttl_hours")
}

#[test]
fn poll_interval_must_be_below_wait_timeout() -> TestResult {
    assert_rejects(
        "[storage]\nroot = \"/tmp/qg\"\n[storage.lock]\nwait_timeout_ms = 100\npoll_interval_ms = 100\n",
        "storage.lock.poll_interval_ms",
    )
}

#[test]
fn stale_threshold_must_exceed_poll_interval() -> TestResult {
    assert_rejects(
        "[storage]\nroot = \"/tmp/qg\"\n[storage.lock]\npoll_interval_ms = 500\nstale_after_ms = 400\n",
        "storage.lock.poll_interval_ms",
    )
}

#[test]
fn lock_timing_must_stay_within_ten_minutes() -> TestResult {
    assert_rejects(
        "[storage]\nroot = \"/tmp/qg\"\n[storage.lock]\nwait_timeout_ms = 600001\n",
        "storage.lock.wait_timeout_ms",
    )
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_rejects("[storage]\nroot = \"/tmp/qg\"\n[logging]\nsink = \"file\"\n", "logging.path")
}

#[test]
fn path_without_file_sink_is_rejected() -> TestResult {
    assert_rejects(
        "[storage]\nroot = \"/tmp/qg\"\n[logging]\nsink = \"stderr\"\npath = \"/tmp/events.jsonl\"\n",
        "logging.path",
    )
}

#[test]
fn optional_limits_round_trip() -> TestResult {
    let config = QueryGateConfig::from_toml_str(
        "[storage]\nroot = \"/tmp/qg\"\nttl_hours = 1.5\nmax_entries = 20\norphan_grace_secs = 60\n",
    )
    .map_err(|err| err.to_string())?;
    let store = config.storage.to_store_config();
    if store.ttl_hours != Some(1.5) || store.max_entries != Some(20) || store.orphan_grace_secs != Some(60) {
        return Err(format!("unexpected limits: {store:?}"));
    }
    Ok(())
}
