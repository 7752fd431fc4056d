// crates/query-gate-mcp/src/tools/tests.rs
// ============================================================================
// Module: Tool Router Unit Tests
// Description: Unit tests for tool naming, error payloads, and request decoding.
// Purpose: Validate routing helpers without running producers.
// Dependencies: query-gate-mcp, query-gate-store-fs
// ============================================================================

//! ## Overview
//! Exercises the router's pure helpers and the error contract callers rely
//! on to tell retryable failures from invalid handles.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::use_debug,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use query_gate_core::ProducerError;
use query_gate_core::ResultId;
use query_gate_core::Timestamp;
use query_gate_store_fs::ResultStore;
use query_gate_store_fs::ResultStoreConfig;
use query_gate_store_fs::StoreDependencies;
use query_gate_store_fs::StoreError;
use serde_json::json;
use tempfile::TempDir;

use super::ResultsListRequest;
use super::ToolError;
use super::ToolName;
use super::ToolRouter;
use super::ToolRouterConfig;
use super::decode;
use super::decode_or_default;
use super::normalize_limit;
use super::resolve_reference;
use crate::audit::NoopToolAuditSink;
use crate::producers::ProducerRegistry;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

#[test]
fn tool_names_round_trip_through_parse() {
    for name in ToolName::all() {
        assert_eq!(ToolName::parse(name.as_str()), Some(*name));
        assert_eq!(name.to_string(), name.as_str());
    }
    assert_eq!(ToolName::parse("query_cancel"), None);
}

#[test]
fn list_tools_covers_every_tool_with_object_schema() {
    let dir = TempDir::new().unwrap();
    let store =
        ResultStore::new(ResultStoreConfig::new(dir.path()), StoreDependencies::default()).unwrap();
    let router = ToolRouter::new(ToolRouterConfig {
        store: Arc::new(store),
        producers: ProducerRegistry::new(),
        audit: Arc::new(NoopToolAuditSink),
    });
    let tools = router.list_tools();
    assert_eq!(tools.len(), ToolName::all().len());
    for tool in &tools {
        assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        assert_eq!(tool.input_schema["additionalProperties"], false, "{}", tool.name);
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

#[test]
fn store_errors_keep_kind_and_retryability() {
    let id = ResultId::generate(Timestamp::from_unix_millis(1_700_000_000_000));
    let not_found = ToolError::from(StoreError::NotFound(id)).to_payload();
    assert_eq!(not_found.kind, "not_found");
    assert!(!not_found.retryable);

    let timeout = ToolError::from(StoreError::LockTimeout {
        path: PathBuf::from("/tmp/catalog.lock"),
        waited_ms: 10,
    })
    .to_payload();
    assert_eq!(timeout.kind, "lock_timeout");
    assert!(timeout.retryable);

    let oversized = ToolError::from(StoreError::SizeExceeded {
        subject: "result".to_string(),
        actual_bytes: 10,
        max_bytes: 5,
    })
    .to_payload();
    assert_eq!(oversized.kind, "size_exceeded");
    assert!(!oversized.retryable);
}

#[test]
fn io_failures_carry_their_cause() {
    let error = ToolError::from(StoreError::Io {
        context: "read payload".to_string(),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    });
    let payload = error.to_payload();
    assert_eq!(payload.kind, "io_failure");
    assert!(payload.retryable);
    assert_eq!(payload.cause.as_deref(), Some("denied"));
    let value = serde_json::to_value(&payload).unwrap();
    assert_eq!(value["cause"], "denied");
}

#[test]
fn producer_errors_split_by_retryability() {
    let invalid = ToolError::from(ProducerError::InvalidArguments("bad".to_string()));
    assert_eq!(invalid.kind(), "invalid_arguments");
    assert!(!invalid.is_retryable());
    let backend = ToolError::from(ProducerError::Backend("503".to_string()));
    assert_eq!(backend.kind(), "backend_failure");
    assert!(backend.is_retryable());
}

#[test]
fn causeless_errors_omit_the_field() {
    let value = serde_json::to_value(ToolError::UnknownTool("nope".to_string()).to_payload())
        .unwrap();
    assert_eq!(value["kind"], "unknown_tool");
    assert!(value.get("cause").is_none());
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

#[test]
fn decode_maps_errors_to_invalid_params() {
    let err = decode::<ResultsListRequest>(json!({"limit": "ten"})).unwrap_err();
    assert!(matches!(err, ToolError::InvalidParams(_)));
    let err = decode::<ResultsListRequest>(json!({"surprise": 1})).unwrap_err();
    assert!(matches!(err, ToolError::InvalidParams(_)));
}

#[test]
fn null_payload_decodes_to_default_list_request() {
    let request = decode_or_default::<ResultsListRequest>(serde_json::Value::Null).unwrap();
    assert!(request.limit.is_none());
    assert!(request.tool.is_none());
}

#[test]
fn list_limits_are_bounded() {
    assert_eq!(normalize_limit(None).unwrap(), 100);
    assert_eq!(normalize_limit(Some(5)).unwrap(), 5);
    assert!(normalize_limit(Some(0)).is_err());
    assert!(normalize_limit(Some(1_001)).is_err());
}

#[test]
fn references_accept_ids_and_locators() {
    let id = ResultId::generate(Timestamp::from_unix_millis(1_700_000_000_000));
    assert_eq!(resolve_reference(id.as_str()).unwrap(), id);
    let locator = query_gate_store_fs::to_locator(&id);
    assert_eq!(resolve_reference(&locator).unwrap(), id);
    assert!(matches!(
        resolve_reference("file:///etc/passwd"),
        Err(ToolError::InvalidParams(_))
    ));
}
