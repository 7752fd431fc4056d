// crates/query-gate-core/tests/identifiers.rs
// ============================================================================
// Module: Result Identifier Tests
// Description: Validation, ordering, and serde behavior of result identifiers.
// ============================================================================
//! ## Overview
//! Ensures generated identifiers are unique, time-ordered, and usable as file
//! stems, and that untrusted identifier strings are rejected.

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

use query_gate_core::IdentifierError;
use query_gate_core::ResultId;
use query_gate_core::Timestamp;
use query_gate_core::identifiers::MAX_RESULT_ID_LENGTH;

#[test]
fn generated_ids_sort_by_creation_millisecond() {
    let earlier = ResultId::generate(Timestamp::from_unix_millis(1_700_000_000_000));
    let later = ResultId::generate(Timestamp::from_unix_millis(1_700_000_000_001));
    assert!(earlier < later);
    assert!(earlier.as_str().starts_with("1700000000000-"));
}

#[test]
fn generated_ids_are_distinct_within_one_millisecond() {
    let now = Timestamp::from_unix_millis(1_700_000_000_000);
    let ids: BTreeSet<ResultId> = (0 .. 256).map(|_| ResultId::generate(now)).collect();
    assert_eq!(ids.len(), 256);
}

#[test]
fn generated_ids_parse_back() {
    let id = ResultId::generate(Timestamp::from_unix_millis(42));
    assert_eq!(ResultId::parse(id.as_str()).unwrap(), id);
    assert!(id.as_str().starts_with("0000000000042-"));
}

#[test]
fn parse_rejects_path_traversal_and_separators() {
    assert_eq!(ResultId::parse("../etc"), Err(IdentifierError::InvalidCharacter('.')));
    assert_eq!(ResultId::parse("a/b"), Err(IdentifierError::InvalidCharacter('/')));
    assert_eq!(ResultId::parse(""), Err(IdentifierError::Empty));
}

#[test]
fn parse_rejects_overlong_ids() {
    let long = "a".repeat(MAX_RESULT_ID_LENGTH + 1);
    assert_eq!(
        ResultId::parse(&long),
        Err(IdentifierError::TooLong {
            max: MAX_RESULT_ID_LENGTH
        })
    );
}

#[test]
fn deserialize_validates_ids() {
    let ok: ResultId = serde_json::from_str("\"1700000000000-00ff00ff\"").unwrap();
    assert_eq!(ok.as_str(), "1700000000000-00ff00ff");
    assert!(serde_json::from_str::<ResultId>("\"bad id\"").is_err());
}
