// crates/query-gate-store-fs/src/store/tests.rs
// ============================================================================
// Module: Result Store Unit Tests
// Description: Tests for text rendering and allocation helpers.
// Purpose: Validate capped-read rendering at character boundaries.
// Dependencies: query-gate-store-fs
// ============================================================================

//! ## Overview
//! Exercises UTF-8 prefix rendering for truncated previews.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

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
    reason = "Test-only rendering assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Cow;

use super::capacity_hint;
use super::utf8_prefix;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn utf8_prefix_borrows_valid_text() {
    let rendered = utf8_prefix("plain ascii".as_bytes());
    assert!(matches!(rendered, Cow::Borrowed("plain ascii")));
}

#[test]
fn utf8_prefix_drops_split_trailing_character() {
    let text = "latency µs";
    let bytes = text.as_bytes();
    // Cut inside the two-byte micro sign.
    let cut = &bytes[.. bytes.len() - 2];
    assert_eq!(utf8_prefix(cut), "latency ");
}

#[test]
fn utf8_prefix_replaces_invalid_bytes_lossily() {
    let bytes = [0x66, 0xFF, 0x6F, 0x6F];
    assert_eq!(utf8_prefix(&bytes), "f\u{FFFD}oo");
}

#[test]
fn capacity_hint_is_bounded() {
    assert_eq!(capacity_hint(16), 16);
    assert_eq!(capacity_hint(u64::MAX), 1024 * 1024);
}
