// crates/query-gate-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and bounded file reads.
// Purpose: Ensure imports fail closed on oversized inputs and bad flags.
// Dependencies: query-gate-cli main helpers
// ============================================================================

//! ## Overview
//! Validates `read_bytes_with_limit`, format inference, `--inputs` parsing,
//! and the clap command surface.
//!
//! Security posture: CLI inputs are untrusted; size limits must fail closed.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use clap::Parser;
use query_gate_core::PayloadFormat;
use tempfile::TempDir;

use super::Cli;
use super::CliError;
use super::Commands;
use super::ReadLimitError;
use super::ResultsCommand;
use super::format_from_path;
use super::parse_format;
use super::parse_inputs;
use super::read_bytes_with_limit;

// ============================================================================
// SECTION: Bounded Reads
// ============================================================================

#[test]
fn read_bytes_with_limit_accepts_files_at_the_limit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rows.json");
    fs::write(&path, b"[1,2,3]").unwrap();
    let bytes = read_bytes_with_limit(&path, 7).unwrap();
    assert_eq!(bytes, b"[1,2,3]");
}

#[test]
fn read_bytes_with_limit_rejects_oversized_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rows.json");
    fs::write(&path, b"[1,2,3]").unwrap();
    match read_bytes_with_limit(&path, 6) {
        Err(ReadLimitError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 7);
            assert_eq!(limit, 6);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

#[test]
fn read_bytes_with_limit_reports_missing_files() {
    let dir = TempDir::new().unwrap();
    let result = read_bytes_with_limit(&dir.path().join("absent.csv"), 1024);
    assert!(matches!(result, Err(ReadLimitError::Io(_))));
}

// ============================================================================
// SECTION: Input Parsing
// ============================================================================

#[test]
fn parse_format_accepts_known_labels() {
    assert_eq!(parse_format("ndjson").unwrap(), PayloadFormat::Ndjson);
    let err = parse_format("parquet").unwrap_err();
    assert!(err.contains("json"), "{err}");
}

#[test]
fn format_falls_back_to_binary_for_unknown_extensions() {
    assert_eq!(format_from_path(Path::new("out/rows.csv")), PayloadFormat::Csv);
    assert_eq!(format_from_path(Path::new("notes.txt")), PayloadFormat::Text);
    assert_eq!(format_from_path(Path::new("dump.parquet")), PayloadFormat::Binary);
    assert_eq!(format_from_path(Path::new("no-extension")), PayloadFormat::Binary);
}

#[test]
fn inputs_must_be_a_json_object() {
    let value = parse_inputs(r#"{"sql":"select 1"}"#).unwrap();
    assert_eq!(value["sql"], "select 1");
    let err: CliError = parse_inputs("[1]").unwrap_err();
    assert!(err.to_string().contains("JSON object"));
    assert!(parse_inputs("{not json").is_err());
}

// ============================================================================
// SECTION: Command Surface
// ============================================================================

#[test]
fn put_command_parses_format_and_file() {
    let cli = Cli::try_parse_from([
        "query-gate",
        "--config",
        "gate.toml",
        "results",
        "put",
        "--tool",
        "sql_query",
        "--format",
        "csv",
        "--file",
        "rows.csv",
    ])
    .unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("gate.toml")));
    let Commands::Results {
        command: ResultsCommand::Put(put),
    } = cli.command
    else {
        panic!("expected results put");
    };
    assert_eq!(put.tool, "sql_query");
    assert_eq!(put.format, Some(PayloadFormat::Csv));
    assert!(put.datasource.is_none());
}

#[test]
fn delete_keeps_file_only_when_asked() {
    let cli = Cli::try_parse_from(["query-gate", "results", "delete", "abc", "--keep-file"])
        .unwrap();
    let Commands::Results {
        command: ResultsCommand::Delete(delete),
    } = cli.command
    else {
        panic!("expected results delete");
    };
    assert!(delete.keep_file);
    assert_eq!(delete.result, "abc");
}

#[test]
fn unknown_format_is_rejected_by_the_parser() {
    let result = Cli::try_parse_from([
        "query-gate",
        "results",
        "put",
        "--tool",
        "sql_query",
        "--format",
        "xml",
        "--file",
        "rows.xml",
    ]);
    assert!(result.is_err());
}
