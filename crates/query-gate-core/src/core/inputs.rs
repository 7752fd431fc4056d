// crates/query-gate-core/src/core/inputs.rs
// ============================================================================
// Module: Query Input Sanitization
// Description: Redaction and bounding of query arguments before persistence.
// Purpose: Keep credentials and oversized arguments out of the catalog.
// Dependencies: serde_json, crate::core::hashing
// ============================================================================

//! ## Overview
//! Catalog entries keep a copy of the arguments a query ran with. Before the
//! copy is recorded, secret-looking keys are redacted, long strings and
//! arrays are truncated, and deep nesting is cut off. The input hash is
//! computed over the sanitized form so it never derives from a credential.
//!
//! Security posture: query arguments are untrusted and may embed secrets;
//! see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Replacement value for redacted keys.
pub const REDACTED_VALUE: &str = "[redacted]";
/// Replacement value for subtrees beyond [`MAX_INPUT_DEPTH`].
pub const DEPTH_LIMIT_VALUE: &str = "[depth-limit]";
/// Suffix appended to truncated strings.
pub const TRUNCATION_MARKER: &str = "…[truncated]";
/// Maximum characters kept per string value.
pub const MAX_INPUT_STRING_CHARS: usize = 1024;
/// Maximum items kept per array.
pub const MAX_INPUT_ARRAY_ITEMS: usize = 256;
/// Maximum nesting depth kept.
pub const MAX_INPUT_DEPTH: usize = 16;

/// Case-insensitive key fragments that mark a value as secret.
const SECRET_KEY_FRAGMENTS: &[&str] = &[
    "password",
    "secret",
    "token",
    "api_key",
    "apikey",
    "authorization",
    "credential",
    "cookie",
];

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Returns a redacted, bounded copy of query arguments.
#[must_use]
pub fn sanitize_inputs(inputs: &Value) -> Value {
    sanitize_value(inputs, 0)
}

/// Hashes sanitized query arguments over their canonical JSON form.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn input_digest(sanitized: &Value) -> Result<HashDigest, HashError> {
    hash_canonical_json(DEFAULT_HASH_ALGORITHM, sanitized)
}

/// Returns true when a key name looks like it carries a secret.
#[must_use]
pub fn is_secret_key(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    SECRET_KEY_FRAGMENTS.iter().any(|fragment| lowered.contains(fragment))
}

/// Recursive sanitizer.
fn sanitize_value(value: &Value, depth: usize) -> Value {
    if depth >= MAX_INPUT_DEPTH {
        return Value::String(DEPTH_LIMIT_VALUE.to_string());
    }
    match value {
        Value::String(text) => Value::String(truncate_string(text)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(MAX_INPUT_ARRAY_ITEMS)
                .map(|item| sanitize_value(item, depth + 1))
                .collect(),
        ),
        Value::Object(map) => {
            let mut sanitized = Map::with_capacity(map.len());
            for (key, item) in map {
                let replacement = if is_secret_key(key) {
                    Value::String(REDACTED_VALUE.to_string())
                } else {
                    sanitize_value(item, depth + 1)
                };
                sanitized.insert(key.clone(), replacement);
            }
            Value::Object(sanitized)
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

/// Truncates a string at a character boundary.
fn truncate_string(text: &str) -> String {
    if text.chars().count() <= MAX_INPUT_STRING_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_INPUT_STRING_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
