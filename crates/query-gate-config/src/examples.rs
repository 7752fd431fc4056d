// crates/query-gate-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `query-gate.toml`. The example is loaded and validated
//! by tests so it cannot drift from the model.

/// Returns a canonical example `query-gate.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[storage]
root = "/var/lib/query-gate"
preview_default_bytes = 65536
preview_max_bytes = 262144
max_resource_bytes = 8388608
max_payload_bytes = 268435456
# ttl_hours = 24.0
# max_entries = 500
# orphan_grace_secs = 3600
expose_local_paths = false
sweep_on_startup = true

[storage.lock]
wait_timeout_ms = 10000
poll_interval_ms = 50
stale_after_ms = 30000

[logging]
sink = "file"
path = "/var/log/query-gate/events.jsonl"
"#,
    )
}
