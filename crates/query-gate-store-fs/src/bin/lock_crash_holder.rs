//! Lock crash holder for stale-lock recovery tests.
// crates/query-gate-store-fs/src/bin/lock_crash_holder.rs
// ============================================================================
// Binary: Lock Crash Holder
// Description: Simulates a writer that dies while holding the catalog lock.
// Purpose: Support stale-lock reclaim and orphan reconciliation tests.
// Dependencies: query-gate-core, query-gate-store-fs
// ============================================================================

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use query_gate_core::PayloadFormat;
use query_gate_core::ResultId;
use query_gate_core::Timestamp;
use query_gate_store_fs::FileLock;
use query_gate_store_fs::NoopStoreEventSink;
use query_gate_store_fs::ResultStoreConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let root = args.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing storage root")
    })?;
    let write_orphan = args.next().is_some_and(|flag| flag == "--with-orphan");
    let config = ResultStoreConfig::new(PathBuf::from(root));
    fs::create_dir_all(config.results_dir())?;

    let lock = FileLock::new(config.lock_path(), &config.lock, Arc::new(NoopStoreEventSink));
    let _guard = lock.acquire()?;
    if write_orphan {
        // Payload written, catalog never updated: the persist died mid-flight.
        let id = ResultId::generate(Timestamp::from_unix_millis(1_700_000_000_000));
        let path = config.results_dir().join(format!("{id}.{}", PayloadFormat::Json.extension()));
        fs::write(path, b"{\"rows\":[]}")?;
    }
    // Abort skips destructors, so the marker stays behind.
    std::process::abort();
}
