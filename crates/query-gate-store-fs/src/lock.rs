// crates/query-gate-store-fs/src/lock.rs
// ============================================================================
// Module: Catalog File Lock
// Description: Cross-process mutual exclusion via an exclusive marker file.
// Purpose: Serialize catalog mutation across uncoordinated host processes.
// Dependencies: rand, serde, serde_json
// ============================================================================

//! ## Overview
//! The lock is one marker file under the storage root. Acquisition is an
//! atomic exclusive create; whoever creates the file holds the lock. The
//! marker records the holder's pid, a random token, and the acquisition time.
//!
//! ## Invariants
//! - At most one holder at a time: only `create_new` decides ownership.
//! - A marker whose modification time is older than the staleness threshold
//!   is treated as abandoned, deleted, and creation is retried immediately.
//!   Two waiters may both judge the same marker stale. Removal happens under
//!   a `<marker>.reclaim` sidecar and the marker is judged again there, so a
//!   successor's fresh marker is never removed; the create race then admits
//!   only one waiter and the rest keep waiting.
//! - A timed-out wait never leaves a marker behind; markers are only created
//!   on success.
//! - Release is idempotent and deletes the marker only while it still
//!   carries the holder's token, so a holder whose lock was reclaimed cannot
//!   remove its successor's marker. A tokenless marker is removed on release
//!   only once it is itself stale.
//! - A waiter that reclaims a stale marker as its budget runs out still
//!   attempts the create once before timing out.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::Metadata;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::config::LockConfig;
use crate::error::StoreError;
use crate::events::StoreEvent;
use crate::events::StoreEventKind;
use crate::events::StoreEventSink;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Holder identity recorded inside the marker file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMarker {
    /// Process identifier of the holder.
    pub pid: u32,
    /// Random token unique to one acquisition.
    pub token: String,
    /// Acquisition time (unix milliseconds).
    pub acquired_at_ms: u64,
}

impl LockMarker {
    /// Creates a marker for the current process with a fresh token.
    fn for_current_process() -> Self {
        let pid = std::process::id();
        let nonce: u64 = rand::random();
        Self {
            pid,
            token: format!("{pid:x}-{nonce:016x}"),
            acquired_at_ms: unix_millis_now(),
        }
    }
}

/// Exclusive marker-file lock over one storage root.
pub struct FileLock {
    /// Marker file path.
    path: PathBuf,
    /// Overall wait budget.
    wait_timeout: Duration,
    /// Sleep between attempts.
    poll_interval: Duration,
    /// Marker age treated as abandoned.
    stale_after: Duration,
    /// Event sink for reclaims and release failures.
    events: Arc<dyn StoreEventSink>,
}

impl FileLock {
    /// Creates a lock over the marker at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, config: &LockConfig, events: Arc<dyn StoreEventSink>) -> Self {
        Self {
            path: path.into(),
            wait_timeout: config.wait_timeout(),
            poll_interval: config.poll_interval(),
            stale_after: config.stale_after(),
            events,
        }
    }

    /// Returns the marker path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current holder's marker, if the lock is held and readable.
    #[must_use]
    pub fn holder(&self) -> Option<LockMarker> {
        read_marker(&self.path)
    }

    /// Blocks until the lock is acquired or the wait budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LockTimeout`] when the budget is exhausted and
    /// [`StoreError::Io`] when the marker cannot be created or inspected.
    pub fn acquire(&self) -> Result<LockGuard, StoreError> {
        let started = Instant::now();
        let mut final_attempt = false;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&self.path) {
                Ok(mut file) => {
                    let marker = LockMarker::for_current_process();
                    // Release only trusts a readable token, so an unwritten marker is undone.
                    let written = serde_json::to_vec(&marker)
                        .map_err(std::io::Error::other)
                        .and_then(|payload| file.write_all(&payload));
                    if let Err(err) = written {
                        drop(file);
                        let _ = fs::remove_file(&self.path);
                        return Err(StoreError::io(
                            format!("write lock marker {}", self.path.display()),
                            err,
                        ));
                    }
                    return Ok(LockGuard {
                        path: self.path.clone(),
                        token: marker.token,
                        stale_after: self.stale_after,
                        released: false,
                        events: Arc::clone(&self.events),
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
                Err(err) => {
                    return Err(StoreError::io(
                        format!("create lock marker {}", self.path.display()),
                        err,
                    ));
                }
            }

            if final_attempt {
                return Err(self.timeout(started));
            }
            let reclaimed = self.reclaim_if_stale()?;
            let waited = started.elapsed();
            if waited >= self.wait_timeout {
                // A marker just cleared gets one more create before giving up.
                if reclaimed {
                    final_attempt = true;
                    continue;
                }
                return Err(self.timeout(started));
            }
            if !reclaimed {
                thread::sleep(self.poll_interval.min(self.wait_timeout - waited));
            }
        }
    }

    /// Builds the timeout error for a wait that began at `started`.
    fn timeout(&self, started: Instant) -> StoreError {
        StoreError::LockTimeout {
            path: self.path.clone(),
            waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Deletes the marker if it is older than the staleness threshold.
    ///
    /// Returns true when the caller should retry creation immediately.
    fn reclaim_if_stale(&self) -> Result<bool, StoreError> {
        match self.stale_marker_age()? {
            MarkerState::Gone => return Ok(true),
            MarkerState::Live => return Ok(false),
            MarkerState::Stale(..) => {}
        }
        let Some(_reclaim) = ReclaimGuard::enter(&self.path, self.stale_after) else {
            return Ok(false);
        };
        // Another waiter may have reclaimed and a successor re-created the
        // marker since the first look; only the state seen here counts.
        let (age, observed) = match self.stale_marker_age()? {
            MarkerState::Gone => return Ok(true),
            MarkerState::Live => return Ok(false),
            MarkerState::Stale(age, observed) => (age, observed),
        };
        match fs::remove_file(&self.path) {
            Ok(()) => {
                let holder =
                    observed.map_or_else(|| "unknown".to_string(), |marker| marker.pid.to_string());
                self.events.record(&StoreEvent::new(StoreEventKind::LockReclaimedStale).with_detail(
                    format!("marker held by pid {holder} for {} ms", age.as_millis()),
                ));
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(true),
            Err(err) => Err(StoreError::io(
                format!("remove stale lock marker {}", self.path.display()),
                err,
            )),
        }
    }

    /// Classifies the current marker by age.
    fn stale_marker_age(&self) -> Result<MarkerState, StoreError> {
        let observed = read_marker(&self.path);
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(MarkerState::Gone),
            Err(err) => {
                return Err(StoreError::io(
                    format!("stat lock marker {}", self.path.display()),
                    err,
                ));
            }
        };
        let age = marker_age(&metadata, observed.as_ref());
        if age < self.stale_after {
            Ok(MarkerState::Live)
        } else {
            Ok(MarkerState::Stale(age, observed))
        }
    }
}

/// Marker state as seen by a waiter.
enum MarkerState {
    /// No marker; creation may be retried.
    Gone,
    /// A holder within the staleness threshold.
    Live,
    /// An abandoned marker, its age, and its parsed content if readable.
    Stale(Duration, Option<LockMarker>),
}

/// Exclusive right to reclaim a stale marker, held via a sidecar file.
///
/// # Invariants
/// - At most one waiter judges and removes a stale marker at a time.
/// - A sidecar left by a crashed reclaimer is itself removed once stale.
struct ReclaimGuard {
    /// Sidecar path (`<marker>.reclaim`).
    path: PathBuf,
}

impl ReclaimGuard {
    /// Creates the sidecar, or returns `None` when another waiter holds it.
    fn enter(marker_path: &Path, stale_after: Duration) -> Option<Self> {
        let mut name = marker_path.as_os_str().to_owned();
        name.push(".reclaim");
        let path = PathBuf::from(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Some(Self {
                path,
            }),
            Err(_) => {
                if let Ok(metadata) = fs::metadata(&path)
                    && marker_age(&metadata, None) >= stale_after
                {
                    let _ = fs::remove_file(&path);
                }
                None
            }
        }
    }
}

impl Drop for ReclaimGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Held catalog lock; releases on drop.
///
/// # Invariants
/// - `release` runs at most once; later calls and the drop are no-ops.
#[must_use = "dropping the guard releases the lock immediately"]
pub struct LockGuard {
    /// Marker file path.
    path: PathBuf,
    /// Token written by this acquisition.
    token: String,
    /// Age after which an unreadable marker may be removed on release.
    stale_after: Duration,
    /// Whether release already ran.
    released: bool,
    /// Event sink for release failures during drop.
    events: Arc<dyn StoreEventSink>,
}

impl LockGuard {
    /// Returns the acquisition token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Releases the lock. A missing marker counts as released.
    ///
    /// The marker is removed only while it carries this guard's token. A
    /// marker without a readable token may belong to a successor that has
    /// not finished writing it, so it is left alone unless it is already
    /// older than the staleness threshold.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the marker exists but cannot be deleted.
    pub fn release(&mut self) -> Result<(), StoreError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match read_marker(&self.path) {
            Some(marker) if marker.token == self.token => {}
            Some(_) => return Ok(()),
            None => match fs::metadata(&self.path) {
                Ok(metadata) if marker_age(&metadata, None) >= self.stale_after => {}
                Ok(_) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
                Err(err) => {
                    return Err(StoreError::io(
                        format!("stat lock marker {}", self.path.display()),
                        err,
                    ));
                }
            },
        }
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::io(
                format!("remove lock marker {}", self.path.display()),
                err,
            )),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            self.events.record(&StoreEvent::new(StoreEventKind::LockReleaseFailed).with_error(&err));
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads and parses the marker, tolerating absence and garbage.
fn read_marker(path: &Path) -> Option<LockMarker> {
    let content = fs::read(path).ok()?;
    serde_json::from_slice(&content).ok()
}

/// Returns how long the marker has been held.
///
/// The modification time is authoritative; the recorded acquisition time is
/// used when the mtime is unavailable or lies in the future.
fn marker_age(metadata: &Metadata, marker: Option<&LockMarker>) -> Duration {
    let from_mtime = metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok());
    from_mtime
        .or_else(|| {
            marker.map(|marker| {
                Duration::from_millis(unix_millis_now().saturating_sub(marker.acquired_at_ms))
            })
        })
        .unwrap_or_default()
}

/// Returns the current wall-clock time in unix milliseconds.
fn unix_millis_now() -> u64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}
