// crates/query-gate-store-fs/src/lib.rs
// ============================================================================
// Module: Filesystem Result Store
// Description: Durable result catalog and payloads under one storage root.
// Purpose: Persist query results once and serve them by handle to many callers.
// Dependencies: query-gate-core, rand, serde, serde_json, tempfile, thiserror
// ============================================================================

//! ## Overview
//! This crate stores large query results on disk and indexes them in a JSON
//! catalog shared by every process pointed at the same root. Catalog
//! mutation is serialized across processes by an exclusive marker-file lock
//! with stale-holder reclaim; reads reload the catalog and proceed without
//! the lock. Security posture: catalog documents, identifiers, and byte
//! budgets are untrusted; see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod locator;
pub mod lock;
pub mod prune;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CATALOG_FORMAT_VERSION;
pub use catalog::CatalogDocument;
pub use catalog::CatalogEntry;
pub use catalog::CatalogMap;
pub use catalog::CatalogStore;
pub use catalog::DeliveryMode;
pub use catalog::DeliveryRecord;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use config::LockConfig;
pub use config::ResultStoreConfig;
pub use error::StoreError;
pub use error::StoreErrorKind;
pub use events::FileStoreEventSink;
pub use events::NoopStoreEventSink;
pub use events::RecordingStoreEventSink;
pub use events::StderrStoreEventSink;
pub use events::StoreEvent;
pub use events::StoreEventKind;
pub use events::StoreEventSink;
pub use locator::LocatorError;
pub use locator::RESULT_LOCATOR_PREFIX;
pub use locator::from_locator;
pub use locator::parse_reference;
pub use locator::to_locator;
pub use lock::FileLock;
pub use lock::LockGuard;
pub use lock::LockMarker;
pub use prune::SweepReport;
pub use prune::TrimReport;
pub use prune::TrimRequest;
pub use store::DeleteOutcome;
pub use store::FetchedContent;
pub use store::FullContent;
pub use store::PersistRequest;
pub use store::PersistedResult;
pub use store::ResultListing;
pub use store::ResultStore;
pub use store::StoreDependencies;
