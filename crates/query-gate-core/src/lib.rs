// crates/query-gate-core/src/lib.rs
// ============================================================================
// Module: Query Gate Core Library
// Description: Public API surface for the Query Gate core.
// Purpose: Expose core types and integration interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Query Gate core defines the vocabulary shared by the result store and the
//! gateway: result identifiers, payload formats, producer summaries, input
//! sanitization, and the producer/notifier/clock interfaces. It performs no
//! I/O and never reads wall-clock time.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::CatalogChange;
pub use interfaces::ChangeNotifier;
pub use interfaces::Clock;
pub use interfaces::NoopChangeNotifier;
pub use interfaces::NotifyError;
pub use interfaces::ProducerError;
pub use interfaces::QueryOutput;
pub use interfaces::QueryProducer;
pub use interfaces::QueryRequest;
