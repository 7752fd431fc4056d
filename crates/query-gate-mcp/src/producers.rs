// crates/query-gate-mcp/src/producers.rs
// ============================================================================
// Module: Producer Registry
// Description: Maps tool tags to query producers.
// Purpose: Resolve which backend adapter handles a `query_run` call.
// Dependencies: query-gate-core
// ============================================================================

//! ## Overview
//! Backend adapters implement [`QueryProducer`] and are registered under the
//! [`ToolTag`] that callers name in `query_run`. The registry is immutable
//! once handed to the router.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use query_gate_core::QueryProducer;
use query_gate_core::ToolTag;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Tool-tag keyed producer registry.
#[derive(Clone, Default)]
pub struct ProducerRegistry {
    /// Registered producers.
    producers: BTreeMap<ToolTag, Arc<dyn QueryProducer>>,
}

impl ProducerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a producer, returning the one it replaced.
    pub fn register(
        &mut self,
        tool: ToolTag,
        producer: Arc<dyn QueryProducer>,
    ) -> Option<Arc<dyn QueryProducer>> {
        self.producers.insert(tool, producer)
    }

    /// Registers a producer and returns the registry.
    #[must_use]
    pub fn with_producer(mut self, tool: impl Into<ToolTag>, producer: Arc<dyn QueryProducer>) -> Self {
        self.producers.insert(tool.into(), producer);
        self
    }

    /// Looks up the producer for a tool tag.
    #[must_use]
    pub fn get(&self, tool: &ToolTag) -> Option<Arc<dyn QueryProducer>> {
        self.producers.get(tool).map(Arc::clone)
    }

    /// Returns registered tool tags in sorted order.
    #[must_use]
    pub fn tools(&self) -> Vec<ToolTag> {
        self.producers.keys().cloned().collect()
    }

    /// Returns true when no producers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}
