// crates/query-gate-mcp/src/lib.rs
// ============================================================================
// Module: Query Gate MCP Library
// Description: Async gateway surface over the filesystem result store.
// Purpose: Route tool calls, serve resources, and fan out catalog changes.
// Dependencies: query-gate-config, query-gate-core, query-gate-store-fs, tokio
// ============================================================================

//! ## Overview
//! This crate is the caller-facing half of the query gate. Tool calls run
//! producers and persist their results; callers receive a locator and a
//! compact summary, then read payloads through the resources surface. Store
//! work runs on the blocking pool so catalog lock waits never stall the
//! async runtime.
//! Security posture: tool inputs and locators are untrusted; see
//! `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod gateway;
pub mod notify;
pub mod producers;
pub mod resources;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileToolAuditSink;
pub use audit::NoopToolAuditSink;
pub use audit::RecordingToolAuditSink;
pub use audit::StderrToolAuditSink;
pub use audit::ToolAuditEvent;
pub use audit::ToolAuditSink;
pub use audit::ToolOutcome;
pub use gateway::EventSinks;
pub use gateway::GatewayError;
pub use gateway::QueryGateway;
pub use gateway::open_event_sinks;
pub use notify::BroadcastNotifier;
pub use notify::DEFAULT_CHANGE_CAPACITY;
pub use producers::ProducerRegistry;
pub use resources::ReadMode;
pub use resources::ResourceBody;
pub use resources::ResourceCatalog;
pub use resources::ResourceContent;
pub use resources::ResourceError;
pub use resources::ResourceMetadata;
pub use tools::QueryRunResponse;
pub use tools::ResultDeleteResponse;
pub use tools::ResultDescription;
pub use tools::ResultFetchResponse;
pub use tools::ResultsListResponse;
pub use tools::ToolDefinition;
pub use tools::ToolError;
pub use tools::ToolErrorPayload;
pub use tools::ToolName;
pub use tools::ToolRouter;
pub use tools::ToolRouterConfig;
