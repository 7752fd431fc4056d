// crates/query-gate-mcp/src/tools.rs
// ============================================================================
// Module: Tool Router
// Description: Tool routing for the query gateway.
// Purpose: Expose thin async wrappers over producers and the result store.
// Dependencies: query-gate-core, query-gate-store-fs, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! The tool router dispatches tool calls to registered query producers and
//! to the result store. Store operations are synchronous and may wait on the
//! cross-process catalog lock, so every handler runs them on
//! `tokio::task::spawn_blocking`; a lock wait suspends only the calling task.
//! Security posture: tool inputs are untrusted; see
//! `Docs/security/threat_model.md`.
//!
//! ## Invariants
//! - Every call records exactly one audit event, including unknown tools.
//! - Responses carry locators; filesystem paths appear only when the store
//!   is configured to expose them.
//! - Errors serialize as `{kind, message, cause?, retryable}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use query_gate_core::DatasourceId;
use query_gate_core::HashDigest;
use query_gate_core::PayloadFormat;
use query_gate_core::ProducerError;
use query_gate_core::QueryRequest;
use query_gate_core::ResultId;
use query_gate_core::ResultSummary;
use query_gate_core::Timestamp;
use query_gate_core::ToolTag;
use query_gate_store_fs::CatalogEntry;
use query_gate_store_fs::DeliveryMode;
use query_gate_store_fs::PersistRequest;
use query_gate_store_fs::ResultListing;
use query_gate_store_fs::ResultStore;
use query_gate_store_fs::StoreError;
use query_gate_store_fs::TrimRequest;
use query_gate_store_fs::parse_reference;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::audit::ToolAuditEvent;
use crate::audit::ToolAuditSink;
use crate::producers::ProducerRegistry;
use crate::resources::ResourceBody;
use crate::resources::encode_body;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of rows returned by `results_list`.
const DEFAULT_LIST_LIMIT: usize = 100;
/// Maximum number of rows returned by `results_list`.
const MAX_LIST_LIMIT: usize = 1_000;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical tool names exposed by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Run a query through a producer and persist its result.
    QueryRun,
    /// List stored results newest-first.
    ResultsList,
    /// Describe one stored result.
    ResultDescribe,
    /// Fetch a capped preview of one stored result.
    ResultFetch,
    /// Delete one stored result.
    ResultDelete,
    /// Remove results by age and/or count.
    ResultsTrim,
    /// Reconcile the catalog with disk and apply retention limits.
    ResultsSweep,
}

impl ToolName {
    /// Returns the canonical tool name string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QueryRun => "query_run",
            Self::ResultsList => "results_list",
            Self::ResultDescribe => "result_describe",
            Self::ResultFetch => "result_fetch",
            Self::ResultDelete => "result_delete",
            Self::ResultsTrim => "results_trim",
            Self::ResultsSweep => "results_sweep",
        }
    }

    /// Returns all tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::QueryRun,
            Self::ResultsList,
            Self::ResultDescribe,
            Self::ResultFetch,
            Self::ResultDelete,
            Self::ResultsTrim,
            Self::ResultsSweep,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "query_run" => Some(Self::QueryRun),
            "results_list" => Some(Self::ResultsList),
            "result_describe" => Some(Self::ResultDescribe),
            "result_fetch" => Some(Self::ResultFetch),
            "result_delete" => Some(Self::ResultDelete),
            "results_trim" => Some(Self::ResultsTrim),
            "results_sweep" => Some(Self::ResultsSweep),
            _ => None,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Tool definition advertised to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

// ============================================================================
// SECTION: Requests and Responses
// ============================================================================

/// `result_describe` request: a result id or locator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResultRefRequest {
    /// Result id or locator.
    result: String,
}

/// `results_list` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResultsListRequest {
    /// Maximum rows to return.
    #[serde(default)]
    limit: Option<usize>,
    /// Only list results from this tool.
    #[serde(default)]
    tool: Option<ToolTag>,
}

/// `result_fetch` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResultFetchRequest {
    /// Result id or locator.
    result: String,
    /// Requested byte budget.
    #[serde(default)]
    max_bytes: Option<u64>,
}

/// `result_delete` request.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResultDeleteRequest {
    /// Result id or locator.
    result: String,
    /// Whether to delete the payload file as well.
    #[serde(default = "default_delete_file")]
    delete_file: bool,
}

/// Payload files are deleted unless the caller opts out.
const fn default_delete_file() -> bool {
    true
}

/// Handle and summary returned by `query_run`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRunResponse {
    /// New result identifier.
    pub result_id: ResultId,
    /// Result locator.
    pub locator: String,
    /// Absolute payload path, when the store exposes local paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Producing tool tag.
    pub tool: ToolTag,
    /// Payload format.
    pub format: PayloadFormat,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Creation time.
    pub created_at: Timestamp,
    /// Producer summary.
    pub summary: ResultSummary,
}

/// `results_list` response.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsListResponse {
    /// Rows, newest first.
    pub results: Vec<ResultListing>,
    /// Number of matching results before the limit was applied.
    pub total: usize,
}

/// Metadata returned by `result_describe`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultDescription {
    /// Result identifier.
    pub result_id: ResultId,
    /// Result locator.
    pub locator: String,
    /// Absolute payload path, when recorded with local path delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Producing tool tag.
    pub tool: ToolTag,
    /// Backend datasource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource_id: Option<DatasourceId>,
    /// Payload format.
    pub format: PayloadFormat,
    /// Payload size in bytes as last observed.
    pub size_bytes: u64,
    /// Creation time.
    pub created_at: Timestamp,
    /// Sanitized query arguments.
    pub inputs: Value,
    /// Digest of the sanitized arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_hash: Option<HashDigest>,
    /// Producer summary.
    pub summary: ResultSummary,
}

impl From<CatalogEntry> for ResultDescription {
    fn from(entry: CatalogEntry) -> Self {
        let local_path = (entry.delivery.mode == DeliveryMode::LocalPath).then(|| entry.path.clone());
        Self {
            locator: query_gate_store_fs::to_locator(&entry.id),
            result_id: entry.id,
            local_path,
            tool: entry.tool,
            datasource_id: entry.datasource_id,
            format: entry.format,
            size_bytes: entry.size_bytes,
            created_at: entry.created_at,
            inputs: entry.inputs,
            input_hash: entry.input_hash,
            summary: entry.summary,
        }
    }
}

/// Preview returned by `result_fetch`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultFetchResponse {
    /// Result identifier.
    pub result_id: ResultId,
    /// Result locator.
    pub locator: String,
    /// Payload format.
    pub format: PayloadFormat,
    /// Preview body.
    #[serde(flatten)]
    pub body: ResourceBody,
    /// Bytes read from the payload.
    pub returned_bytes: u64,
    /// Payload size in bytes.
    pub total_bytes: u64,
    /// Cap applied after server limits.
    pub effective_cap: u64,
    /// True when the preview stopped before the end of the payload.
    pub truncated: bool,
}

/// `result_delete` response.
#[derive(Debug, Clone, Serialize)]
pub struct ResultDeleteResponse {
    /// Deleted result identifier.
    pub result_id: ResultId,
    /// Whether the payload file was removed.
    pub file_deleted: bool,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Tool router configuration.
pub struct ToolRouterConfig {
    /// Result store shared with the resources surface.
    pub store: Arc<ResultStore>,
    /// Registered query producers.
    pub producers: ProducerRegistry,
    /// Tool call audit sink.
    pub audit: Arc<dyn ToolAuditSink>,
}

/// Tool router for gateway tool calls.
#[derive(Clone)]
pub struct ToolRouter {
    /// Result store.
    store: Arc<ResultStore>,
    /// Registered query producers.
    producers: Arc<ProducerRegistry>,
    /// Tool call audit sink.
    audit: Arc<dyn ToolAuditSink>,
}

/// Handler output before audit bookkeeping.
struct ToolResponse {
    /// Serialized response.
    value: Value,
    /// Result touched by the call.
    result_id: Option<ResultId>,
}

impl ToolRouter {
    /// Creates a router from its configuration.
    #[must_use]
    pub fn new(config: ToolRouterConfig) -> Self {
        Self {
            store: config.store,
            producers: Arc::new(config.producers),
            audit: config.audit,
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Returns the tool definitions with input schemas.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        let producer_tools: Vec<String> =
            self.producers.tools().iter().map(|tool| tool.as_str().to_string()).collect();
        ToolName::all().iter().map(|name| tool_definition(*name, &producer_tools)).collect()
    }

    /// Routes a tool call by name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when routing or the underlying operation fails.
    pub async fn handle_tool_call(&self, name: &str, payload: Value) -> Result<Value, ToolError> {
        let started = Instant::now();
        let outcome = match ToolName::parse(name) {
            Some(tool) => self.dispatch(tool, payload).await,
            None => Err((ToolError::UnknownTool(name.to_string()), None)),
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(response) => {
                self.audit.record(&ToolAuditEvent::tool_call(
                    name,
                    None,
                    response.result_id,
                    elapsed_ms,
                ));
                Ok(response.value)
            }
            Err((error, result_id)) => {
                self.audit.record(&ToolAuditEvent::tool_call(
                    name,
                    Some(error.kind()),
                    result_id,
                    elapsed_ms,
                ));
                Err(error)
            }
        }
    }

    /// Dispatches a parsed tool call.
    async fn dispatch(
        &self,
        tool: ToolName,
        payload: Value,
    ) -> Result<ToolResponse, (ToolError, Option<ResultId>)> {
        match tool {
            ToolName::QueryRun => self.handle_query_run(payload).await.map_err(|err| (err, None)),
            ToolName::ResultsList => self.handle_results_list(payload).await.map_err(|err| (err, None)),
            ToolName::ResultDescribe => self.handle_result_describe(payload).await,
            ToolName::ResultFetch => self.handle_result_fetch(payload).await,
            ToolName::ResultDelete => self.handle_result_delete(payload).await,
            ToolName::ResultsTrim => self.handle_results_trim(payload).await.map_err(|err| (err, None)),
            ToolName::ResultsSweep => {
                self.handle_results_sweep(payload).await.map_err(|err| (err, None))
            }
        }
    }

    /// Handles `query_run`.
    async fn handle_query_run(&self, payload: Value) -> Result<ToolResponse, ToolError> {
        let request = decode::<QueryRequest>(payload)?;
        let producer = self
            .producers
            .get(&request.tool)
            .ok_or_else(|| ToolError::UnknownProducer(request.tool.clone()))?;
        let router = self.clone();
        let persisted = tokio::task::spawn_blocking(move || {
            let output = producer.produce(&request)?;
            let persisted = router.store.persist(PersistRequest {
                tool: request.tool,
                datasource_id: request.datasource_id,
                inputs: request.arguments,
                payload: output.payload,
                summary: output.summary,
            })?;
            Ok::<_, ToolError>(persisted)
        })
        .await
        .map_err(|err| ToolError::Internal(format!("query run join failed: {err}")))??;
        let result_id = persisted.entry.id.clone();
        let response = QueryRunResponse {
            result_id: persisted.entry.id,
            locator: persisted.locator,
            local_path: persisted.local_path,
            tool: persisted.entry.tool,
            format: persisted.entry.format,
            size_bytes: persisted.entry.size_bytes,
            created_at: persisted.entry.created_at,
            summary: persisted.entry.summary,
        };
        respond(&response, Some(result_id))
    }

    /// Handles `results_list`.
    async fn handle_results_list(&self, payload: Value) -> Result<ToolResponse, ToolError> {
        let request = decode_or_default::<ResultsListRequest>(payload)?;
        let limit = normalize_limit(request.limit)?;
        let router = self.clone();
        let listings = tokio::task::spawn_blocking(move || router.store.list())
            .await
            .map_err(|err| ToolError::Internal(format!("results list join failed: {err}")))??;
        let mut results: Vec<ResultListing> = listings
            .into_iter()
            .filter(|row| request.tool.as_ref().is_none_or(|tool| &row.tool == tool))
            .collect();
        let total = results.len();
        results.truncate(limit);
        respond(
            &ResultsListResponse {
                results,
                total,
            },
            None,
        )
    }

    /// Handles `result_describe`.
    async fn handle_result_describe(
        &self,
        payload: Value,
    ) -> Result<ToolResponse, (ToolError, Option<ResultId>)> {
        let request = decode::<ResultRefRequest>(payload).map_err(|err| (err, None))?;
        let id = resolve_reference(&request.result).map_err(|err| (err, None))?;
        let router = self.clone();
        let lookup = id.clone();
        let entry = tokio::task::spawn_blocking(move || router.store.describe(&lookup))
            .await
            .map_err(|err| ToolError::Internal(format!("result describe join failed: {err}")))
            .and_then(|result| result.map_err(ToolError::from))
            .map_err(|err| (err, Some(id.clone())))?;
        respond(&ResultDescription::from(entry), Some(id.clone())).map_err(|err| (err, Some(id)))
    }

    /// Handles `result_fetch`.
    async fn handle_result_fetch(
        &self,
        payload: Value,
    ) -> Result<ToolResponse, (ToolError, Option<ResultId>)> {
        let request = decode::<ResultFetchRequest>(payload).map_err(|err| (err, None))?;
        let id = resolve_reference(&request.result).map_err(|err| (err, None))?;
        let router = self.clone();
        let lookup = id.clone();
        let content =
            tokio::task::spawn_blocking(move || router.store.fetch(&lookup, request.max_bytes))
                .await
                .map_err(|err| ToolError::Internal(format!("result fetch join failed: {err}")))
                .and_then(|result| result.map_err(ToolError::from))
                .map_err(|err| (err, Some(id.clone())))?;
        let returned_bytes = u64::try_from(content.bytes.len()).unwrap_or(u64::MAX);
        let response = ResultFetchResponse {
            result_id: content.entry.id.clone(),
            locator: query_gate_store_fs::to_locator(&content.entry.id),
            format: content.entry.format,
            body: encode_body(content.entry.format, content.bytes, content.truncated),
            returned_bytes,
            total_bytes: content.total_bytes,
            effective_cap: content.effective_cap,
            truncated: content.truncated,
        };
        respond(&response, Some(id.clone())).map_err(|err| (err, Some(id)))
    }

    /// Handles `result_delete`.
    async fn handle_result_delete(
        &self,
        payload: Value,
    ) -> Result<ToolResponse, (ToolError, Option<ResultId>)> {
        let request = decode::<ResultDeleteRequest>(payload).map_err(|err| (err, None))?;
        let id = resolve_reference(&request.result).map_err(|err| (err, None))?;
        let router = self.clone();
        let lookup = id.clone();
        let outcome =
            tokio::task::spawn_blocking(move || router.store.delete(&lookup, request.delete_file))
                .await
                .map_err(|err| ToolError::Internal(format!("result delete join failed: {err}")))
                .and_then(|result| result.map_err(ToolError::from))
                .map_err(|err| (err, Some(id.clone())))?;
        let response = ResultDeleteResponse {
            result_id: outcome.entry.id,
            file_deleted: outcome.file_deleted,
        };
        respond(&response, Some(id.clone())).map_err(|err| (err, Some(id)))
    }

    /// Handles `results_trim`.
    async fn handle_results_trim(&self, payload: Value) -> Result<ToolResponse, ToolError> {
        let request = decode::<TrimRequest>(payload)?;
        let router = self.clone();
        let report = tokio::task::spawn_blocking(move || router.store.trim(request))
            .await
            .map_err(|err| ToolError::Internal(format!("results trim join failed: {err}")))??;
        respond(&report, None)
    }

    /// Handles `results_sweep`.
    async fn handle_results_sweep(&self, payload: Value) -> Result<ToolResponse, ToolError> {
        if !payload.is_null() && payload.as_object().is_none_or(|fields| !fields.is_empty()) {
            return Err(ToolError::InvalidParams("results_sweep takes no arguments".to_string()));
        }
        let router = self.clone();
        let report = tokio::task::spawn_blocking(move || router.store.sweep())
            .await
            .map_err(|err| ToolError::Internal(format!("results sweep join failed: {err}")))??;
        respond(&report, None)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors.
///
/// # Invariants
/// - Variants are stable for caller error mapping.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name not recognized.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Tool payload deserialization failed.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// No producer is registered for the requested tool tag.
    #[error("no producer registered for tool {0}")]
    UnknownProducer(ToolTag),
    /// Producer rejected the query or its backend failed.
    #[error(transparent)]
    Producer(#[from] ProducerError),
    /// Result store error.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Tool payload serialization failed.
    #[error("serialization failure")]
    Serialization,
    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Returns the stable error kind label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::InvalidParams(_) => "invalid_params",
            Self::UnknownProducer(_) => "unknown_producer",
            Self::Producer(ProducerError::InvalidArguments(_)) => "invalid_arguments",
            Self::Producer(ProducerError::Backend(_)) => "backend_failure",
            Self::Store(error) => error.kind().as_str(),
            Self::Serialization => "serialization",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns true when retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(error) => error.is_retryable(),
            Self::Producer(ProducerError::Backend(_)) => true,
            Self::UnknownTool(_)
            | Self::InvalidParams(_)
            | Self::UnknownProducer(_)
            | Self::Producer(ProducerError::InvalidArguments(_))
            | Self::Serialization
            | Self::Internal(_) => false,
        }
    }

    /// Returns the caller-facing error payload.
    #[must_use]
    pub fn to_payload(&self) -> ToolErrorPayload {
        let cause = match self {
            Self::Store(error) => error.cause(),
            _ => None,
        };
        ToolErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
            cause,
            retryable: self.is_retryable(),
        }
    }
}

/// Serialized tool error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolErrorPayload {
    /// Stable error kind label.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Underlying cause, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    /// Whether retrying may succeed.
    pub retryable: bool,
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a tool payload into a request type.
fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, ToolError> {
    serde_json::from_value(payload).map_err(|err| ToolError::InvalidParams(err.to_string()))
}

/// Decodes a payload, treating `null` as the default request.
fn decode_or_default<T: for<'de> Deserialize<'de> + Default>(
    payload: Value,
) -> Result<T, ToolError> {
    if payload.is_null() { Ok(T::default()) } else { decode(payload) }
}

/// Normalizes list limits against defaults and bounds.
fn normalize_limit(limit: Option<usize>) -> Result<usize, ToolError> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
    if limit == 0 || limit > MAX_LIST_LIMIT {
        return Err(ToolError::InvalidParams(format!(
            "limit must be between 1 and {MAX_LIST_LIMIT}"
        )));
    }
    Ok(limit)
}

/// Resolves a result id or locator.
fn resolve_reference(reference: &str) -> Result<ResultId, ToolError> {
    parse_reference(reference).map_err(|err| ToolError::InvalidParams(err.to_string()))
}

/// Serializes a handler response.
fn respond<T: Serialize>(response: &T, result_id: Option<ResultId>) -> Result<ToolResponse, ToolError> {
    let value = serde_json::to_value(response).map_err(|_| ToolError::Serialization)?;
    Ok(ToolResponse {
        value,
        result_id,
    })
}

/// Builds the definition and input schema for one tool.
fn tool_definition(name: ToolName, producer_tools: &[String]) -> ToolDefinition {
    let reference = json!({
        "type": "string",
        "description": "Result id or query-gate://results/<id> locator."
    });
    let (description, input_schema) = match name {
        ToolName::QueryRun => (
            "Run a query through a registered producer and persist the result. Returns a \
             locator and compact summary instead of the payload.",
            json!({
                "type": "object",
                "properties": {
                    "tool": {"type": "string", "enum": producer_tools},
                    "datasource_id": {"type": ["string", "null"]},
                    "arguments": {"type": "object"}
                },
                "required": ["tool"],
                "additionalProperties": false
            }),
        ),
        ToolName::ResultsList => (
            "List stored results newest-first.",
            json!({
                "type": "object",
                "properties": {
                    "limit": {"type": "integer", "minimum": 1, "maximum": MAX_LIST_LIMIT},
                    "tool": {"type": "string"}
                },
                "additionalProperties": false
            }),
        ),
        ToolName::ResultDescribe => (
            "Return metadata and summary for one stored result.",
            json!({
                "type": "object",
                "properties": {"result": reference},
                "required": ["result"],
                "additionalProperties": false
            }),
        ),
        ToolName::ResultFetch => (
            "Read the leading bytes of a stored result, capped by the server preview limit.",
            json!({
                "type": "object",
                "properties": {
                    "result": reference,
                    "max_bytes": {"type": "integer", "minimum": 0}
                },
                "required": ["result"],
                "additionalProperties": false
            }),
        ),
        ToolName::ResultDelete => (
            "Delete a stored result and, unless delete_file is false, its payload file.",
            json!({
                "type": "object",
                "properties": {
                    "result": reference,
                    "delete_file": {"type": "boolean", "default": true}
                },
                "required": ["result"],
                "additionalProperties": false
            }),
        ),
        ToolName::ResultsTrim => (
            "Remove results older than max_age_hours, then keep only the newest max_count.",
            json!({
                "type": "object",
                "properties": {
                    "max_age_hours": {"type": "number", "minimum": 0},
                    "max_count": {"type": "integer", "minimum": 0}
                },
                "anyOf": [{"required": ["max_age_hours"]}, {"required": ["max_count"]}],
                "additionalProperties": false
            }),
        ),
        ToolName::ResultsSweep => (
            "Drop entries whose files are missing and apply configured retention limits.",
            json!({"type": "object", "properties": {}, "additionalProperties": false}),
        ),
    };
    ToolDefinition {
        name,
        description: description.to_string(),
        input_schema,
    }
}

#[cfg(test)]
mod tests;
