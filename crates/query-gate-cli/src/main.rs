// crates/query-gate-cli/src/main.rs
// ============================================================================
// Module: Query Gate CLI Entry Point
// Description: Command dispatcher for result store administration.
// Purpose: Inspect, import, and prune stored results from the shell.
// Dependencies: clap, query-gate-config, query-gate-mcp, query-gate-store-fs, serde_jcs, tokio
// ============================================================================

//! ## Overview
//! The `query-gate` CLI opens the storage root named by the configuration
//! file and runs one administrative command against it. Read and prune
//! commands go through the same tool router and resources surface the
//! gateway serves, so output matches what a calling agent would see. Output
//! is canonical JSON on stdout; failures print to stderr and exit with
//! status 1. Security posture: inputs are untrusted and must be validated;
//! see `Docs/security/threat_model.md`.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::ffi::OsStr;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use query_gate_config::QueryGateConfig;
use query_gate_config::config_toml_example;
use query_gate_core::DatasourceId;
use query_gate_core::GenericSummary;
use query_gate_core::PayloadFormat;
use query_gate_core::RawPayload;
use query_gate_core::ResultSummary;
use query_gate_core::ToolTag;
use query_gate_mcp::EventSinks;
use query_gate_mcp::ProducerRegistry;
use query_gate_mcp::QueryRunResponse;
use query_gate_mcp::ReadMode;
use query_gate_mcp::ResourceCatalog;
use query_gate_mcp::ToolError;
use query_gate_mcp::ToolRouter;
use query_gate_mcp::ToolRouterConfig;
use query_gate_mcp::open_event_sinks;
use query_gate_store_fs::PersistRequest;
use query_gate_store_fs::ResultStore;
use query_gate_store_fs::StoreDependencies;
use query_gate_store_fs::parse_reference;
use query_gate_store_fs::to_locator;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "query-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to query-gate.toml or `QUERY_GATE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Stored result operations.
    Results {
        /// Selected results subcommand.
        #[command(subcommand)]
        command: ResultsCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Results subcommands.
#[derive(Subcommand, Debug)]
enum ResultsCommand {
    /// List stored results newest-first.
    List(ResultsListCommand),
    /// Show metadata and summary for one result.
    Describe(ResultRefArgs),
    /// Print a capped preview of one result.
    Fetch(ResultsFetchCommand),
    /// Print a whole result, refusing oversized payloads.
    Read(ResultRefArgs),
    /// Import a file as a new result.
    Put(ResultsPutCommand),
    /// Delete one result.
    Delete(ResultsDeleteCommand),
    /// Remove results by age and/or count.
    Trim(ResultsTrimCommand),
    /// Reconcile the catalog with disk and apply retention limits.
    Sweep,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a query gate configuration file.
    Validate,
    /// Print an annotated example configuration.
    Example,
}

/// A result id or locator argument.
#[derive(Args, Debug)]
struct ResultRefArgs {
    /// Result id or `query-gate://results/<id>` locator.
    #[arg(value_name = "RESULT")]
    result: String,
}

/// Arguments for `results list`.
#[derive(Args, Debug)]
struct ResultsListCommand {
    /// Maximum rows to print.
    #[arg(long, value_name = "N")]
    limit: Option<usize>,
    /// Only list results from this tool.
    #[arg(long, value_name = "TOOL")]
    tool: Option<String>,
}

/// Arguments for `results fetch`.
#[derive(Args, Debug)]
struct ResultsFetchCommand {
    /// Result id or locator.
    #[arg(value_name = "RESULT")]
    result: String,
    /// Requested preview size; the server ceiling still applies.
    #[arg(long, value_name = "N")]
    max_bytes: Option<u64>,
}

/// Arguments for `results put`.
#[derive(Args, Debug)]
struct ResultsPutCommand {
    /// Tool tag recorded for the result.
    #[arg(long, value_name = "TOOL")]
    tool: String,
    /// Backend datasource recorded for the result.
    #[arg(long, value_name = "ID")]
    datasource: Option<String>,
    /// Payload format (defaults from the file extension, else binary).
    #[arg(long, value_name = "FORMAT", value_parser = parse_format)]
    format: Option<PayloadFormat>,
    /// Query arguments to record, as a JSON object.
    #[arg(long, value_name = "JSON")]
    inputs: Option<String>,
    /// Payload file to import.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
}

/// Arguments for `results delete`.
#[derive(Args, Debug)]
struct ResultsDeleteCommand {
    /// Result id or locator.
    #[arg(value_name = "RESULT")]
    result: String,
    /// Remove the catalog entry but leave the payload file.
    #[arg(long, action = ArgAction::SetTrue)]
    keep_file: bool,
}

/// Arguments for `results trim`.
#[derive(Args, Debug)]
struct ResultsTrimCommand {
    /// Remove results older than this many hours.
    #[arg(long, value_name = "HOURS")]
    max_age_hours: Option<f64>,
    /// Keep at most this many of the newest results.
    #[arg(long, value_name = "N")]
    max_count: Option<usize>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<ToolError> for CliError {
    fn from(error: ToolError) -> Self {
        let payload = error.to_payload();
        let message = match payload.cause {
            Some(cause) => format!("{}: {} ({cause})", payload.kind, payload.message),
            None => format!("{}: {}", payload.kind, payload.message),
        };
        Self::new(message)
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Results {
            command,
        } => command_results(cli.config.as_deref(), command).await,
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(cli.config.as_deref()),
        Commands::Config {
            command: ConfigCommand::Example,
        } => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<QueryGateConfig> {
    QueryGateConfig::load(path).map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Executes the config validation command.
fn command_config_validate(path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(path)?;
    write_canonical_json(&json!({
        "status": "ok",
        "storage_root": config.storage.root,
        "logging_sink": config.logging.sink,
    }))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Results Commands
// ============================================================================

/// Store handles opened for one command.
struct StoreContext {
    /// Result store over the configured root.
    store: Arc<ResultStore>,
    /// Tool router sharing the store.
    router: ToolRouter,
}

impl StoreContext {
    /// Opens the configured store without running a startup sweep.
    fn open(config: &QueryGateConfig) -> CliResult<Self> {
        let EventSinks {
            store: events,
            audit,
        } = open_event_sinks(&config.logging).map_err(|err| CliError::new(err.to_string()))?;
        let deps = StoreDependencies::default().with_events(events);
        let store = ResultStore::new(config.storage.to_store_config(), deps)
            .map_err(|err| CliError::from(ToolError::from(err)))?;
        let store = Arc::new(store);
        let router = ToolRouter::new(ToolRouterConfig {
            store: Arc::clone(&store),
            producers: ProducerRegistry::new(),
            audit,
        });
        Ok(Self {
            store,
            router,
        })
    }

    /// Runs a tool call and prints its response.
    async fn call(&self, tool: &str, payload: Value) -> CliResult<ExitCode> {
        let response = self.router.handle_tool_call(tool, payload).await?;
        write_canonical_json(&response)?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Dispatches results subcommands.
async fn command_results(config_path: Option<&Path>, command: ResultsCommand) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let context = StoreContext::open(&config)?;
    match command {
        ResultsCommand::List(command) => {
            context
                .call("results_list", json!({"limit": command.limit, "tool": command.tool}))
                .await
        }
        ResultsCommand::Describe(args) => {
            context.call("result_describe", json!({"result": args.result})).await
        }
        ResultsCommand::Fetch(command) => {
            context
                .call(
                    "result_fetch",
                    json!({"result": command.result, "max_bytes": command.max_bytes}),
                )
                .await
        }
        ResultsCommand::Read(args) => command_results_read(&context, &args).await,
        ResultsCommand::Put(command) => command_results_put(&context, command).await,
        ResultsCommand::Delete(command) => {
            context
                .call(
                    "result_delete",
                    json!({"result": command.result, "delete_file": !command.keep_file}),
                )
                .await
        }
        ResultsCommand::Trim(command) => {
            context
                .call(
                    "results_trim",
                    json!({"max_age_hours": command.max_age_hours, "max_count": command.max_count}),
                )
                .await
        }
        ResultsCommand::Sweep => context.call("results_sweep", Value::Null).await,
    }
}

/// Executes `results read` through the resources surface.
async fn command_results_read(context: &StoreContext, args: &ResultRefArgs) -> CliResult<ExitCode> {
    let id = parse_reference(&args.result)
        .map_err(|err| CliError::new(format!("invalid_params: {err}")))?;
    let resources = ResourceCatalog::new(Arc::clone(&context.store));
    let content = resources
        .read(&to_locator(&id), ReadMode::Full)
        .await
        .map_err(|err| CliError::new(format!("{}: {err}", err.kind())))?;
    write_canonical_json(&content)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `results put`, importing a file as a new result.
async fn command_results_put(context: &StoreContext, command: ResultsPutCommand) -> CliResult<ExitCode> {
    let max_bytes = context.store.config().max_payload_bytes;
    let bytes = read_bytes_with_limit(&command.file, max_bytes).map_err(|err| match err {
        ReadLimitError::Io(err) => {
            CliError::new(format!("failed to read {}: {err}", command.file.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "size_exceeded: {} is {size} bytes, above the {limit} byte limit",
            command.file.display()
        )),
    })?;
    let format = command.format.unwrap_or_else(|| format_from_path(&command.file));
    let inputs = match &command.inputs {
        Some(text) => parse_inputs(text)?,
        None => json!({}),
    };
    let file_name =
        command.file.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let request = PersistRequest {
        tool: ToolTag::new(command.tool),
        datasource_id: command.datasource.map(DatasourceId::new),
        inputs,
        payload: RawPayload::new(format, bytes),
        summary: ResultSummary::Generic(GenericSummary {
            record_count: None,
            note: Some(format!("imported from {file_name}")),
        }),
    };
    let store = Arc::clone(&context.store);
    let persisted = tokio::task::spawn_blocking(move || store.persist(request))
        .await
        .map_err(|err| CliError::new(format!("internal: results put join failed: {err}")))?
        .map_err(|err| CliError::from(ToolError::from(err)))?;
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
    write_canonical_json(&response)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Parses a payload format label.
fn parse_format(label: &str) -> Result<PayloadFormat, String> {
    PayloadFormat::parse(label).ok_or_else(|| {
        let known: Vec<&str> = PayloadFormat::ALL.iter().map(|format| format.as_str()).collect();
        format!("unknown format {label:?}; expected one of {}", known.join(", "))
    })
}

/// Infers a payload format from a file extension.
fn format_from_path(path: &Path) -> PayloadFormat {
    path.extension()
        .and_then(OsStr::to_str)
        .and_then(PayloadFormat::from_extension)
        .unwrap_or(PayloadFormat::Binary)
}

/// Parses `--inputs`, which must be a JSON object.
fn parse_inputs(text: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| CliError::new(format!("invalid_params: --inputs is not JSON: {err}")))?;
    if !value.is_object() {
        return Err(CliError::new("invalid_params: --inputs must be a JSON object".to_string()));
    }
    Ok(value)
}

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: u64,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: u64) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    if size > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(max_bytes.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    let actual = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
    if actual > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: actual,
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a value as canonical JSON followed by a newline.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("serialization: {err}")))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
