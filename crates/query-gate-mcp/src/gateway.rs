// crates/query-gate-mcp/src/gateway.rs
// ============================================================================
// Module: Gateway Bootstrap
// Description: Wires configuration, sinks, store, notifier, and router.
// Purpose: Build a ready-to-serve gateway from a validated config file.
// Dependencies: query-gate-config, query-gate-store-fs, thiserror
// ============================================================================

//! ## Overview
//! [`QueryGateway::from_config`] is the single startup path: it validates the
//! configuration, opens the configured event sinks, builds the result store
//! with a [`BroadcastNotifier`], and runs the startup sweep. A failed sweep
//! is logged and does not prevent startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use query_gate_config::ConfigError;
use query_gate_config::LogSinkKind;
use query_gate_config::LoggingConfig;
use query_gate_config::QueryGateConfig;
use query_gate_core::CatalogChange;
use query_gate_store_fs::FileStoreEventSink;
use query_gate_store_fs::NoopStoreEventSink;
use query_gate_store_fs::ResultStore;
use query_gate_store_fs::StderrStoreEventSink;
use query_gate_store_fs::StoreDependencies;
use query_gate_store_fs::StoreError;
use query_gate_store_fs::StoreEvent;
use query_gate_store_fs::StoreEventKind;
use query_gate_store_fs::StoreEventSink;
use query_gate_store_fs::SweepReport;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::audit::FileToolAuditSink;
use crate::audit::NoopToolAuditSink;
use crate::audit::StderrToolAuditSink;
use crate::audit::ToolAuditSink;
use crate::notify::BroadcastNotifier;
use crate::producers::ProducerRegistry;
use crate::resources::ResourceCatalog;
use crate::tools::ToolRouter;
use crate::tools::ToolRouterConfig;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gateway startup errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Result store could not be built.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Event log file could not be opened.
    #[error("event log {} could not be opened: {source}", path.display())]
    EventLog {
        /// Configured log path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Assembled gateway components.
pub struct QueryGateway {
    /// Shared result store.
    store: Arc<ResultStore>,
    /// Tool router.
    router: ToolRouter,
    /// Resources surface.
    resources: ResourceCatalog,
    /// Change fan-out.
    notifier: BroadcastNotifier,
    /// Startup sweep report, when a sweep ran and succeeded.
    startup_sweep: Option<SweepReport>,
}

impl QueryGateway {
    /// Builds a gateway from configuration and registered producers.
    ///
    /// Runs the startup sweep synchronously when enabled; call this before
    /// serving, or from a blocking context.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the config is invalid, the event log
    /// cannot be opened, or the store rejects its configuration.
    pub fn from_config(
        config: &QueryGateConfig,
        producers: ProducerRegistry,
    ) -> Result<Self, GatewayError> {
        config.validate()?;
        let sinks = open_event_sinks(&config.logging)?;
        let notifier = BroadcastNotifier::default();
        let deps = StoreDependencies::default()
            .with_notifier(Arc::new(notifier.clone()))
            .with_events(Arc::clone(&sinks.store));
        let store_config = config.storage.to_store_config();
        let sweep_on_startup = store_config.sweep_on_startup;
        let store = Arc::new(ResultStore::new(store_config, deps)?);

        let startup_sweep = if sweep_on_startup {
            match store.sweep() {
                Ok(report) => Some(report),
                Err(err) => {
                    sinks
                        .store
                        .record(&StoreEvent::new(StoreEventKind::SweepFailed).with_error(&err));
                    None
                }
            }
        } else {
            None
        };

        let router = ToolRouter::new(ToolRouterConfig {
            store: Arc::clone(&store),
            producers,
            audit: sinks.audit,
        });
        let resources = ResourceCatalog::new(Arc::clone(&store));
        Ok(Self {
            store,
            router,
            resources,
            notifier,
            startup_sweep,
        })
    }

    /// Returns the shared result store.
    #[must_use]
    pub const fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Returns the tool router.
    #[must_use]
    pub const fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Returns the resources surface.
    #[must_use]
    pub const fn resources(&self) -> &ResourceCatalog {
        &self.resources
    }

    /// Subscribes to catalog changes made through this gateway.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogChange> {
        self.notifier.subscribe()
    }

    /// Returns the startup sweep report, if one ran and succeeded.
    #[must_use]
    pub const fn startup_sweep(&self) -> Option<&SweepReport> {
        self.startup_sweep.as_ref()
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Store event and tool audit sinks opened from `[logging]`.
#[derive(Clone)]
pub struct EventSinks {
    /// Store event sink.
    pub store: Arc<dyn StoreEventSink>,
    /// Tool call audit sink.
    pub audit: Arc<dyn ToolAuditSink>,
}

/// Opens the store event and tool audit sinks named by `[logging]`.
///
/// Both sinks share one destination; the file sink opens the log twice in
/// append mode.
///
/// # Errors
///
/// Returns [`GatewayError::EventLog`] when the log file cannot be opened.
pub fn open_event_sinks(logging: &LoggingConfig) -> Result<EventSinks, GatewayError> {
    match (logging.sink, &logging.path) {
        (LogSinkKind::File, Some(path)) => {
            let open_error = |source: std::io::Error| GatewayError::EventLog {
                path: path.clone(),
                source,
            };
            let store = FileStoreEventSink::new(path).map_err(open_error)?;
            let audit = FileToolAuditSink::new(path).map_err(open_error)?;
            Ok(EventSinks {
                store: Arc::new(store),
                audit: Arc::new(audit),
            })
        }
        (LogSinkKind::File, None) => Err(GatewayError::Config(ConfigError::Invalid(
            "logging.path is required for the file sink".to_string(),
        ))),
        (LogSinkKind::Stderr, _) => Ok(EventSinks {
            store: Arc::new(StderrStoreEventSink),
            audit: Arc::new(StderrToolAuditSink),
        }),
        (LogSinkKind::None, _) => Ok(EventSinks {
            store: Arc::new(NoopStoreEventSink),
            audit: Arc::new(NoopToolAuditSink),
        }),
    }
}
