//! Config Registry
//!
//! Load-once gate over the key-path config store plus the lazily built
//! directory client. One registry is created at process start and shared
//! by reference; tests build their own.

use super::major_version_of;
use crate::confstore::{scalar_to_string, FileConfStore};
use crate::consts::*;
use crate::domain::ports::{ConfStore, KvClientParams, KvConnector, KvStore};
use crate::error::{Error, Result};
use crate::kv::{ConsulConnector, ConsulEndpoint};
use crate::logging::{self, parse_level, LogOptions, LoggingGuard};
use indexmap::IndexSet;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// Registry Configuration
// =============================================================================

/// Source locations and KV prefix used by the registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// URL of the global config, used when `init` is not given one
    pub global_config_url: String,
    /// Cluster controller interface schema (JSON)
    pub controller_schema_path: PathBuf,
    /// Alert filter rules (JSON)
    pub alert_filter_rules_path: PathBuf,
    /// Alert event rules (JSON)
    pub alert_event_rules_path: PathBuf,
    /// Prefix the directory client is bound to
    pub cluster_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            global_config_url: format!("yaml://{}", HA_CONFIG_FILE),
            controller_schema_path: PathBuf::from(CM_CONTROLLER_SCHEMA),
            alert_filter_rules_path: PathBuf::from(ALERT_FILTER_RULES_FILE),
            alert_event_rules_path: PathBuf::from(ALERT_EVENT_RULES_FILE),
            cluster_prefix: CLUSTER_CONFSTORE_PREFIX.to_string(),
        }
    }
}

// =============================================================================
// Init Options
// =============================================================================

/// Arguments to [`ConfigRegistry::init`]
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Service name for logging; empty skips logging setup
    pub log_service_name: String,
    /// Log directory; read from `LOG>path` when absent
    pub log_path: Option<PathBuf>,
    /// Caller-side default only; `init` always logs at `LOG>level`
    pub level: String,
    pub backup_count: usize,
    pub file_size_mb: u64,
    pub syslog_server: Option<String>,
    pub syslog_port: Option<u16>,
    pub console_output: bool,
    /// Global config URL overriding the registry default
    pub config_file: Option<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            log_service_name: String::new(),
            log_path: None,
            level: "INFO".to_string(),
            backup_count: 5,
            file_size_mb: 10,
            syslog_server: None,
            syslog_port: None,
            console_output: true,
            config_file: None,
        }
    }
}

impl InitOptions {
    pub fn new(log_service_name: impl Into<String>) -> Self {
        Self {
            log_service_name: log_service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_config_file(mut self, url: impl Into<String>) -> Self {
        self.config_file = Some(url.into());
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn with_syslog(mut self, server: impl Into<String>, port: u16) -> Self {
        self.syslog_server = Some(server.into());
        self.syslog_port = Some(port);
        self
    }
}

// =============================================================================
// Config Registry
// =============================================================================

/// Process-wide access point for HA configuration
pub struct ConfigRegistry {
    config: RegistryConfig,
    store: Arc<dyn ConfStore>,
    connector: Arc<dyn KvConnector>,
    /// Indices loaded into `store`
    loaded: Mutex<IndexSet<String>>,
    /// Directory client, built on first use
    directory_client: Mutex<Option<Arc<dyn KvStore>>>,
}

impl ConfigRegistry {
    /// Create a registry backed by files and Consul
    pub fn new(config: RegistryConfig) -> Arc<Self> {
        Self::with_backends(
            config,
            Arc::new(FileConfStore::new()),
            Arc::new(ConsulConnector::default()),
        )
    }

    /// Create a registry over explicit store and connector implementations
    pub fn with_backends(
        config: RegistryConfig,
        store: Arc<dyn ConfStore>,
        connector: Arc<dyn KvConnector>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            connector,
            loaded: Mutex::new(IndexSet::new()),
            directory_client: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Load the global config and, for a named service, start logging
    ///
    /// The returned guard must be held for as long as file logging is needed.
    /// Logging is set up at most once per process: when a global subscriber
    /// is already installed, `init` only loads and returns `None`.
    pub fn init(&self, options: &InitOptions) -> Result<Option<LoggingGuard>> {
        let url = options
            .config_file
            .clone()
            .unwrap_or_else(|| self.config.global_config_url.clone());
        self.load_once(HA_GLOBAL_INDEX, &url)?;

        let Some(log_options) = self.resolve_log_options(options)? else {
            return Ok(None);
        };
        if tracing::dispatcher::has_been_set() {
            debug!(
                "Logging already initialized, not starting it for {}",
                log_options.service_name
            );
            return Ok(None);
        }
        Ok(Some(logging::init_logging(&log_options)?))
    }

    /// Logging options `init` would use, or `None` when no service is named
    ///
    /// Requires the global config to be loaded.
    pub fn resolve_log_options(&self, options: &InitOptions) -> Result<Option<LogOptions>> {
        if options.log_service_name.is_empty() {
            return Ok(None);
        }

        let log_path = match &options.log_path {
            Some(path) => path.clone(),
            None => PathBuf::from(self.get_str(HA_GLOBAL_INDEX, LOG_PATH_KEY)?),
        };
        let level = parse_level(&self.get_str(HA_GLOBAL_INDEX, LOG_LEVEL_KEY)?)?;

        Ok(Some(LogOptions {
            service_name: options.log_service_name.clone(),
            log_path,
            level,
            backup_count: options.backup_count,
            file_size_mb: options.file_size_mb,
            syslog_server: options.syslog_server.clone(),
            syslog_port: options.syslog_port,
            console_output: options.console_output,
        }))
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load `url` under `index` unless that index is already loaded
    ///
    /// The index is recorded only after the store accepts the source, so a
    /// failed load can be retried.
    pub fn load_once(&self, index: &str, url: &str) -> Result<()> {
        let mut loaded = self.loaded.lock();
        if loaded.contains(index) {
            debug!("Config index {} already loaded, skipping {}", index, url);
            return Ok(());
        }

        self.store.load(index, url)?;
        loaded.insert(index.to_string());
        info!("Registered config index {} ({})", index, url);
        Ok(())
    }

    pub fn is_loaded(&self, index: &str) -> bool {
        self.loaded.lock().contains(index)
    }

    /// Loaded indices in load order
    pub fn loaded_indices(&self) -> Vec<String> {
        self.loaded.lock().iter().cloned().collect()
    }

    /// Load the cluster controller interface schema
    pub fn load_controller_schema(&self) -> Result<()> {
        let url = json_url(&self.config.controller_schema_path);
        self.load_once(CM_CONTROLLER_INDEX, &url)
    }

    /// Load the alert filter rules
    pub fn load_filter_rules(&self) -> Result<()> {
        let url = json_url(&self.config.alert_filter_rules_path);
        self.load_once(ALERT_FILTER_INDEX, &url)
    }

    /// Load the alert event rules
    pub fn load_alert_events_rules(&self) -> Result<()> {
        let url = json_url(&self.config.alert_event_rules_path);
        self.load_once(ALERT_EVENT_INDEX, &url)
    }

    // =========================================================================
    // Directory Client
    // =========================================================================

    /// Shared client for the cluster KV namespace
    ///
    /// Built from `consul_config>endpoint` on the first call. The batching
    /// mode of that first call sticks; later arguments are ignored.
    pub fn directory_client(&self, enable_batching: bool) -> Result<Arc<dyn KvStore>> {
        let mut slot = self.directory_client.lock();
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }

        let endpoint = ConsulEndpoint::parse(&self.get_str(HA_GLOBAL_INDEX, CONSUL_ENDPOINT_KEY)?)?;
        let params = KvClientParams {
            prefix: self.config.cluster_prefix.clone(),
            scheme: endpoint.scheme,
            host: endpoint.host,
            port: endpoint.port,
            enable_batching,
        };

        let client = self.connector.connect(&params)?;
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Raw value at `key` in `index`
    pub fn get_value(&self, index: &str, key: &str) -> Result<serde_json::Value> {
        self.store.get(index, key)
    }

    /// Scalar value at `key` in `index`, rendered as a string
    pub fn get_str(&self, index: &str, key: &str) -> Result<String> {
        let value = self.store.get(index, key)?;
        scalar_to_string(key, &value)
    }

    /// Full product version
    pub fn version(&self) -> Result<String> {
        self.get_str(HA_GLOBAL_INDEX, VERSION_KEY)
    }

    /// Major component of the product version
    pub fn major_version(&self) -> Result<String> {
        let version = self.version()?;
        major_version_of(&version)
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidValue {
                key: VERSION_KEY.to_string(),
                reason: format!("no major version in {:?}", version),
            })
    }

    /// Name of the local node
    pub fn local_node(&self) -> Result<String> {
        self.get_str(HA_GLOBAL_INDEX, LOCAL_NODE_KEY)
    }

    /// Hardware environment tag (physical hardware or VM)
    pub fn hw_env(&self) -> Result<String> {
        self.get_str(HA_GLOBAL_INDEX, HW_ENV_KEY)
    }
}

fn json_url(path: &std::path::Path) -> String {
    format!("json://{}", path.display())
}
