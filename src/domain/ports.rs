//! Domain Ports - Core trait definitions for the configuration registry
//!
//! These traits define the boundaries between the registry logic and the
//! external systems it reads from: the key-path config store and the
//! distributed KV namespace. Adapters implement these traits to provide
//! concrete functionality; tests substitute in-memory implementations.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// =============================================================================
// Config Store Port
// =============================================================================

/// Structured configuration backend addressed by `>`-delimited key paths
///
/// Each loaded source lives under its own index name. Implementations are
/// free to reject a second `load` of the same index; the registry guarantees
/// it never asks twice.
pub trait ConfStore: Send + Sync {
    /// Load the source at `url` (e.g. `yaml:///etc/ha/ha.conf`) under `index`
    fn load(&self, index: &str, url: &str) -> Result<()>;

    /// Fetch the value at `key` (e.g. `LOG>path`) from a loaded index
    fn get(&self, index: &str, key: &str) -> Result<serde_json::Value>;
}

// =============================================================================
// KV Store Port
// =============================================================================

/// Entries returned by a KV lookup, keyed by path relative to the client prefix
pub type KvEntries = BTreeMap<String, String>;

/// Read-only view of the distributed key-value namespace
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch every entry whose key starts with `key`
    ///
    /// Fails with a not-found error when nothing lives under `key`.
    async fn get(&self, key: &str) -> Result<KvEntries>;

    /// Prefix every key of this client is scoped to
    fn prefix(&self) -> &str;
}

/// Parameters the registry hands to a [`KvConnector`] when the directory
/// client is first needed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvClientParams {
    /// Key prefix the client is bound to
    pub prefix: String,
    /// URL scheme taken from the configured endpoint
    pub scheme: String,
    /// KV server host
    pub host: String,
    /// KV server port
    pub port: u16,
    /// Coalesce identical in-flight requests
    pub enable_batching: bool,
}

/// Builds directory clients
pub trait KvConnector: Send + Sync {
    fn connect(&self, params: &KvClientParams) -> Result<Arc<dyn KvStore>>;
}

// =============================================================================
// Node Identity
// =============================================================================

/// One entry of the node identity mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// Private FQDN of the node
    pub name: String,
    /// Cluster-assigned node identifier
    pub id: String,
}

impl std::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.name, self.id)
    }
}
