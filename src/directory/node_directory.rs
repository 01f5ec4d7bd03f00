//! Node Directory
//!
//! Resolves between node names (private FQDNs) and node ids using the
//! `pvtfqdn_to_nodeid` mapping in the cluster KV namespace:
//!
//! ```text
//! <prefix>pvtfqdn_to_nodeid/<node-name> -> <node-id>
//! ```
//!
//! Lookups go through the registry's shared directory client.

use crate::consts::PVTFQDN_TO_NODEID_KEY;
use crate::domain::ports::{KvEntries, KvStore, NodeIdentity};
use crate::error::{Error, Result};
use crate::registry::ConfigRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name/id resolution over the cluster KV namespace
#[derive(Clone)]
pub struct NodeDirectory {
    registry: Arc<ConfigRegistry>,
}

impl NodeDirectory {
    pub fn new(registry: Arc<ConfigRegistry>) -> Self {
        Self { registry }
    }

    fn client(&self) -> Result<Arc<dyn KvStore>> {
        self.registry.directory_client(false)
    }

    async fn mapping(&self) -> Result<KvEntries> {
        self.client()?.get(PVTFQDN_TO_NODEID_KEY).await
    }

    /// Node name owning `node_id`
    ///
    /// Entries are scanned in key order and the first match wins. Fails with
    /// [`Error::InvalidNode`] when no entry carries `node_id`.
    pub async fn resolve_node_name(&self, node_id: &str) -> Result<String> {
        let mapping = self.mapping().await?;

        let mut matches = mapping
            .iter()
            .filter(|(key, id)| is_node_key(key) && id.as_str() == node_id);
        let Some((key, _)) = matches.next() else {
            return Err(Error::InvalidNode {
                node_id: node_id.to_string(),
            });
        };

        if let Some((other, _)) = matches.next() {
            warn!(
                "node_id {} is mapped by both {} and {}, using the first",
                node_id, key, other
            );
        }

        let name = last_segment(key).to_string();
        debug!("Resolved node_id {} to {}", node_id, name);
        Ok(name)
    }

    /// Node id of `node_name`
    ///
    /// Only the entry stored exactly at `pvtfqdn_to_nodeid/<node_name>` is
    /// used; keys that merely share the prefix (`node1` vs `node10`) are
    /// ignored. Fails with a not-found error when that entry is absent.
    pub async fn resolve_node_id(&self, node_name: &str) -> Result<String> {
        let key = format!("{}/{}", PVTFQDN_TO_NODEID_KEY, node_name);
        let mut entries = self.client()?.get(&key).await?;

        let node_id = entries.remove(&key).ok_or_else(|| Error::KvKeyNotFound { key: key.clone() })?;
        debug!("Resolved node {} to node_id {}", node_name, node_id);
        Ok(node_id)
    }

    /// Every node in the identity mapping, in key order
    pub async fn list_nodes(&self) -> Result<Vec<NodeIdentity>> {
        let mapping = self.mapping().await?;

        Ok(mapping
            .into_iter()
            .filter(|(key, _)| is_node_key(key))
            .map(|(key, id)| NodeIdentity {
                name: last_segment(&key).to_string(),
                id,
            })
            .collect())
    }
}

fn last_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// False for the mapping's folder entry, which carries no node name
fn is_node_key(key: &str) -> bool {
    let name = last_segment(key);
    !name.is_empty() && name != PVTFQDN_TO_NODEID_KEY
}
