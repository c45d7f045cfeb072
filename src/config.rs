//! Static cluster configuration and per-node runtime settings.
//!
//! The cluster file is JSON and enumerates every node once:
//!
//! ```json
//! { "nodes": [
//!     { "id": "n1", "address": "127.0.0.1:8001", "isMaster": true },
//!     { "id": "n2", "address": "127.0.0.1:8002", "isMaster": false }
//! ] }
//! ```
//!
//! It is read once at startup and never mutated afterwards.

use crate::node::coordinator::WritePolicy;

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeConfig {
    pub id: String,
    pub address: String,
    /// Declared role. Exactly one node in the file carries `true`.
    #[serde(rename = "isMaster")]
    pub is_master: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClusterConfig {
    pub nodes: Vec<NodeConfig>,
}

impl ClusterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read cluster config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid cluster config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ClusterConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty clusters, duplicate ids or addresses, and anything other
    /// than exactly one declared master.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("cluster config lists no nodes");
        }

        let mut ids = HashSet::new();
        let mut addresses = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                bail!("duplicate node id '{}'", node.id);
            }
            if !addresses.insert(node.address.as_str()) {
                bail!("duplicate node address '{}'", node.address);
            }
        }

        match self.nodes.iter().filter(|n| n.is_master).count() {
            1 => Ok(()),
            0 => bail!("cluster config declares no master"),
            n => bail!("cluster config declares {} masters", n),
        }
    }

    /// Finds the entry whose address matches the address this process bound.
    pub fn locate(&self, address: &str) -> Result<&NodeConfig> {
        self.nodes
            .iter()
            .find(|n| n.address == address)
            .ok_or_else(|| anyhow!("no node in cluster config has address {}", address))
    }

    pub fn master(&self) -> Option<&NodeConfig> {
        self.nodes.iter().find(|n| n.is_master)
    }

    /// Addresses of every node except `address`.
    pub fn peers_of(&self, address: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.address != address)
            .map(|n| n.address.clone())
            .collect()
    }
}

/// Liveness-probe tuning for the failure monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between probes.
    pub interval: Duration,
    /// Per-probe request timeout.
    pub probe_timeout: Duration,
    /// Consecutive failed probes before self-promotion. Values below 1 act as 1.
    pub failure_threshold: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(2),
            failure_threshold: 1,
        }
    }
}

/// Everything a node needs at startup besides the cluster file.
#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub monitor: MonitorConfig,
    /// Request timeout for replication and notification sends.
    pub replication_timeout: Duration,
    pub write_policy: WritePolicy,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            replication_timeout: Duration::from_secs(2),
            write_policy: WritePolicy::default(),
        }
    }
}
