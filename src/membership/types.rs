use crate::config::{ClusterConfig, NodeConfig};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Replica,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => write!(f, "primary"),
            Role::Replica => write!(f, "replica"),
        }
    }
}

/// Role and topology of the running node.
///
/// Built once from the cluster file and shared by the coordinator, the HTTP
/// layer and the failure monitor. Only `is_primary` ever changes, and only
/// the monitor writes it; everything else is fixed for the process lifetime.
#[derive(Debug)]
pub struct NodeRuntimeState {
    pub node_id: String,
    pub address: String,
    /// Other nodes' addresses.
    pub peers: Vec<String>,
    /// Address of the configured primary. Not updated on promotion.
    pub primary_address: String,
    is_primary: AtomicBool,
}

impl NodeRuntimeState {
    pub fn new(
        node_id: impl Into<String>,
        address: impl Into<String>,
        is_primary: bool,
        peers: Vec<String>,
        primary_address: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            address: address.into(),
            peers,
            primary_address: primary_address.into(),
            is_primary: AtomicBool::new(is_primary),
        }
    }

    pub fn from_config(cluster: &ClusterConfig, local: &NodeConfig) -> Self {
        let primary_address = cluster
            .master()
            .map(|m| m.address.clone())
            .unwrap_or_else(|| local.address.clone());

        Self::new(
            local.id.clone(),
            local.address.clone(),
            local.is_master,
            cluster.peers_of(&local.address),
            primary_address,
        )
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary.load(Ordering::SeqCst)
    }

    pub fn role(&self) -> Role {
        if self.is_primary() {
            Role::Primary
        } else {
            Role::Replica
        }
    }

    /// Flips the node to primary. Returns `true` only for the call that
    /// actually changed the role. There is no way back.
    pub fn promote(&self) -> bool {
        !self.is_primary.swap(true, Ordering::SeqCst)
    }
}
