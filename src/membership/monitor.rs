use super::types::NodeRuntimeState;
use crate::command::protocol::ENDPOINT_PING;
use crate::config::MonitorConfig;
use crate::error::{Result, StoreError};
use crate::replication::broadcaster::peer_url;

use std::sync::Arc;
use tokio::task::JoinHandle;

/// Background liveness monitor run by replicas.
///
/// Probes the configured primary on a fixed interval. Once the probe has
/// failed `failure_threshold` times in a row, the node promotes itself and
/// the loop ends. The decision is local: nothing tells the other replicas,
/// and several of them may promote for the same outage.
pub struct FailureMonitor {
    state: Arc<NodeRuntimeState>,
    config: MonitorConfig,
    http_client: reqwest::Client,
}

impl FailureMonitor {
    pub fn new(state: Arc<NodeRuntimeState>, config: MonitorConfig) -> Arc<Self> {
        Arc::new(Self {
            state,
            config,
            http_client: reqwest::Client::new(),
        })
    }

    /// Starts the loop on a replica. A primary has nothing to watch, so no
    /// task is spawned.
    pub fn spawn(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.state.is_primary() {
            tracing::debug!("Node is primary, failure monitor not started");
            return None;
        }

        Some(tokio::spawn(async move {
            self.run().await;
        }))
    }

    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            "Monitoring primary {} every {:?}",
            self.state.primary_address,
            self.config.interval
        );

        let threshold = self.config.failure_threshold.max(1);
        let mut failures = 0u32;
        let mut interval = tokio::time::interval(self.config.interval);
        // The first tick completes immediately; probe one full interval after start.
        interval.tick().await;

        loop {
            interval.tick().await;

            if self.state.is_primary() {
                tracing::info!("Node is primary, stopping failure monitor");
                break;
            }

            match self.probe().await {
                Ok(()) => {
                    if failures > 0 {
                        tracing::info!("Primary {} is reachable again", self.state.primary_address);
                    }
                    failures = 0;
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        "Primary probe failed ({}/{}): {}",
                        failures,
                        threshold,
                        e
                    );

                    if failures >= threshold {
                        if self.state.promote() {
                            tracing::warn!(
                                "Primary {} is down, node {} promoted itself to primary",
                                self.state.primary_address,
                                self.state.node_id
                            );
                        }
                        break;
                    }
                }
            }
        }
    }

    /// One liveness check. Only a 200 within the timeout counts as alive.
    pub async fn probe(&self) -> Result<()> {
        let url = peer_url(&self.state.primary_address, ENDPOINT_PING);

        let response = self
            .http_client
            .get(url)
            .timeout(self.config.probe_timeout)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(StoreError::TransportFailure(format!(
                "primary answered {}",
                response.status()
            )));
        }

        Ok(())
    }
}
