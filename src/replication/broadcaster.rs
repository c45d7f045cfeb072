use crate::command::protocol::{ENDPOINT_NOTIFY, ENDPOINT_REPLICATE, Notification};
use crate::command::types::Command;
use crate::error::{Result, StoreError};

use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Fans primary writes out to peers.
///
/// Every send runs in its own task. Callers get the handles back but the
/// coordinator drops them, so the request path never waits on a peer. Sends
/// are not retried and carry no idempotency key.
#[derive(Debug, Clone)]
pub struct ReplicationBroadcaster {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl ReplicationBroadcaster {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Sends `command` to the replica endpoint of every peer.
    pub fn broadcast(&self, command: &Command, peers: &[String]) -> Vec<JoinHandle<()>> {
        // Correlates the per-peer log lines of one broadcast.
        let batch_id = Uuid::new_v4();
        tracing::debug!(
            "Replicating {} to {} peer(s) [{}]",
            command.action(),
            peers.len(),
            batch_id
        );

        peers
            .iter()
            .map(|peer| {
                let client = self.http_client.clone();
                let timeout = self.timeout;
                let url = peer_url(peer, ENDPOINT_REPLICATE);
                let peer = peer.clone();
                let command = command.clone();

                tokio::spawn(async move {
                    match post_json(&client, &url, &command, timeout).await {
                        Ok(()) => tracing::debug!(
                            "Replicated {} to {} [{}]",
                            command.action(),
                            peer,
                            batch_id
                        ),
                        Err(e) => tracing::warn!(
                            "Failed to replicate {} to {} [{}]: {}",
                            command.action(),
                            peer,
                            batch_id,
                            e
                        ),
                    }
                })
            })
            .collect()
    }

    /// Sends an informational message to every peer's notify endpoint.
    pub fn notify(&self, message: &str, peers: &[String]) -> Vec<JoinHandle<()>> {
        let notification = Notification {
            message: message.to_string(),
        };

        peers
            .iter()
            .map(|peer| {
                let client = self.http_client.clone();
                let timeout = self.timeout;
                let url = peer_url(peer, ENDPOINT_NOTIFY);
                let peer = peer.clone();
                let notification = notification.clone();

                tokio::spawn(async move {
                    if let Err(e) = post_json(&client, &url, &notification, timeout).await {
                        tracing::debug!("Failed to notify {}: {}", peer, e);
                    }
                })
            })
            .collect()
    }
}

/// Builds the URL of `endpoint` on `peer`. Bare `host:port` addresses get an
/// `http://` scheme.
pub fn peer_url(peer: &str, endpoint: &str) -> String {
    let base = peer.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}{}", base, endpoint)
    } else {
        format!("http://{}{}", base, endpoint)
    }
}

async fn post_json<T: Serialize>(
    client: &reqwest::Client,
    url: &str,
    payload: &T,
    timeout: Duration,
) -> Result<()> {
    let response = client
        .post(url)
        .json(payload)
        .timeout(timeout)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(StoreError::TransportFailure(format!(
            "{} answered {}",
            url,
            response.status()
        )));
    }

    Ok(())
}
