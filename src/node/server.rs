use super::coordinator::NodeCoordinator;
use super::handlers::*;
use crate::command::protocol::*;
use crate::config::{ClusterConfig, NodeSettings};
use crate::membership::monitor::FailureMonitor;
use crate::membership::types::NodeRuntimeState;
use crate::replication::broadcaster::ReplicationBroadcaster;

use anyhow::Result;
use axum::{
    Extension, Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Every client, cluster and probe route of a node.
pub fn router(coordinator: Arc<NodeCoordinator>) -> Router {
    Router::new()
        .route(ENDPOINT_CREATE_DATABASE, post(handle_create_database))
        .route(ENDPOINT_DROP_DATABASE, post(handle_drop_database))
        .route(ENDPOINT_CREATE_TABLE, post(handle_create_table))
        .route(ENDPOINT_INSERT, post(handle_insert))
        .route(ENDPOINT_UPDATE, post(handle_update))
        .route(ENDPOINT_DELETE_RECORD, post(handle_delete_record))
        .route(ENDPOINT_DELETE_TABLE, post(handle_delete_table))
        .route(ENDPOINT_SELECT, get(handle_select))
        .route(ENDPOINT_SEARCH, get(handle_search))
        .route(ENDPOINT_EXECUTE, post(handle_execute))
        .route(ENDPOINT_REPLICATE, post(handle_replicate))
        .route(ENDPOINT_PING, get(handle_ping))
        .route(ENDPOINT_STATUS, get(handle_status))
        .route(ENDPOINT_NOTIFY, post(handle_notify))
        .layer(Extension(coordinator))
}

/// A node serving on its listener, plus its background tasks.
pub struct RunningNode {
    pub coordinator: Arc<NodeCoordinator>,
    pub local_addr: SocketAddr,
    server: JoinHandle<()>,
    monitor: Option<JoinHandle<()>>,
    stop: oneshot::Sender<()>,
}

impl RunningNode {
    pub fn state(&self) -> &Arc<NodeRuntimeState> {
        self.coordinator.state()
    }

    /// Waits for the HTTP server to exit.
    pub async fn wait(self) -> Result<()> {
        self.server.await?;
        Ok(())
    }

    /// Stops the monitor and the HTTP server, closing idle keep-alive
    /// connections. Afterwards the node no longer answers probes.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(monitor) = self.monitor {
            monitor.abort();
        }
        // The receiver is gone only if the server already exited.
        let _ = self.stop.send(());
        self.server.await?;
        Ok(())
    }
}

/// Wires a node together and starts serving on `listener`.
///
/// The node finds itself in `cluster` by the address `listener` is bound to;
/// startup fails if no entry matches.
pub async fn start(
    listener: TcpListener,
    cluster: &ClusterConfig,
    settings: NodeSettings,
) -> Result<RunningNode> {
    let local_addr = listener.local_addr()?;
    let local = cluster.locate(&local_addr.to_string())?;
    let state = Arc::new(NodeRuntimeState::from_config(cluster, local));

    tracing::info!(
        "Node {} starting on {} as {} (peers: {:?})",
        state.node_id,
        local_addr,
        state.role(),
        state.peers
    );

    let broadcaster = ReplicationBroadcaster::new(settings.replication_timeout);
    let coordinator = NodeCoordinator::new(state.clone(), broadcaster, settings.write_policy);

    let monitor = FailureMonitor::new(state.clone(), settings.monitor).spawn();

    let app = router(coordinator.clone());
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let shutdown = async move {
            let _ = stopped.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!("HTTP server stopped: {}", e);
        }
    });

    Ok(RunningNode {
        coordinator,
        local_addr,
        server,
        monitor,
        stop,
    })
}
