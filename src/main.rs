use clap::Parser;
use replicated_tables::config::{ClusterConfig, MonitorConfig, NodeSettings};
use replicated_tables::node::coordinator::WritePolicy;
use replicated_tables::node::server;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replicated in-memory table store node", long_about = None)]
struct Cli {
    /// Cluster file listing every node (id, address, isMaster).
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Address to listen on. Must match one `address` in the cluster file.
    #[arg(long)]
    bind: SocketAddr,

    /// Milliseconds between liveness probes of the primary.
    #[arg(long, default_value_t = 5000)]
    monitor_interval_ms: u64,

    /// Timeout for a single liveness probe.
    #[arg(long, default_value_t = 2000)]
    probe_timeout_ms: u64,

    /// Consecutive failed probes before this replica promotes itself.
    #[arg(long, default_value_t = 1)]
    failure_threshold: u32,

    /// Timeout for each replication send.
    #[arg(long, default_value_t = 2000)]
    replication_timeout_ms: u64,

    /// Reject client writes while this node is a replica.
    #[arg(long)]
    strict_writes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cluster = ClusterConfig::load(&cli.config)?;
    tracing::info!(
        "Loaded cluster config {} ({} nodes)",
        cli.config.display(),
        cluster.nodes.len()
    );
    // Fail before binding if this address is not part of the cluster.
    cluster.locate(&cli.bind.to_string())?;

    let settings = NodeSettings {
        monitor: MonitorConfig {
            interval: Duration::from_millis(cli.monitor_interval_ms),
            probe_timeout: Duration::from_millis(cli.probe_timeout_ms),
            failure_threshold: cli.failure_threshold,
        },
        replication_timeout: Duration::from_millis(cli.replication_timeout_ms),
        write_policy: if cli.strict_writes {
            WritePolicy::PrimaryOnly
        } else {
            WritePolicy::Permissive
        },
    };

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    let node = server::start(listener, &cluster, settings).await?;

    // Stats reporter:
    let state = node.state().clone();
    let coordinator = node.coordinator.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));

        loop {
            interval.tick().await;
            let tables = coordinator.table_names().await;
            tracing::info!(
                "Node {} role={} tables={}",
                state.node_id,
                state.role(),
                tables.len()
            );
        }
    });

    tracing::info!("HTTP server listening on {}", node.local_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    node.wait().await
}
