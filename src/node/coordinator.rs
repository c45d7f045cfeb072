use crate::command::types::{Command, CommandOutput};
use crate::error::{Result, StoreError};
use crate::membership::types::NodeRuntimeState;
use crate::replication::broadcaster::ReplicationBroadcaster;
use crate::storage::memory::TableStore;

use std::sync::Arc;
use tokio::sync::Mutex;

/// Where a command entered this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Sent by a client; may be permission-checked and replicated.
    ClientRequest,
    /// Forwarded by a primary; applied locally and never re-broadcast.
    ReplicationInbound,
}

/// Which roles may accept client writes on tables and rows.
///
/// Database create/drop always requires the primary role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Replicas accept table and row writes from clients.
    #[default]
    Permissive,
    /// Replicas reject every client write.
    PrimaryOnly,
}

/// Owns a node's `TableStore` and routes commands into it.
///
/// All access to the store goes through one exclusive lock, so operations on
/// this node are totally ordered. Nothing orders them against other nodes.
pub struct NodeCoordinator {
    store: Mutex<TableStore>,
    state: Arc<NodeRuntimeState>,
    broadcaster: ReplicationBroadcaster,
    policy: WritePolicy,
}

impl NodeCoordinator {
    pub fn new(
        state: Arc<NodeRuntimeState>,
        broadcaster: ReplicationBroadcaster,
        policy: WritePolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            store: Mutex::new(TableStore::new()),
            state,
            broadcaster,
            policy,
        })
    }

    pub fn state(&self) -> &Arc<NodeRuntimeState> {
        &self.state
    }

    /// Applies `command` to the local store.
    ///
    /// A client write accepted by a primary is then handed to the broadcaster;
    /// the result is returned without waiting for any peer.
    pub async fn apply(&self, command: Command, origin: Origin) -> Result<CommandOutput> {
        command.validate()?;

        if origin == Origin::ClientRequest {
            self.check_permission(&command)?;
        }

        let output = {
            let mut store = self.store.lock().await;
            execute(&mut store, &command)?
        };

        tracing::debug!(
            "Applied {} ({:?}) on {}",
            command.action(),
            origin,
            self.state.node_id
        );

        if origin == Origin::ClientRequest && command.is_write() {
            if self.state.is_primary() {
                // Detached: the handles are dropped, the sends keep running.
                self.broadcaster.broadcast(&command, &self.state.peers);
            }
            self.broadcaster.notify(
                &format!("{} on {}", command.acknowledgment(), self.state.node_id),
                &self.state.peers,
            );
        }

        Ok(output)
    }

    fn check_permission(&self, command: &Command) -> Result<()> {
        if self.state.is_primary() {
            return Ok(());
        }

        if command.requires_primary() {
            return Err(StoreError::PermissionDenied(format!(
                "only the primary can {}",
                command.action()
            )));
        }

        if self.policy == WritePolicy::PrimaryOnly && command.is_write() {
            return Err(StoreError::PermissionDenied(format!(
                "replica {} does not accept client writes",
                self.state.node_id
            )));
        }

        Ok(())
    }

    pub async fn table_names(&self) -> Vec<String> {
        self.store.lock().await.table_names()
    }

    pub async fn database_names(&self) -> Vec<String> {
        self.store.lock().await.database_names()
    }
}

fn execute(store: &mut TableStore, command: &Command) -> Result<CommandOutput> {
    match command {
        Command::CreateDatabase { db_name } => {
            store.create_database(db_name)?;
        }
        Command::DropDatabase { db_name } => {
            let dropped = store.drop_database(db_name)?;
            tracing::info!("Dropped database {} ({} tables)", db_name, dropped);
        }
        Command::CreateTable {
            table_name,
            columns,
        } => {
            store.create_table(table_name, columns.clone())?;
        }
        Command::DropTable { table_name } => {
            store.delete_table(table_name)?;
        }
        Command::Insert {
            table_name,
            row_id,
            data,
        } => {
            store
                .table_mut(table_name)?
                .insert(row_id.clone(), data.clone())?;
        }
        Command::Update {
            table_name,
            row_id,
            new_data,
        } => {
            store
                .table_mut(table_name)?
                .update(row_id, new_data.clone())?;
        }
        Command::Delete { table_name, row_id } => {
            store.table_mut(table_name)?.delete_row(row_id)?;
        }
        Command::Select { table_name, filter } => {
            let table = store.table(table_name)?;
            let rows = match filter {
                Some(filter) => table.search_by_column(&filter.column, &filter.value),
                None => table.get_all(),
            };
            return Ok(CommandOutput::Rows(rows));
        }
    }

    Ok(CommandOutput::Ack(command.acknowledgment()))
}
