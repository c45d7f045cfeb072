//! Node Network Protocol
//!
//! Defines the HTTP endpoints and the Data Transfer Objects (DTOs) used by
//! clients and by peers.
//!
//! Each client-facing request shape converts into exactly one [`Command`], so
//! the coordinator only ever sees commands. Peers exchange the tagged
//! `Command` JSON directly.

use super::types::{ColumnFilter, Command};
use crate::error::StoreError;
use crate::storage::table::Row;

use serde::{Deserialize, Serialize};

// --- Client Endpoints ---

pub const ENDPOINT_CREATE_DATABASE: &str = "/create_database";
pub const ENDPOINT_DROP_DATABASE: &str = "/drop_database";
pub const ENDPOINT_CREATE_TABLE: &str = "/create_table";
pub const ENDPOINT_INSERT: &str = "/insert";
pub const ENDPOINT_UPDATE: &str = "/update";
pub const ENDPOINT_DELETE_RECORD: &str = "/delete_record";
pub const ENDPOINT_DELETE_TABLE: &str = "/delete_table";
pub const ENDPOINT_SELECT: &str = "/select";
pub const ENDPOINT_SEARCH: &str = "/search";
/// Accepts any tagged `Command` from a client.
pub const ENDPOINT_EXECUTE: &str = "/execute";

// --- Cluster Endpoints ---

/// Replica-facing endpoint: applies a command locally, never re-broadcasts.
pub const ENDPOINT_REPLICATE: &str = "/replicate";
/// Liveness probe. Any 200 means alive.
pub const ENDPOINT_PING: &str = "/ping";
pub const ENDPOINT_STATUS: &str = "/status";
pub const ENDPOINT_NOTIFY: &str = "/notify";

// --- Data Transfer Objects ---

/// Body of `POST /create_database` and `POST /drop_database`.
///
/// Both are accepted only by the primary.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseRequest {
    /// The database name to register or drop.
    pub db_name: String,
}

/// Body of `POST /create_table`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTableRequest {
    /// Name of the new table. Must not already exist on the node.
    pub table_name: String,
    /// Columns every inserted row must carry. Non-empty, no duplicates.
    pub columns: Vec<String>,
}

/// Body of `POST /insert`.
///
/// An existing row under the same id is replaced.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertRequest {
    /// The target table.
    pub table_name: String,
    /// Caller-chosen row key.
    pub row_id: String,
    /// Full row; must contain every declared column.
    pub data: Row,
}

/// Body of `POST /update`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// The target table.
    pub table_name: String,
    /// Key of a row that must already exist.
    pub row_id: String,
    /// Keys merged into the row; unmentioned keys are kept.
    pub new_data: Row,
}

/// Body of `POST /delete_record`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteRecordRequest {
    /// The target table.
    pub table_name: String,
    /// Key of the row to remove.
    pub row_id: String,
}

/// Body of `POST /delete_table`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTableRequest {
    /// The table to drop along with its rows.
    pub table_name: String,
}

/// Query parameters of `GET /select`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SelectParams {
    /// The table to read. Required.
    pub table: Option<String>,
}

/// Query parameters of `GET /search`. All three are required.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// The table to read.
    pub table: Option<String>,
    /// Column to match on.
    pub column: Option<String>,
    /// Exact value the column must hold.
    pub value: Option<String>,
}

/// Informational message fanned out to peers after client writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Free text, logged by the receiver. Must not be empty.
    pub message: String,
}

/// Snapshot of a node's view of itself, served by `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    /// Id from the cluster file.
    pub node_id: String,
    /// Address the node was located by.
    pub address: String,
    /// Current role, `primary` or `replica`.
    pub role: String,
    /// Primary from the cluster file. Not updated on promotion.
    pub primary_address: String,
    /// Every other node's address.
    pub peers: Vec<String>,
    /// Table names, sorted.
    pub tables: Vec<String>,
    /// Registered database names, sorted.
    pub databases: Vec<String>,
}

impl From<CreateTableRequest> for Command {
    fn from(req: CreateTableRequest) -> Self {
        Command::CreateTable {
            table_name: req.table_name,
            columns: req.columns,
        }
    }
}

impl From<InsertRequest> for Command {
    fn from(req: InsertRequest) -> Self {
        Command::Insert {
            table_name: req.table_name,
            row_id: req.row_id,
            data: req.data,
        }
    }
}

impl From<UpdateRequest> for Command {
    fn from(req: UpdateRequest) -> Self {
        Command::Update {
            table_name: req.table_name,
            row_id: req.row_id,
            new_data: req.new_data,
        }
    }
}

impl From<DeleteRecordRequest> for Command {
    fn from(req: DeleteRecordRequest) -> Self {
        Command::Delete {
            table_name: req.table_name,
            row_id: req.row_id,
        }
    }
}

impl From<DeleteTableRequest> for Command {
    fn from(req: DeleteTableRequest) -> Self {
        Command::DropTable {
            table_name: req.table_name,
        }
    }
}

impl TryFrom<SelectParams> for Command {
    type Error = StoreError;

    fn try_from(params: SelectParams) -> Result<Self, Self::Error> {
        let table_name = params
            .table
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StoreError::InvalidCommand("missing table name".to_string()))?;

        Ok(Command::Select {
            table_name,
            filter: None,
        })
    }
}

impl TryFrom<SearchParams> for Command {
    type Error = StoreError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        match (params.table, params.column, params.value) {
            (Some(table_name), Some(column), Some(value))
                if !table_name.is_empty() && !column.is_empty() && !value.is_empty() =>
            {
                Ok(Command::Select {
                    table_name,
                    filter: Some(ColumnFilter { column, value }),
                })
            }
            _ => Err(StoreError::InvalidCommand("missing parameters".to_string())),
        }
    }
}
